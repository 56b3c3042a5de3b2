use super::types::{Series, SeriesEnvelope, SeriesPage};
use crate::gateway::{ApiClient, ApiError, ApiRequest};

/// Published series, newest first
pub async fn list(
    api: &ApiClient,
    genre: Option<&str>,
    page: Option<u32>,
    per_page: Option<u32>,
) -> Result<SeriesPage, ApiError> {
    let request = ApiRequest::get("/series/")
        .query_opt("genre", genre)
        .query_opt("page", page)
        .query_opt("per_page", per_page);
    api.json(&request).await
}

/// A series with its episodes
pub async fn get(api: &ApiClient, series_id: i64) -> Result<Series, ApiError> {
    let envelope: SeriesEnvelope = api
        .json(&ApiRequest::get(format!("/series/{series_id}")))
        .await?;
    Ok(envelope.series)
}
