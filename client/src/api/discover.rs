use serde::Deserialize;

use super::Confirmation;
use super::types::{
    BrowseFilters, BrowsePage, HomeFeed, SearchQuery, SearchResults, WatchedList, WatchedVideo,
};
use crate::gateway::{ApiClient, ApiError, ApiRequest};

pub async fn home(api: &ApiClient) -> Result<HomeFeed, ApiError> {
    api.json(&ApiRequest::get("/discover/home")).await
}

/// Search videos and series. The server rejects a query with no terms, so an
/// empty query is refused before any request is made.
pub async fn search(api: &ApiClient, query: &SearchQuery) -> Result<SearchResults, ApiError> {
    if query.is_empty() {
        return Err(ApiError::InvalidRequest(
            "provide a search term, genre or language".to_string(),
        ));
    }
    let request = ApiRequest::get("/discover/search")
        .query_opt("q", query.q.as_deref().map(str::trim))
        .query_opt("genre", query.genre.as_deref())
        .query_opt("language", query.language.as_deref());
    api.json(&request).await
}

pub async fn browse(api: &ApiClient, filters: &BrowseFilters) -> Result<BrowsePage, ApiError> {
    let request = ApiRequest::get("/discover/browse")
        .query_opt("genre", filters.genre.as_deref())
        .query_opt("language", filters.language.as_deref())
        .query_opt("rating", filters.rating.as_deref())
        .query_opt("type", filters.video_type.as_deref())
        .query_opt("duration", filters.duration.as_deref())
        .query_opt("q", filters.q.as_deref())
        .query_opt("page", filters.page);
    api.json(&request).await
}

#[derive(Deserialize)]
struct Genres {
    genres: Vec<String>,
}

#[derive(Deserialize)]
struct Languages {
    languages: Vec<String>,
}

#[derive(Deserialize)]
struct Ratings {
    ratings: Vec<String>,
}

pub async fn genres(api: &ApiClient) -> Result<Vec<String>, ApiError> {
    let list: Genres = api.json(&ApiRequest::get("/discover/genres")).await?;
    Ok(list.genres)
}

pub async fn languages(api: &ApiClient) -> Result<Vec<String>, ApiError> {
    let list: Languages = api.json(&ApiRequest::get("/discover/languages")).await?;
    Ok(list.languages)
}

/// Content ratings accepted by uploads and browse filters
pub async fn ratings(api: &ApiClient) -> Result<Vec<String>, ApiError> {
    let list: Ratings = api.json(&ApiRequest::get("/discover/ratings")).await?;
    Ok(list.ratings)
}

/// Partially watched videos, most recent first
pub async fn continue_watching(api: &ApiClient) -> Result<Vec<WatchedVideo>, ApiError> {
    let list: WatchedList = api
        .json(&ApiRequest::get("/discover/continue-watching"))
        .await?;
    Ok(list.videos)
}

pub async fn history(api: &ApiClient) -> Result<Vec<WatchedVideo>, ApiError> {
    let list: WatchedList = api.json(&ApiRequest::get("/discover/history")).await?;
    Ok(list.videos)
}

/// Forget every watched video and resume position
pub async fn clear_history(api: &ApiClient, _confirmed: Confirmation) -> Result<(), ApiError> {
    api.execute(&ApiRequest::delete("/discover/history")).await?;
    Ok(())
}
