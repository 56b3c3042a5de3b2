//! Creator dashboard endpoints. All of them answer 403 for non-creator accounts.

use serde::Deserialize;
use tracing::info;

use super::Confirmation;
use super::media::MediaFile;
use super::types::{
    CreatorStats, Series, SeriesDraft, SeriesEnvelope, SeriesList, Video, VideoEnvelope,
    VideoPage, VideoUpdate,
};
use crate::gateway::{ApiClient, ApiError, ApiRequest, FormPart};

/// A new video together with its metadata
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub video: MediaFile,
    pub thumbnail: Option<MediaFile>,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub language: String,
    pub series_id: Option<i64>,
    pub episode_number: Option<u32>,
    pub season_number: Option<u32>,
}

impl VideoUpload {
    fn into_parts(self) -> Vec<FormPart> {
        let mut parts = vec![self.video.to_part("video")];
        if let Some(thumbnail) = &self.thumbnail {
            parts.push(thumbnail.to_part("thumbnail"));
        }

        let text = [
            ("title", Some(self.title)),
            ("description", Some(self.description)),
            ("genre", Some(self.genre)),
            ("language", Some(self.language)),
            ("series_id", self.series_id.map(|v| v.to_string())),
            ("episode_number", self.episode_number.map(|v| v.to_string())),
            ("season_number", self.season_number.map(|v| v.to_string())),
        ];
        parts.extend(text.into_iter().filter_map(|(name, value)| {
            value.map(|value| FormPart::Text {
                name: name.to_string(),
                value,
            })
        }));
        parts
    }
}

/// Image URLs set by a banner upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SeriesArtwork {
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

pub async fn stats(api: &ApiClient) -> Result<CreatorStats, ApiError> {
    api.json(&ApiRequest::get("/creator/stats")).await
}

pub async fn upload_video(api: &ApiClient, upload: VideoUpload) -> Result<Video, ApiError> {
    let title = upload.title.clone();
    let request = ApiRequest::post("/creator/upload").multipart(upload.into_parts());
    let envelope: VideoEnvelope = api.json(&request).await?;
    info!("Uploaded video {} ({})", envelope.video.id, title);
    Ok(envelope.video)
}

pub async fn create_series(api: &ApiClient, draft: &SeriesDraft) -> Result<Series, ApiError> {
    let request = ApiRequest::post("/creator/series").json(draft)?;
    let envelope: SeriesEnvelope = api.json(&request).await?;
    Ok(envelope.series)
}

pub async fn update_series(
    api: &ApiClient,
    series_id: i64,
    changes: &SeriesDraft,
) -> Result<Series, ApiError> {
    let request = ApiRequest::put(format!("/creator/series/{series_id}")).json(changes)?;
    let envelope: SeriesEnvelope = api.json(&request).await?;
    Ok(envelope.series)
}

/// Upload a banner and/or thumbnail image for a series
pub async fn upload_series_banner(
    api: &ApiClient,
    series_id: i64,
    banner: Option<&MediaFile>,
    thumbnail: Option<&MediaFile>,
) -> Result<SeriesArtwork, ApiError> {
    let parts: Vec<FormPart> = [("banner", banner), ("thumbnail", thumbnail)]
        .into_iter()
        .filter_map(|(field, file)| file.map(|f| f.to_part(field)))
        .collect();
    if parts.is_empty() {
        return Err(ApiError::InvalidRequest("no image file provided".to_string()));
    }

    let request = ApiRequest::post(format!("/creator/series/{series_id}/banner")).multipart(parts);
    api.json(&request).await
}

pub async fn my_videos(api: &ApiClient, page: Option<u32>) -> Result<VideoPage, ApiError> {
    api.json(&ApiRequest::get("/creator/videos").query_opt("page", page))
        .await
}

pub async fn my_series(api: &ApiClient) -> Result<Vec<Series>, ApiError> {
    let list: SeriesList = api.json(&ApiRequest::get("/creator/series-list")).await?;
    Ok(list.series)
}

pub async fn update_video(
    api: &ApiClient,
    video_id: i64,
    changes: &VideoUpdate,
) -> Result<Video, ApiError> {
    let request = ApiRequest::put(format!("/creator/videos/{video_id}")).json(changes)?;
    let envelope: VideoEnvelope = api.json(&request).await?;
    Ok(envelope.video)
}

pub async fn delete_video(
    api: &ApiClient,
    video_id: i64,
    _confirmed: Confirmation,
) -> Result<(), ApiError> {
    api.execute(&ApiRequest::delete(format!("/creator/videos/{video_id}")))
        .await?;
    info!("Deleted video {}", video_id);
    Ok(())
}
