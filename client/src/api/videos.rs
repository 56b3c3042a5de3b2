use serde::Deserialize;
use serde_json::json;

use super::types::{
    Progress, Reaction, ReactionSummary, SavedFlag, Video, VideoEnvelope, VideoList,
    WatchLaterItem,
};
use crate::gateway::{ApiClient, ApiError, ApiRequest};

pub async fn get(api: &ApiClient, video_id: i64) -> Result<Video, ApiError> {
    let envelope: VideoEnvelope = api.json(&ApiRequest::get(format!("/videos/{video_id}"))).await?;
    Ok(envelope.video)
}

#[derive(Deserialize)]
struct WatchLaterList {
    #[serde(default)]
    watch_later: Vec<WatchLaterItem>,
}

pub async fn watch_later(api: &ApiClient) -> Result<Vec<WatchLaterItem>, ApiError> {
    let list: WatchLaterList = api.json(&ApiRequest::get("/videos/watch-later")).await?;
    Ok(list.watch_later)
}

/// Save a video for later. Saving an already saved video succeeds.
pub async fn add_watch_later(api: &ApiClient, video_id: i64) -> Result<(), ApiError> {
    api.execute(&ApiRequest::post(format!("/videos/{video_id}/watch-later")))
        .await?;
    Ok(())
}

pub async fn remove_watch_later(api: &ApiClient, video_id: i64) -> Result<(), ApiError> {
    api.execute(&ApiRequest::delete(format!("/videos/{video_id}/watch-later")))
        .await?;
    Ok(())
}

pub async fn watch_later_status(api: &ApiClient, video_id: i64) -> Result<bool, ApiError> {
    let flag: SavedFlag = api
        .json(&ApiRequest::get(format!("/videos/{video_id}/watch-later/status")))
        .await?;
    Ok(flag.saved)
}

/// Resume position for a video; zero when never watched
pub async fn progress(api: &ApiClient, video_id: i64) -> Result<Progress, ApiError> {
    api.json(&ApiRequest::get(format!("/videos/{video_id}/progress")))
        .await
}

pub async fn save_progress(
    api: &ApiClient,
    video_id: i64,
    progress_seconds: u64,
) -> Result<(), ApiError> {
    let request = ApiRequest::post(format!("/videos/{video_id}/progress"))
        .json(&Progress { progress_seconds })?;
    api.execute(&request).await?;
    Ok(())
}

/// Like or dislike a video. Sending the current reaction again removes it.
pub async fn react(
    api: &ApiClient,
    video_id: i64,
    reaction: Reaction,
) -> Result<ReactionSummary, ApiError> {
    let request = ApiRequest::post(format!("/videos/{video_id}/react"))
        .json(&json!({ "reaction": reaction }))?;
    api.json(&request).await
}

pub async fn related(api: &ApiClient, video_id: i64) -> Result<Vec<Video>, ApiError> {
    let list: VideoList = api
        .json(&ApiRequest::get(format!("/videos/{video_id}/related")))
        .await?;
    Ok(list.videos)
}

/// Flag a video for moderator review
pub async fn report(
    api: &ApiClient,
    video_id: i64,
    reason: &str,
    details: Option<&str>,
) -> Result<(), ApiError> {
    let request = ApiRequest::post(format!("/videos/{video_id}/report"))
        .json(&json!({ "reason": reason, "details": details }))?;
    api.execute(&request).await?;
    Ok(())
}
