//! Server-side merge and publish of the clip timeline

use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::timeline::ClipTimeline;
use crate::api::Video;
use crate::api::types::VideoEnvelope;
use crate::gateway::{ApiClient, ApiError, ApiRequest, FormPart};

/// Fewest clips a merge accepts
pub const MIN_CLIPS: usize = 2;

pub const MERGE_PATH: &str = "/studio/merge";
pub const PUBLISH_PATH: &str = "/studio/publish";

/// Multipart field carrying each clip, repeated in timeline order
const CLIP_FIELD: &str = "clips";

/// Shown when the server gives no reason for a failed merge
const MERGE_FALLBACK_DETAIL: &str = "Merge failed. Make sure all clips are valid video files.";

/// Studio errors
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Add at least {MIN_CLIPS} clips to merge (have {0})")]
    InsufficientClips(usize),

    #[error("At most {max} clips can be merged at once (have {count})")]
    TooManyClips { count: usize, max: usize },

    #[error("Merge failed: {detail}")]
    MergeFailed { detail: String },

    #[error("Nothing to publish yet; merge the clips first")]
    NotMerged,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to read clip: {0}")]
    Io(#[from] std::io::Error),
}

/// The single asset produced by a merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    pub video_url: String,
    /// Seconds
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub clip_count: usize,
}

/// Metadata for publishing a merged video
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishMetadata {
    pub title: String,
    pub description: String,
    pub genre: String,
    pub language: String,
    /// "Standalone" or "Episode"; the server defaults to standalone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
}

impl PublishMetadata {
    /// First required field left blank
    fn missing_field(&self) -> Option<&'static str> {
        [
            ("title", &self.title),
            ("description", &self.description),
            ("genre", &self.genre),
            ("language", &self.language),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

#[derive(Serialize)]
struct PublishBody<'a> {
    #[serde(flatten)]
    metadata: &'a PublishMetadata,
    video_url: &'a str,
    duration: u64,
}

/// Associate `metadata` with an already merged asset and publish it
pub async fn publish_merged(
    api: &ApiClient,
    metadata: &PublishMetadata,
    merged: &MergeResult,
) -> Result<Video, StudioError> {
    if let Some(field) = metadata.missing_field() {
        return Err(StudioError::MissingField(field));
    }

    let request = ApiRequest::post(PUBLISH_PATH).json(&PublishBody {
        metadata,
        video_url: &merged.video_url,
        duration: merged.duration,
    })?;
    let envelope: VideoEnvelope = api.json(&request).await?;
    info!("Published merged video {} ({})", envelope.video.id, envelope.video.title);
    Ok(envelope.video)
}

impl ClipTimeline {
    /// Upload every clip, in order, for the server to concatenate.
    ///
    /// Fewer than two clips, or more than the configured maximum, fail before
    /// any request is made. Taking `&mut self` keeps a second merge from
    /// starting while one is in flight.
    pub async fn merge(&mut self, api: &ApiClient) -> Result<MergeResult, StudioError> {
        let count = self.clips.len();
        if count < MIN_CLIPS {
            return Err(StudioError::InsufficientClips(count));
        }
        if count > self.max_clips {
            return Err(StudioError::TooManyClips {
                count,
                max: self.max_clips,
            });
        }

        let parts: Vec<FormPart> = self
            .clips
            .iter()
            .map(|clip| clip.source().to_part(CLIP_FIELD))
            .collect();
        let total_bytes: usize = self.clips.iter().map(|c| c.source().len()).sum();
        info!("Merging {} clips ({} bytes)", count, total_bytes);

        let request = ApiRequest::post(MERGE_PATH).multipart(parts);
        match api.json::<MergeResult>(&request).await {
            Ok(result) => {
                counter!("ministream_studio_merges_total", "outcome" => "success").increment(1);
                info!(
                    "Merged {} clips into {} ({}s)",
                    result.clip_count, result.video_url, result.duration
                );
                self.merge_result = Some(result.clone());
                Ok(result)
            }
            Err(e) if e.is_auth() => {
                counter!("ministream_studio_merges_total", "outcome" => "unauthorized")
                    .increment(1);
                Err(StudioError::Api(e))
            }
            Err(e) => {
                counter!("ministream_studio_merges_total", "outcome" => "failure").increment(1);
                warn!("Merge failed: {}", e);
                let detail = e
                    .server_message()
                    .unwrap_or(MERGE_FALLBACK_DETAIL)
                    .to_string();
                Err(StudioError::MergeFailed { detail })
            }
        }
    }

    /// Drop the merge result so the clips can be merged again
    pub fn discard_merge(&mut self) -> Option<MergeResult> {
        self.merge_result.take()
    }

    /// Publish the merged video. On success the studio is reset.
    pub async fn publish(
        &mut self,
        api: &ApiClient,
        metadata: &PublishMetadata,
    ) -> Result<Video, StudioError> {
        let merged = self.merge_result.as_ref().ok_or(StudioError::NotMerged)?;
        let video = publish_merged(api, metadata, merged).await?;
        self.reset();
        Ok(video)
    }
}
