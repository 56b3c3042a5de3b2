//! Response and request shapes of the MiniStream REST API

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A published (or, for its creator, draft) video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: i64,
    pub creator_id: i64,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub series_id: Option<i64>,
    #[serde(default)]
    pub series_title: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub genre: String,
    pub language: String,
    pub video_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Seconds
    #[serde(default)]
    pub duration: u64,
    /// "m:ss" or "h:mm:ss" as rendered by the server
    #[serde(default)]
    pub duration_formatted: Option<String>,
    #[serde(default)]
    pub episode_number: Option<u32>,
    #[serde(default)]
    pub season_number: Option<u32>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// A series and, on detail fetches, its episodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: i64,
    pub creator_id: i64,
    #[serde(default)]
    pub creator_name: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub genre: String,
    pub language: String,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub episode_count: u32,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    /// Present on `/series/{id}` only, ordered by season then episode
    #[serde(default)]
    pub episodes: Option<Vec<Video>>,
}

/// Server-curated home feed
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HomeFeed {
    #[serde(default)]
    pub featured: Option<Series>,
    #[serde(default)]
    pub trending: Vec<Video>,
    #[serde(default)]
    pub new_episodes: Vec<Video>,
    #[serde(default)]
    pub recently_added: Vec<Video>,
    #[serde(default)]
    pub featured_series: Vec<Series>,
    /// One row per genre that has published videos
    #[serde(default)]
    pub genres: BTreeMap<String, Vec<Video>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub videos: Vec<Video>,
    #[serde(default)]
    pub series: Vec<Series>,
}

/// Search terms; at least one must be set
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub genre: Option<String>,
    pub language: Option<String>,
}

impl SearchQuery {
    pub fn text(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        [&self.q, &self.genre, &self.language]
            .iter()
            .all(|v| v.as_deref().is_none_or(|s| s.trim().is_empty()))
    }
}

/// Browse filters; unset fields are not sent
#[derive(Debug, Clone, Default)]
pub struct BrowseFilters {
    pub genre: Option<String>,
    pub language: Option<String>,
    pub rating: Option<String>,
    /// "Standalone" or "Episode"
    pub video_type: Option<String>,
    /// "short", "medium" or "long"
    pub duration: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BrowsePage {
    #[serde(default)]
    pub videos: Vec<Video>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u32,
    #[serde(default = "first_page")]
    pub page: u32,
}

fn first_page() -> u32 {
    1
}

/// Paged list of the creator's own videos
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VideoPage {
    #[serde(default)]
    pub videos: Vec<Video>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u32,
}

/// Paged public series listing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SeriesPage {
    #[serde(default)]
    pub series: Vec<Series>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u32,
    #[serde(default = "first_page")]
    pub current_page: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WatchLaterItem {
    pub id: i64,
    pub user_id: i64,
    pub video_id: i64,
    /// Missing when the video was deleted after being saved
    #[serde(default)]
    pub video: Option<Video>,
    #[serde(default)]
    pub added_at: Option<NaiveDateTime>,
}

/// A video with the viewer's resume position, as listed in history and
/// continue-watching
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WatchedVideo {
    #[serde(flatten)]
    pub video: Video,
    #[serde(default)]
    pub progress_seconds: u64,
    /// 0 to 100
    #[serde(default)]
    pub progress_pct: u8,
    #[serde(default)]
    pub last_watched_at: Option<NaiveDateTime>,
}

/// Resume position for one video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub progress_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
}

/// Reaction counts after a like/dislike toggle
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReactionSummary {
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub dislikes: u64,
    /// The caller's reaction, `None` once toggled off
    #[serde(default)]
    pub user_reaction: Option<Reaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreatorStats {
    #[serde(default)]
    pub total_videos: u64,
    #[serde(default)]
    pub total_views: u64,
    #[serde(default)]
    pub total_series: u64,
    #[serde(default)]
    pub recent_videos: Vec<Video>,
}

/// Fields for creating or editing a series
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeriesDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

/// Editable video metadata; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct VideoUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

/// `{"message": ...}` acknowledgement
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct MessageEnvelope {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoEnvelope {
    pub video: Video,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SeriesEnvelope {
    pub series: Series,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoList {
    #[serde(default)]
    pub videos: Vec<Video>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SeriesList {
    #[serde(default)]
    pub series: Vec<Series>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WatchedList {
    #[serde(default)]
    pub videos: Vec<WatchedVideo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SavedFlag {
    #[serde(default)]
    pub saved: bool,
}
