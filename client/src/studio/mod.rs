//! Clip studio
//!
//! This module provides:
//! - `ClipTimeline`, the ordered clip list with add/remove/move/reset
//! - The sequential preview driver (`start_preview`, `clip_ended`)
//! - `PreviewRegistry` and `PreviewHandle`, scoped local playback URLs
//! - Merge and publish against the studio endpoints

mod merge;
mod preview;
mod timeline;

pub use merge::{
    MERGE_PATH, MIN_CLIPS, MergeResult, PUBLISH_PATH, PublishMetadata, StudioError,
    publish_merged,
};
pub use preview::{PREVIEW_URL_PREFIX, PreviewHandle, PreviewRegistry};
pub use timeline::{
    Clip, ClipId, ClipSource, ClipTimeline, Direction, PreviewCommand, PreviewState,
};
