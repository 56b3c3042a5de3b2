//! Ordered clip list and its sequential preview driver

use std::path::Path;

use tracing::{debug, info};
use uuid::Uuid;

use super::merge::{MergeResult, StudioError};
use super::preview::{PreviewHandle, PreviewRegistry};
use crate::api::MediaFile;
use crate::config::StudioConfig;

/// A user-selected file destined for the merge
pub type ClipSource = MediaFile;

/// Local identifier of a clip, stable across reorders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipId(Uuid);

impl std::fmt::Display for ClipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One entry of the timeline. Owns its preview handle, so the handle is
/// released exactly when the clip is dropped.
#[derive(Debug)]
pub struct Clip {
    id: ClipId,
    source: ClipSource,
    display_name: String,
    preview: PreviewHandle,
}

impl Clip {
    pub fn id(&self) -> ClipId {
        self.id
    }

    pub fn source(&self) -> &ClipSource {
        &self.source
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn preview_url(&self) -> &str {
        self.preview.url()
    }
}

/// Direction for `ClipTimeline::move_clip`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards index 0
    Earlier,
    /// Towards the end
    Later,
}

/// Sequential preview position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PreviewState {
    #[default]
    Idle,
    /// Clip at this index is the only one playing
    Playing(usize),
}

/// What the player should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewCommand {
    Play {
        index: usize,
        clip_id: ClipId,
        url: String,
    },
    Stop,
}

/// Creator's clip list with sequential preview and merge state.
///
/// Any structural edit (add, remove, effective move, reset) stops a running
/// preview and discards the merge result, which no longer matches the list.
#[derive(Debug)]
pub struct ClipTimeline {
    pub(super) clips: Vec<Clip>,
    registry: PreviewRegistry,
    preview: PreviewState,
    pub(super) merge_result: Option<MergeResult>,
    pub(super) max_clips: usize,
}

impl Default for ClipTimeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipTimeline {
    pub fn new() -> Self {
        Self::with_config(&StudioConfig::default())
    }

    pub fn with_config(config: &StudioConfig) -> Self {
        Self::with_registry(PreviewRegistry::new(), config.max_clips)
    }

    /// Timeline minting its preview handles from a shared `registry`
    pub fn with_registry(registry: PreviewRegistry, max_clips: usize) -> Self {
        Self {
            clips: Vec::new(),
            registry,
            preview: PreviewState::Idle,
            merge_result: None,
            max_clips,
        }
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn max_clips(&self) -> usize {
        self.max_clips
    }

    pub fn registry(&self) -> &PreviewRegistry {
        &self.registry
    }

    pub fn preview_state(&self) -> PreviewState {
        self.preview
    }

    pub fn merge_result(&self) -> Option<&MergeResult> {
        self.merge_result.as_ref()
    }

    pub fn position(&self, id: ClipId) -> Option<usize> {
        self.clips.iter().position(|c| c.id == id)
    }

    /// Append each file as a new clip, in order. Existing clips are kept.
    pub fn add_clips<I>(&mut self, sources: I) -> Vec<ClipId>
    where
        I: IntoIterator<Item = ClipSource>,
    {
        let added: Vec<ClipId> = sources
            .into_iter()
            .map(|source| {
                let id = ClipId(Uuid::new_v4());
                let preview = self.registry.acquire(source.bytes.clone());
                let display_name = source.file_name.clone();
                self.clips.push(Clip {
                    id,
                    source,
                    display_name,
                    preview,
                });
                id
            })
            .collect();

        if !added.is_empty() {
            debug!("Added {} clips ({} total)", added.len(), self.clips.len());
            self.structure_changed();
        }
        added
    }

    /// Read files from disk and append them. Nothing is added unless every
    /// file could be read.
    pub async fn add_clip_files<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
    ) -> Result<Vec<ClipId>, StudioError> {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            sources.push(ClipSource::from_path(path).await?);
        }
        Ok(self.add_clips(sources))
    }

    /// Remove a clip and release its preview handle. Returns false for an
    /// unknown id.
    pub fn remove_clip(&mut self, id: ClipId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let removed = self.clips.remove(index);
        debug!("Removed clip {} ({})", removed.id, removed.display_name);
        drop(removed);
        self.structure_changed();
        true
    }

    /// Swap the clip at `index` with its neighbour. Out-of-range moves are
    /// silent no-ops; returns whether anything moved.
    pub fn move_clip(&mut self, index: usize, direction: Direction) -> bool {
        let target = match direction {
            Direction::Earlier => index.checked_sub(1),
            Direction::Later => index.checked_add(1),
        };
        let Some(target) = target.filter(|&t| t < self.clips.len() && index < self.clips.len())
        else {
            return false;
        };

        self.clips.swap(index, target);
        self.structure_changed();
        true
    }

    /// Release every preview handle and return to the empty state
    pub fn reset(&mut self) {
        let released = self.clips.len();
        self.clips.clear();
        self.merge_result = None;
        self.preview = PreviewState::Idle;
        info!("Studio reset, released {} previews", released);
    }

    /// Start the sequential preview at the first clip
    pub fn start_preview(&mut self) -> PreviewCommand {
        if self.clips.is_empty() {
            self.preview = PreviewState::Idle;
            return PreviewCommand::Stop;
        }
        self.play(0)
    }

    /// Playback of clip `index` reached its end: advance, or finish after the
    /// last clip. End events for any clip other than the playing one are
    /// stale and return `None`.
    pub fn clip_ended(&mut self, index: usize) -> Option<PreviewCommand> {
        if self.preview != PreviewState::Playing(index) {
            debug!("Ignoring stale end event for clip {}", index);
            return None;
        }

        let next = index + 1;
        if next < self.clips.len() {
            Some(self.play(next))
        } else {
            self.preview = PreviewState::Idle;
            Some(PreviewCommand::Stop)
        }
    }

    pub fn stop_preview(&mut self) -> PreviewCommand {
        self.preview = PreviewState::Idle;
        PreviewCommand::Stop
    }

    fn play(&mut self, index: usize) -> PreviewCommand {
        let clip = &self.clips[index];
        self.preview = PreviewState::Playing(index);
        PreviewCommand::Play {
            index,
            clip_id: clip.id,
            url: clip.preview.url().to_string(),
        }
    }

    fn structure_changed(&mut self) {
        if let PreviewState::Playing(index) = self.preview {
            debug!("Clip list changed while previewing clip {}; stopping", index);
            self.preview = PreviewState::Idle;
        }
        if self.merge_result.take().is_some() {
            debug!("Clip list changed; discarding merge result");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str) -> ClipSource {
        ClipSource::new(name, name.as_bytes().to_vec())
    }

    fn names(timeline: &ClipTimeline) -> Vec<&str> {
        timeline.clips().iter().map(|c| c.display_name()).collect()
    }

    #[test]
    fn test_add_appends_in_order() {
        let mut timeline = ClipTimeline::new();
        timeline.add_clips([source("a.mp4"), source("b.mp4")]);
        timeline.add_clips([source("c.mp4")]);

        assert_eq!(names(&timeline), vec!["a.mp4", "b.mp4", "c.mp4"]);
        assert_eq!(timeline.registry().live_count(), 3);
    }

    #[test]
    fn test_live_handles_track_clip_count() {
        let mut timeline = ClipTimeline::new();
        let ids = timeline.add_clips((0..5).map(|i| source(&format!("{i}.mp4"))));
        assert_eq!(timeline.registry().live_count(), 5);

        timeline.move_clip(1, Direction::Later);
        assert_eq!(timeline.registry().live_count(), timeline.len());

        timeline.remove_clip(ids[0]);
        timeline.remove_clip(ids[3]);
        assert_eq!(timeline.len(), 3);
        assert_eq!(
            timeline.registry().live_count(),
            3,
            "Removing a clip must release exactly its handle"
        );

        assert!(!timeline.remove_clip(ids[0]), "Second removal is a no-op");
        assert_eq!(timeline.registry().live_count(), 3);

        timeline.reset();
        assert!(timeline.is_empty());
        assert_eq!(timeline.registry().live_count(), 0);
    }

    #[test]
    fn test_removed_clip_url_no_longer_resolves() {
        let mut timeline = ClipTimeline::new();
        let ids = timeline.add_clips([source("a.mp4"), source("b.mp4")]);
        let url_a = timeline.clips()[0].preview_url().to_string();

        timeline.remove_clip(ids[0]);
        assert!(timeline.registry().resolve(&url_a).is_none());
        assert_eq!(names(&timeline), vec!["b.mp4"]);
    }

    #[test]
    fn test_move_out_of_bounds_is_noop() {
        let mut timeline = ClipTimeline::new();
        timeline.add_clips([source("a"), source("b"), source("c")]);

        assert!(!timeline.move_clip(0, Direction::Earlier));
        assert!(!timeline.move_clip(2, Direction::Later));
        assert!(!timeline.move_clip(7, Direction::Earlier));
        assert_eq!(names(&timeline), vec!["a", "b", "c"]);

        assert!(timeline.move_clip(0, Direction::Later));
        assert_eq!(names(&timeline), vec!["b", "a", "c"]);
        assert!(timeline.move_clip(2, Direction::Earlier));
        assert_eq!(names(&timeline), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_sequential_preview_visits_every_clip_once() {
        let mut timeline = ClipTimeline::new();
        let ids = timeline.add_clips([source("a"), source("b"), source("c")]);

        let mut visited = Vec::new();
        let mut command = timeline.start_preview();
        while let PreviewCommand::Play { index, clip_id, .. } = command {
            assert_eq!(timeline.preview_state(), PreviewState::Playing(index));
            assert_eq!(clip_id, ids[index]);
            visited.push(index);
            command = timeline.clip_ended(index).unwrap();
        }

        assert_eq!(visited, vec![0, 1, 2]);
        assert_eq!(timeline.preview_state(), PreviewState::Idle);
    }

    #[test]
    fn test_preview_of_empty_timeline_stops() {
        let mut timeline = ClipTimeline::new();
        assert_eq!(timeline.start_preview(), PreviewCommand::Stop);
        assert_eq!(timeline.preview_state(), PreviewState::Idle);
    }

    #[test]
    fn test_stale_end_event_ignored() {
        let mut timeline = ClipTimeline::new();
        timeline.add_clips([source("a"), source("b")]);
        timeline.start_preview();

        assert!(timeline.clip_ended(1).is_none());
        assert_eq!(timeline.preview_state(), PreviewState::Playing(0));
    }

    #[test]
    fn test_structural_edit_stops_preview() {
        let mut timeline = ClipTimeline::new();
        let ids = timeline.add_clips([source("a"), source("b"), source("c")]);

        timeline.start_preview();
        timeline.move_clip(1, Direction::Later);
        assert_eq!(timeline.preview_state(), PreviewState::Idle);

        timeline.start_preview();
        timeline.remove_clip(ids[2]);
        assert_eq!(timeline.preview_state(), PreviewState::Idle);
        assert!(
            timeline.clip_ended(0).is_none(),
            "End events after a stop must not restart playback"
        );

        timeline.start_preview();
        timeline.move_clip(0, Direction::Earlier);
        assert_eq!(
            timeline.preview_state(),
            PreviewState::Playing(0),
            "A no-op move is not a structural edit"
        );
    }

    #[tokio::test]
    async fn test_add_clip_files_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.mp4");
        std::fs::write(&present, b"a").unwrap();
        let missing = dir.path().join("missing.mp4");

        let mut timeline = ClipTimeline::new();
        let result = timeline.add_clip_files(&[&present, &missing]).await;
        assert!(matches!(result, Err(StudioError::Io(_))));
        assert!(timeline.is_empty());
        assert_eq!(timeline.registry().live_count(), 0);

        let ids = timeline.add_clip_files(&[&present]).await.unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(timeline.clips()[0].display_name(), "a.mp4");
    }
}
