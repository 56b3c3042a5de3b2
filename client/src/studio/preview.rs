//! Local preview handles
//!
//! A `PreviewHandle` makes a not-yet-uploaded clip playable through a
//! `blob:ministream/<uuid>` URL. The registry keeps the bytes reachable for as
//! long as the handle lives; dropping the handle releases the entry.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tracing::trace;
use uuid::Uuid;

/// Scheme and host of every preview URL
pub const PREVIEW_URL_PREFIX: &str = "blob:ministream/";

/// Resolves preview URLs to clip bytes. Clones share one registry.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    entries: Arc<DashMap<Uuid, Bytes>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` and return the handle that keeps them resolvable
    pub fn acquire(&self, bytes: Bytes) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.entries.insert(id, bytes);
        trace!("Acquired preview handle {}", id);
        PreviewHandle {
            id,
            url: format!("{PREVIEW_URL_PREFIX}{id}"),
            entries: Arc::clone(&self.entries),
        }
    }

    /// Bytes behind a live preview URL
    pub fn resolve(&self, url: &str) -> Option<Bytes> {
        let id = url.strip_prefix(PREVIEW_URL_PREFIX)?.parse::<Uuid>().ok()?;
        self.entries.get(&id).map(|entry| entry.value().clone())
    }

    /// Number of handles not yet released
    pub fn live_count(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for PreviewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewRegistry")
            .field("live", &self.entries.len())
            .finish()
    }
}

/// A live preview URL. Not `Clone`: exactly one owner releases it.
pub struct PreviewHandle {
    id: Uuid,
    url: String,
    entries: Arc<DashMap<Uuid, Bytes>>,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.entries.remove(&self.id);
        trace!("Released preview handle {}", self.id);
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.url).finish()
    }
}
