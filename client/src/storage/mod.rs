//! Persistent client-side storage
//!
//! This module provides:
//! - `ClientStorage` trait, a string key/value store with the semantics of browser local storage
//! - `MemoryStorage` for tests and throwaway sessions
//! - `FileStorage` persisting to a JSON file so state survives restarts
//! - `TokenStore` and `PreferencesStore`, typed views over fixed keys

mod file;
mod memory;
mod preferences;
mod tokens;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use preferences::{Preferences, PreferencesStore};
pub use tokens::{TokenPair, TokenStore};

use thiserror::Error;

/// Errors raised by storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode storage contents: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key/value store for client state that must outlive a single request
pub trait ClientStorage: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
