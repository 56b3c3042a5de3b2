//! Viewer preferences persisted next to the tokens

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::{ClientStorage, StorageError};

const PREFERENCES_KEY: &str = "ministream_prefs";

/// Playback and discovery preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub autoplay: bool,
    /// "auto" or an explicit rendition such as "1080p"
    pub quality: String,
    /// "sub" or "dub"
    pub dub_sub: String,
    pub mature_content: bool,
    pub genres: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            autoplay: true,
            quality: "auto".to_string(),
            dub_sub: "sub".to_string(),
            mature_content: false,
            genres: Vec::new(),
        }
    }
}

/// Typed access to the stored preferences object
#[derive(Clone)]
pub struct PreferencesStore {
    storage: Arc<dyn ClientStorage>,
}

impl PreferencesStore {
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        Self { storage }
    }

    /// Stored preferences shallow-merged over the defaults
    pub fn load(&self) -> Preferences {
        let mut merged = defaults_object();
        merge_shallow(&mut merged, self.stored_object());

        match serde_json::from_value(Value::Object(merged)) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!("Stored preferences have unexpected types, using defaults: {}", e);
                Preferences::default()
            }
        }
    }

    /// Shallow-merge `patch` into the stored object and return the result.
    ///
    /// Keys not present in `patch` keep their stored values.
    pub fn update(&self, patch: Map<String, Value>) -> Result<Preferences, StorageError> {
        let mut stored = self.stored_object();
        merge_shallow(&mut stored, patch);
        self.storage
            .set(PREFERENCES_KEY, &serde_json::to_string(&Value::Object(stored))?)?;
        Ok(self.load())
    }

    /// Replace the stored object with `prefs`
    pub fn save(&self, prefs: &Preferences) -> Result<(), StorageError> {
        self.storage
            .set(PREFERENCES_KEY, &serde_json::to_string(prefs)?)
    }

    fn stored_object(&self) -> Map<String, Value> {
        let Some(raw) = self.storage.get(PREFERENCES_KEY) else {
            return Map::new();
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!("Ignoring stored preferences that are not a JSON object");
                Map::new()
            }
        }
    }
}

fn defaults_object() -> Map<String, Value> {
    match serde_json::to_value(Preferences::default()) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn merge_shallow(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}
