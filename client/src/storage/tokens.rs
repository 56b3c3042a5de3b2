//! Bearer token persistence

use std::sync::{Arc, Mutex, MutexGuard};

use metrics::counter;
use tracing::{debug, warn};

use super::{ClientStorage, StorageError};

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Access/refresh pair as returned by the login and signup endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// The two persisted bearer tokens.
///
/// Cloning is cheap and every clone reads and writes the same storage, so the
/// gateway and the session manager never hold diverging copies. Writes are
/// serialised across clones so a compare-and-clear cannot interleave with a save.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn ClientStorage>,
    writes: Arc<Mutex<()>>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        Self {
            storage,
            writes: Arc::new(Mutex::new(())),
        }
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn access_token(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn set_access_token(&self, token: &str) -> Result<(), StorageError> {
        let _writes = self.lock_writes();
        self.storage.set(ACCESS_TOKEN_KEY, token)
    }

    /// Store `token` only if the access token is still `stale`. Returns false,
    /// storing nothing, when another login or refresh replaced it meanwhile.
    pub fn replace_access_token_if_current(
        &self,
        stale: Option<&str>,
        token: &str,
    ) -> Result<bool, StorageError> {
        let _writes = self.lock_writes();
        if self.access_token().as_deref() != stale {
            debug!("Access token changed since the request was sent; not replacing it");
            return Ok(false);
        }
        self.storage.set(ACCESS_TOKEN_KEY, token)?;
        Ok(true)
    }

    /// Persist a freshly issued pair. The refresh token is only overwritten
    /// when the pair carries one.
    pub fn save(&self, pair: &TokenPair) -> Result<(), StorageError> {
        let _writes = self.lock_writes();
        self.storage.set(ACCESS_TOKEN_KEY, &pair.access_token)?;
        if let Some(ref refresh) = pair.refresh_token {
            self.storage.set(REFRESH_TOKEN_KEY, refresh)?;
        }
        debug!(
            has_refresh = pair.refresh_token.is_some(),
            "Stored new token pair"
        );
        Ok(())
    }

    /// Remove both tokens. Never fails; backend errors are logged.
    pub fn clear(&self, reason: &'static str) {
        let _writes = self.lock_writes();
        self.remove_both(reason);
    }

    /// Remove both tokens only if the access token is still `stale`, the one a
    /// failed request carried. Returns whether anything was cleared.
    pub fn clear_if_current(&self, stale: Option<&str>, reason: &'static str) -> bool {
        let _writes = self.lock_writes();
        if self.access_token().as_deref() != stale {
            debug!(reason, "Tokens changed since the request was sent; keeping them");
            return false;
        }
        self.remove_both(reason);
        true
    }

    fn remove_both(&self, reason: &'static str) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Failed to remove {} from storage: {}", key, e);
            }
        }
        counter!("ministream_tokens_cleared_total", "reason" => reason).increment(1);
        debug!(reason, "Cleared stored tokens");
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Token values stay out of logs
        f.debug_struct("TokenStore")
            .field("has_access_token", &self.access_token().is_some())
            .field("has_refresh_token", &self.refresh_token().is_some())
            .finish()
    }
}
