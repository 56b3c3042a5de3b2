//! Client configuration
//!
//! Configuration is loaded from environment variables, falling back to defaults
//! for anything unset or unparsable.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Name of the persisted storage file inside the data directory
pub const STORAGE_FILE_NAME: &str = "storage.json";

/// Main client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API connection settings
    pub api: ApiConfig,

    /// Directory holding persisted client state (tokens, preferences)
    pub data_dir: PathBuf,

    /// Clip studio configuration
    pub studio: StudioConfig,
}

/// HTTP settings for the request gateway
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the REST API, including the `/api` prefix
    pub base_url: String,
    /// Whole-request timeout. `None` leaves the HTTP stack's default in place.
    pub request_timeout: Option<Duration>,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

/// Clip studio configuration
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Maximum clips accepted by a single merge call
    pub max_clips: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            data_dir: PathBuf::from(".ministream"),
            studio: StudioConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            request_timeout: None,
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("ministream-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self { max_clips: 20 }
    }
}

impl ApiConfig {
    /// Settings pointing at `base_url`, everything else default
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // API config
        if let Ok(url) = env::var("MINISTREAM_API_URL")
            && !url.is_empty()
        {
            config.api.base_url = url;
        }
        if let Ok(val) = env::var("MINISTREAM_REQUEST_TIMEOUT_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.api.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Ok(val) = env::var("MINISTREAM_CONNECT_TIMEOUT_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.api.connect_timeout = Duration::from_secs(secs);
        }
        if let Ok(agent) = env::var("MINISTREAM_USER_AGENT")
            && !agent.is_empty()
        {
            config.api.user_agent = agent;
        }

        // Storage
        if let Ok(dir) = env::var("MINISTREAM_DATA_DIR")
            && !dir.is_empty()
        {
            config.data_dir = PathBuf::from(dir);
        }

        // Studio config
        if let Ok(val) = env::var("STUDIO_MAX_CLIPS")
            && let Ok(max) = val.parse::<usize>()
            && max >= 2
        {
            config.studio.max_clips = max;
        }

        config
    }

    /// Path of the persisted storage file
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILE_NAME)
    }
}
