//! MiniStream Client Library
//!
//! Session handling, the authenticated request gateway, typed API calls and
//! the clip studio. The `ministream` binary is a thin CLI over these pieces;
//! integration tests drive them against an in-process fake API.

pub mod api;
pub mod config;
pub mod gateway;
pub mod session;
pub mod storage;
pub mod studio;

// Re-export commonly used types
pub use config::Config;
pub use gateway::{ApiClient, ApiError, ApiRequest};
pub use session::{SessionManager, SessionSnapshot};
pub use storage::{ClientStorage, FileStorage, MemoryStorage, TokenStore};
pub use studio::ClipTimeline;
