//! Request gateway
//!
//! This module provides:
//! - `ApiRequest`, a re-issuable description of one API call
//! - `ApiClient`, which attaches the bearer token and performs the one-shot refresh-and-retry
//! - `retry`, the pure policy deciding what happens after an authorization failure
//! - `ApiError`, the failure taxonomy callers match on

mod client;
mod error;
mod request;
pub mod retry;

pub use client::{ApiClient, ApiResponse, REFRESH_PATH};
pub use error::{ApiError, GENERIC_ERROR_MESSAGE};
pub use request::{ApiRequest, FormPart, RequestBody};
pub use retry::{AuthAction, AuthOutcome, auth_action};
