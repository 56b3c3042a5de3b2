//! Authorization retry policy
//!
//! The policy is a pure function of how a response was classified and how many
//! refresh-and-retry rounds the request has already been through, so it can be
//! tested without any I/O.

use reqwest::StatusCode;

use super::error::ErrorBody;

/// Refresh-and-retry rounds allowed per original request
pub const MAX_REFRESH_ATTEMPTS: u32 = 1;

/// How a response relates to the caller's credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// 2xx
    Success,
    /// 401: the access token is missing, expired or revoked
    Unauthorized,
    /// 422 on a token-bearing request without field errors: the token itself is unusable
    UnprocessableCredential,
    /// Any other failure; credentials are not the problem
    OtherFailure,
}

/// What the gateway does next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    /// Hand the response (or its error) back to the caller as-is
    Deliver,
    /// Refresh the access token, then re-issue the request
    RefreshThenRetry,
    /// Drop both stored tokens without refreshing, then fail
    ClearTokens,
}

/// Classify a response for the retry policy
pub(crate) fn classify(status: StatusCode, carried_token: bool, body: &ErrorBody) -> AuthOutcome {
    if status.is_success() {
        return AuthOutcome::Success;
    }
    match status {
        StatusCode::UNAUTHORIZED => AuthOutcome::Unauthorized,
        StatusCode::UNPROCESSABLE_ENTITY if carried_token && !body.has_field_errors() => {
            AuthOutcome::UnprocessableCredential
        }
        _ => AuthOutcome::OtherFailure,
    }
}

/// Decide the next step for a request that has completed `attempt` refresh rounds
pub fn auth_action(outcome: AuthOutcome, attempt: u32) -> AuthAction {
    match outcome {
        AuthOutcome::Success | AuthOutcome::OtherFailure => AuthAction::Deliver,
        AuthOutcome::Unauthorized if attempt < MAX_REFRESH_ATTEMPTS => AuthAction::RefreshThenRetry,
        AuthOutcome::Unauthorized => AuthAction::Deliver,
        AuthOutcome::UnprocessableCredential => AuthAction::ClearTokens,
    }
}
