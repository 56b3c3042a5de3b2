//! Authenticated HTTP client
//!
//! Every call goes through `ApiClient::execute`, which attaches the stored
//! access token, and on a 401 performs at most one silent refresh before
//! re-issuing the request. Token side effects are confined to `TokenStore`.

use bytes::Bytes;
use metrics::counter;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::{ApiError, ErrorBody};
use super::request::ApiRequest;
use super::retry::{self, AuthAction};
use crate::config::ApiConfig;
use crate::storage::TokenStore;

/// Path of the token refresh endpoint, relative to the base URL
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Successful response with its body fully read
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[derive(Debug)]
enum RefreshError {
    /// Nothing to refresh with
    NoRefreshToken,
    /// The refresh call itself failed
    Failed(String),
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// HTTP client for the MiniStream API
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
    /// Serialises refresh calls so concurrent 401s share one refresh
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, tokens: TokenStore) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The persisted token pair shared with the session manager
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Execute a request and decode its JSON body
    pub async fn json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        self.execute(request).await?.json()
    }

    /// Execute a request, refreshing the access token once if the server rejects it
    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut attempt = 0;

        loop {
            let bearer = if request.authenticated {
                self.tokens.access_token()
            } else {
                None
            };

            let response = match request
                .build(&self.http, &self.base_url, bearer.as_deref())?
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    counter!("ministream_requests_total", "outcome" => "network_error")
                        .increment(1);
                    warn!("{} {} failed without a response: {}", request.method, request.path, e);
                    return Err(ApiError::Network(e));
                }
            };

            let status = response.status();
            let body = response.bytes().await?;

            if status.is_success() {
                counter!("ministream_requests_total", "outcome" => "success").increment(1);
                debug!("{} {} -> {}", request.method, request.path, status);
                return Ok(ApiResponse { status, body });
            }

            let error_body = ErrorBody::parse(&body);
            debug!(
                "{} {} -> {} ({})",
                request.method,
                request.path,
                status,
                error_body.message.as_deref().unwrap_or("no message")
            );

            if !request.authenticated {
                counter!("ministream_requests_total", "outcome" => "failure").increment(1);
                return Err(ApiError::from_failure(status, error_body));
            }

            let outcome = retry::classify(status, bearer.is_some(), &error_body);
            match retry::auth_action(outcome, attempt) {
                AuthAction::Deliver => {
                    counter!("ministream_requests_total", "outcome" => "failure").increment(1);
                    return Err(ApiError::from_failure(status, error_body));
                }
                AuthAction::ClearTokens => {
                    warn!(
                        "Server could not process the access token on {} {}; clearing session",
                        request.method, request.path
                    );
                    self.clear_stale_tokens(bearer.as_deref(), "malformed_token")
                        .await;
                    counter!("ministream_requests_total", "outcome" => "auth_failure")
                        .increment(1);
                    return Err(ApiError::MalformedToken {
                        message: error_body.message.unwrap_or_default(),
                    });
                }
                AuthAction::RefreshThenRetry => {
                    attempt += 1;
                    match self.refresh_access_token(bearer.as_deref()).await {
                        Ok(()) => {
                            debug!(
                                "Retrying {} {} with refreshed access token",
                                request.method, request.path
                            );
                        }
                        Err(RefreshError::NoRefreshToken) => {
                            debug!("No refresh token stored; logging out");
                            self.clear_stale_tokens(bearer.as_deref(), "no_refresh_token")
                                .await;
                            counter!("ministream_requests_total", "outcome" => "auth_failure")
                                .increment(1);
                            return Err(ApiError::from_failure(status, error_body));
                        }
                        Err(RefreshError::Failed(reason)) => {
                            info!("Token refresh failed, logging out: {}", reason);
                            self.clear_stale_tokens(bearer.as_deref(), "refresh_failed")
                                .await;
                            counter!("ministream_requests_total", "outcome" => "auth_failure")
                                .increment(1);
                            return Err(ApiError::from_failure(status, error_body));
                        }
                    }
                }
            }
        }
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// `stale` is the access token the failed request carried. If another
    /// request replaced it while this one waited for the lock, the new token
    /// is reused and no refresh call is made.
    async fn refresh_access_token(&self, stale: Option<&str>) -> Result<(), RefreshError> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.tokens.access_token()
            && Some(current.as_str()) != stale
        {
            debug!("Access token was refreshed by a concurrent request");
            counter!("ministream_token_refresh_total", "outcome" => "shared").increment(1);
            return Ok(());
        }

        let refresh_token = self
            .tokens
            .refresh_token()
            .ok_or(RefreshError::NoRefreshToken)?;

        // Sent directly, outside `execute`, so a failing refresh can never recurse
        let url = format!("{}{}", self.base_url, REFRESH_PATH);
        let result = self.http.post(url).bearer_auth(refresh_token).send().await;

        let refreshed = match result {
            Ok(response) if response.status().is_success() => response
                .json::<RefreshResponse>()
                .await
                .map_err(|e| RefreshError::Failed(format!("unreadable refresh response: {e}"))),
            Ok(response) => Err(RefreshError::Failed(format!(
                "refresh rejected with {}",
                response.status()
            ))),
            Err(e) => Err(RefreshError::Failed(format!("refresh request failed: {e}"))),
        };

        let refreshed = match refreshed {
            Ok(refreshed) => refreshed,
            Err(e) => {
                counter!("ministream_token_refresh_total", "outcome" => "failure").increment(1);
                return Err(e);
            }
        };

        let replaced = self
            .tokens
            .replace_access_token_if_current(stale, &refreshed.access_token)
            .map_err(|e| RefreshError::Failed(format!("could not persist access token: {e}")))?;
        if !replaced {
            // A login landed while the refresh was in flight; its token wins
            counter!("ministream_token_refresh_total", "outcome" => "superseded").increment(1);
            return Ok(());
        }

        counter!("ministream_token_refresh_total", "outcome" => "success").increment(1);
        info!("Refreshed access token");
        Ok(())
    }

    /// Clear both tokens unless a newer login or refresh replaced `stale`, the
    /// access token the failed request carried.
    async fn clear_stale_tokens(&self, stale: Option<&str>, reason: &'static str) {
        let _guard = self.refresh_lock.lock().await;
        if !self.tokens.clear_if_current(stale, reason) {
            info!("Stored tokens changed after the request was sent; keeping them");
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("tokens", &self.tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, TokenPair};
    use std::sync::Arc;

    fn client(base_url: &str) -> ApiClient {
        let tokens = TokenStore::new(Arc::new(MemoryStorage::new()));
        ApiClient::new(&ApiConfig::with_base_url(base_url), tokens).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = client("http://localhost:5000/api/");
        assert_eq!(api.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn test_response_json_decode_error() {
        let response = ApiResponse {
            status: StatusCode::OK,
            body: Bytes::from_static(b"not json"),
        };
        let result: Result<serde_json::Value, _> = response.json();
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_network_error_when_nothing_listens() {
        // Port 9 (discard) on localhost is closed in test environments
        let api = client("http://127.0.0.1:9/api");
        api.tokens()
            .save(&TokenPair {
                access_token: "a".into(),
                refresh_token: Some("r".into()),
            })
            .unwrap();

        let result = api.execute(&ApiRequest::get("/auth/me")).await;
        assert!(
            matches!(result, Err(ApiError::Network(_))),
            "Expected a network error, got {:?}",
            result
        );
        assert_eq!(
            api.tokens().access_token().as_deref(),
            Some("a"),
            "Network failures must not touch stored tokens"
        );
    }

    #[tokio::test]
    async fn test_refresh_reuses_token_replaced_while_waiting() {
        let api = client("http://127.0.0.1:9/api");
        api.tokens().set_access_token("new").unwrap();

        // The failed request carried "old"; "new" is already stored, so no call is made
        let result = api.refresh_access_token(Some("old")).await;
        assert!(result.is_ok());
        assert_eq!(api.tokens().access_token().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_stale_failure_keeps_newer_tokens() {
        let api = client("http://127.0.0.1:9/api");
        api.tokens()
            .save(&TokenPair {
                access_token: "fresh".into(),
                refresh_token: Some("fresh-r".into()),
            })
            .unwrap();

        api.clear_stale_tokens(Some("expired"), "refresh_failed").await;
        assert_eq!(api.tokens().access_token().as_deref(), Some("fresh"));
        assert_eq!(api.tokens().refresh_token().as_deref(), Some("fresh-r"));

        api.clear_stale_tokens(Some("fresh"), "refresh_failed").await;
        assert!(api.tokens().access_token().is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let api = client("http://127.0.0.1:9/api");
        api.tokens().set_access_token("old").unwrap();

        let result = api.refresh_access_token(Some("old")).await;
        assert!(matches!(result, Err(RefreshError::NoRefreshToken)));
    }
}
