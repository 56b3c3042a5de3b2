use crate::api;
use crate::gateway::{ApiClient, ApiError, ApiRequest};
use crate::session::state::{
    AuthResponse, Credentials, ProfileUpdate, SessionSnapshot, SignupRequest, UserEnvelope,
    UserProfile,
};
use crate::storage::{StorageError, TokenPair};
use metrics::counter;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Session manager errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not logged in")]
    NotLoggedIn,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to persist tokens: {0}")]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Text to show next to the form that triggered the error
    pub fn user_message(&self) -> String {
        match self {
            SessionError::InvalidCredentials => "Invalid email or password.".to_string(),
            SessionError::NotLoggedIn => "Please log in to continue.".to_string(),
            SessionError::Api(e) => e.user_message().to_string(),
            SessionError::Storage(_) => crate::gateway::GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    user: Option<UserProfile>,
    loading: bool,
    /// Bumped on every login and logout; background fetches started under an
    /// older epoch must not write their result
    epoch: u64,
}

/// Session manager: single source of truth for who is logged in
pub struct SessionManager {
    api: Arc<ApiClient>,
    state: RwLock<SessionState>,
}

impl SessionManager {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: RwLock::new(SessionState {
                user: None,
                loading: true,
                epoch: 0,
            }),
        }
    }

    /// The gateway this session authenticates
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        self.snapshot_of(&state)
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.state.read().await.user.clone()
    }

    fn snapshot_of(&self, state: &SessionState) -> SessionSnapshot {
        let tokens = self.api.tokens();
        SessionSnapshot {
            has_access_token: tokens.access_token().is_some(),
            has_refresh_token: tokens.refresh_token().is_some(),
            user: state.user.clone(),
            loading: state.loading,
        }
    }

    /// Hydrate the session from persisted tokens.
    ///
    /// Any failure to fetch the profile clears both tokens, so a stale
    /// authenticated state never survives startup. `loading` is cleared
    /// whatever the outcome.
    pub async fn initialize(&self) -> SessionSnapshot {
        let epoch = self.state.read().await.epoch;

        if self.api.tokens().access_token().is_none() {
            debug!("No stored access token; starting logged out");
            let mut state = self.state.write().await;
            state.loading = false;
            return self.snapshot_of(&state);
        }

        let result = api::auth::me(&self.api).await;

        let mut state = self.state.write().await;
        state.loading = false;
        if state.epoch != epoch {
            debug!("Session changed during hydration; discarding result");
            return self.snapshot_of(&state);
        }

        match result {
            Ok(user) => {
                info!("Restored session for user {}", user.id);
                state.user = Some(user);
            }
            Err(e) => {
                warn!("Could not restore session, logging out: {}", e);
                self.api.tokens().clear("hydration_failed");
                state.user = None;
            }
        }
        self.snapshot_of(&state)
    }

    /// Exchange credentials for a token pair and profile
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionSnapshot, SessionError> {
        let request = ApiRequest::post("/auth/login")
            .anonymous()
            .json(credentials)?;

        let response: AuthResponse = self.api.json(&request).await.map_err(|e| match e {
            ApiError::Unauthorized { .. } => {
                counter!("ministream_logins_total", "outcome" => "rejected").increment(1);
                SessionError::InvalidCredentials
            }
            other => SessionError::Api(other),
        })?;

        counter!("ministream_logins_total", "outcome" => "success").increment(1);
        self.establish(response).await
    }

    /// Register a new account and log it in
    pub async fn signup(&self, signup: &SignupRequest) -> Result<SessionSnapshot, SessionError> {
        let request = ApiRequest::post("/auth/signup").anonymous().json(signup)?;
        let response: AuthResponse = self.api.json(&request).await?;
        self.establish(response).await
    }

    /// Log in with a Google ID token
    pub async fn login_with_google(&self, id_token: &str) -> Result<SessionSnapshot, SessionError> {
        let request = ApiRequest::post("/auth/google")
            .anonymous()
            .json(&json!({ "token": id_token }))?;

        let response: AuthResponse = self.api.json(&request).await.map_err(|e| match e {
            ApiError::Unauthorized { .. } => SessionError::InvalidCredentials,
            other => SessionError::Api(other),
        })?;
        self.establish(response).await
    }

    async fn establish(&self, response: AuthResponse) -> Result<SessionSnapshot, SessionError> {
        // Tokens are written under the state lock so an in-flight hydration
        // cannot clear them between the save and the epoch bump
        let mut state = self.state.write().await;
        self.api.tokens().save(&TokenPair {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        })?;

        state.epoch += 1;
        state.loading = false;
        info!("Logged in as user {}", response.user.id);
        state.user = Some(response.user);
        Ok(self.snapshot_of(&state))
    }

    /// Clear both tokens and the in-memory user. Idempotent.
    pub async fn logout(&self) {
        let mut state = self.state.write().await;
        self.api.tokens().clear("logout");

        state.epoch += 1;
        state.loading = false;
        if let Some(user) = state.user.take() {
            info!("Logged out user {}", user.id);
        }
    }

    /// Re-fetch the profile without touching tokens.
    ///
    /// Failures leave the previous profile in place.
    pub async fn refresh_profile(&self) -> Option<UserProfile> {
        let epoch = self.state.read().await.epoch;
        let result = api::auth::me(&self.api).await;

        let mut state = self.state.write().await;
        match result {
            Ok(user) if state.epoch == epoch => {
                state.user = Some(user);
            }
            Ok(_) => debug!("Session changed during profile refresh; discarding result"),
            Err(e) => debug!("Profile refresh failed, keeping previous state: {}", e),
        }
        state.user.clone()
    }

    /// Upgrade the current account to a creator account
    pub async fn become_creator(&self) -> Result<UserProfile, SessionError> {
        self.require_login().await?;
        let envelope: UserEnvelope = self
            .api
            .json(&ApiRequest::post("/auth/become-creator"))
            .await?;
        Ok(self.replace_user(envelope.user).await)
    }

    /// Update display name and/or bio
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, SessionError> {
        self.require_login().await?;
        let request = ApiRequest::put("/auth/profile").json(update)?;
        let envelope: UserEnvelope = self.api.json(&request).await?;
        Ok(self.replace_user(envelope.user).await)
    }

    async fn require_login(&self) -> Result<(), SessionError> {
        if self.state.read().await.user.is_none() {
            return Err(SessionError::NotLoggedIn);
        }
        Ok(())
    }

    async fn replace_user(&self, user: UserProfile) -> UserProfile {
        let mut state = self.state.write().await;
        state.user = Some(user.clone());
        user
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}
