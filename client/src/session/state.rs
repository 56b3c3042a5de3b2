use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The logged-in account as reported by `/auth/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_creator: bool,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Point-in-time view of the session.
///
/// Tokens are reported by presence only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub has_access_token: bool,
    pub has_refresh_token: bool,
    pub user: Option<UserProfile>,
    /// True until `initialize` has resolved
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_creator(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_creator)
    }
}

/// Email/password login
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// New account registration
#[derive(Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// Profile fields to change; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Body of login, signup and Google login responses
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub user: UserProfile,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// `{"user": ...}` envelope
#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_decodes_server_shape() {
        let json = r#"{
            "id": 3,
            "email": "a@b.com",
            "display_name": "Aki",
            "avatar_url": null,
            "bio": null,
            "is_creator": false,
            "created_at": "2024-05-01T09:30:00.123456"
        }"#;
        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(user.display_name, "Aki");
        assert!(!user.is_creator);
        assert!(user.created_at.is_some(), "Naive isoformat timestamps must parse");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("a@b.com", "validpass1");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("a@b.com"));
        assert!(!rendered.contains("validpass1"));
    }

    #[test]
    fn test_profile_update_omits_unset_fields() {
        let update = ProfileUpdate {
            bio: Some("hi".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), serde_json::json!({"bio": "hi"}));
    }

    #[test]
    fn test_snapshot_creator_flag() {
        let snapshot = SessionSnapshot {
            has_access_token: false,
            has_refresh_token: false,
            user: None,
            loading: false,
        };
        assert!(!snapshot.is_logged_in());
        assert!(!snapshot.is_creator());
    }
}
