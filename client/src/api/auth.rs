//! Account endpoints that do not change who is logged in

use bytes::Bytes;
use serde_json::json;
use tracing::info;

use super::Confirmation;
use super::types::MessageEnvelope;
use crate::gateway::{ApiClient, ApiError, ApiRequest, FormPart};
use crate::session::UserProfile;
use crate::session::state::UserEnvelope;

/// Fetch the current user's profile
pub async fn me(api: &ApiClient) -> Result<UserProfile, ApiError> {
    let envelope: UserEnvelope = api.json(&ApiRequest::get("/auth/me")).await?;
    Ok(envelope.user)
}

/// Request a password reset email. The server answers the same way whether or
/// not the address is registered.
pub async fn forgot_password(api: &ApiClient, email: &str) -> Result<String, ApiError> {
    let request = ApiRequest::post("/auth/forgot-password")
        .anonymous()
        .json(&json!({ "email": email }))?;
    let envelope: MessageEnvelope = api.json(&request).await?;
    Ok(envelope.message)
}

/// Set a new password using the token from a reset link
pub async fn reset_password(
    api: &ApiClient,
    token: &str,
    password: &str,
) -> Result<String, ApiError> {
    let request = ApiRequest::post("/auth/reset-password")
        .anonymous()
        .json(&json!({ "token": token, "password": password }))?;
    let envelope: MessageEnvelope = api.json(&request).await?;
    Ok(envelope.message)
}

pub async fn change_password(
    api: &ApiClient,
    current_password: &str,
    new_password: &str,
) -> Result<String, ApiError> {
    let request = ApiRequest::post("/auth/change-password").json(&json!({
        "current_password": current_password,
        "new_password": new_password,
    }))?;
    let envelope: MessageEnvelope = api.json(&request).await?;
    Ok(envelope.message)
}

/// Upload a new avatar image and return the updated profile
pub async fn upload_avatar(
    api: &ApiClient,
    file_name: &str,
    content_type: Option<&str>,
    bytes: Bytes,
) -> Result<UserProfile, ApiError> {
    let request = ApiRequest::post("/auth/avatar").multipart(vec![FormPart::File {
        name: "avatar".to_string(),
        file_name: file_name.to_string(),
        content_type: content_type.map(str::to_string),
        bytes,
    }]);
    let envelope: UserEnvelope = api.json(&request).await?;
    Ok(envelope.user)
}

/// Permanently delete the account and clear the stored tokens
pub async fn delete_account(
    api: &ApiClient,
    password: &str,
    _confirmed: Confirmation,
) -> Result<(), ApiError> {
    let request = ApiRequest::delete("/auth/account").json(&json!({ "password": password }))?;
    api.execute(&request).await?;
    api.tokens().clear("account_deleted");
    info!("Account deleted");
    Ok(())
}
