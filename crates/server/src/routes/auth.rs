//! Session establishment from a signed identity hand-off.
//!
//! The identity provider authenticates the user, then POSTs the email and
//! display name with `x-identity-signature = hex(HMAC-SHA256(secret, email))`.

use adburst_core::Email;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tower_sessions::Session;
use tracing::instrument;

use super::extract::ApiJson;
use crate::db::UserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::state::AppState;

/// Header carrying the identity signature.
pub const SIGNATURE_HEADER: &str = "x-identity-signature";

type HmacSha256 = Hmac<Sha256>;

/// Request body for `POST /api/auth/session`.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Response for session establishment.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub created: bool,
}

/// Check `signature_hex` against the HMAC of `email`.
#[must_use]
pub fn verify_signature(secret: &[u8], email: &str, signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(email.as_bytes());
    mac.verify_slice(&signature).is_ok()
}

/// Hex signature for `email`, as the identity provider computes it.
///
/// # Panics
///
/// Never; HMAC accepts keys of any length.
#[must_use]
pub fn sign_email(secret: &[u8], email: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(email.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// POST /api/auth/session
#[instrument(skip_all)]
pub async fn establish(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    ApiJson(request): ApiJson<SessionRequest>,
) -> Result<Json<SessionResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing identity signature".to_string()))?;

    let secret = state.config().identity_secret.expose_secret();
    if !verify_signature(secret.as_bytes(), &request.email, signature) {
        tracing::warn!("Rejected identity hand-off with bad signature");
        return Err(AppError::Unauthorized("Invalid identity signature".to_string()));
    }

    let email = Email::parse(&request.email)
        .map_err(|e| AppError::BadRequest(format!("Invalid email: {e}")))?;
    let display_name = request
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let (user, created) = UserRepository::new(state.pool())
        .find_or_create(&email, display_name, state.config().credits.signup_credits)
        .await?;

    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    tracing::info!(user_id = %user.id, created, "Session established");
    Ok(Json(SessionResponse { user, created }))
}

/// DELETE /api/auth/session
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session user no longer exists".to_string()))?;
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"k8Jq2vN5xR7mW3pL9tY6bH4cF1gD0sZa";

    #[test]
    fn test_signature_round_trip() {
        let signature = sign_email(SECRET, "ada@example.com");
        assert_eq!(signature.len(), 64);
        assert!(verify_signature(SECRET, "ada@example.com", &signature));
        assert!(verify_signature(SECRET, "ada@example.com", &signature.to_uppercase()));
    }

    #[test]
    fn test_signature_rejects_tampering() {
        let signature = sign_email(SECRET, "ada@example.com");
        assert!(!verify_signature(SECRET, "eve@example.com", &signature));
        assert!(!verify_signature(b"another-secret-entirely-000000000", "ada@example.com", &signature));
        assert!(!verify_signature(SECRET, "ada@example.com", "not-hex"));
        assert!(!verify_signature(SECRET, "ada@example.com", ""));
    }
}
