use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use crate::{auth, AppState};

/// Extracts the session token from either the ld_session cookie (browser
/// clients) or the Authorization header (API clients and tests).
fn extract_token_from_request(parts: &Parts) -> Option<String> {
    if let Some(cookie_header) = parts.headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            // Parse cookies manually (cookie = "name=value; name2=value2")
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(value) = cookie.strip_prefix("ld_session=") {
                    return Some(value.to_string());
                }
            }
        }
    }

    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    None
}

/// The signed-in user behind a request. Constructing this enforces the
/// session expiry rule: an expired row is deactivated during extraction,
/// so handlers only ever see live sessions.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub session_id: Uuid,
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub user_attributes: serde_json::Value,
}

impl FromRequestParts<Arc<AppState>> for SessionUser {
    type Rejection = (StatusCode, axum::Json<serde_json::Value>);

    fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = extract_token_from_request(parts);
        let state = state.clone();

        async move {
            let token = token.ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    axum::Json(json!({"error": "Missing authentication: no ld_session cookie or Authorization header"})),
                )
            })?;

            let session_id = auth::validate_session_token(&token, &state.config.session_secret)
                .map_err(|e| {
                    (
                        StatusCode::UNAUTHORIZED,
                        axum::Json(json!({"error": e.to_string()})),
                    )
                })?;

            let record = state
                .sessions
                .fetch_valid(session_id)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, session_id = %session_id, "Session lookup failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        axum::Json(json!({"error": "Database error"})),
                    )
                })?
                .ok_or_else(|| {
                    (
                        StatusCode::UNAUTHORIZED,
                        axum::Json(json!({"error": "Your session has expired. Please sign in again."})),
                    )
                })?;

            Ok(SessionUser {
                session_id,
                display_name: record.display_name().to_string(),
                user_id: record.user_id,
                username: record.username,
                email: record.email,
                expires_at: record.expires_at,
                user_attributes: record.user_attributes,
            })
        }
    }
}
