use axum::{extract::State, http::HeaderMap, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    auth::{self, session::NewSession, validation},
    extractors::SessionUser,
    AppError, AppResult, AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    #[schema(example = "dana.kim")]
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignInResponse {
    /// Signed session token. Send it back as the ld_session cookie or a
    /// Bearer header.
    pub token: String,
    pub username: String,
    #[schema(value_type = Object)]
    pub user_attributes: serde_json::Value,
    pub expires_at: DateTime<Utc>,
    pub mfa_enabled: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignUpRequest {
    pub username: String,
    pub password: String,
    #[schema(example = "dana@example.com")]
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignUpResponse {
    pub user_confirmed: bool,
    pub user_sub: String,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmSignUpRequest {
    pub username: String,
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResendConfirmationRequest {
    pub username: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub username: String,
    pub expires_at: DateTime<Utc>,
    pub minutes_remaining: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExtendSessionResponse {
    pub expires_at: DateTime<Utc>,
    pub message: String,
}

fn client_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
}

/// POST /api/auth/sign-in
#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in, session created", body = SignInResponse),
        (status = 401, description = "Provider rejected the credentials"),
        (status = 422, description = "Username or password failed local validation"),
        (status = 429, description = "Locked out after repeated failures")
    ),
    tag = "auth"
)]
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SignInRequest>,
) -> AppResult<Json<SignInResponse>> {
    let username = validation::validate_username(&payload.username)?.to_string();
    validation::validate_password(&payload.password)?;

    // Lockout check is purely local: after five consecutive failures the
    // provider is not contacted again until a successful login resets the
    // streak.
    let failures = state.sessions.consecutive_failures(&username).await?;
    if auth::session::is_locked_out(failures) {
        tracing::warn!(username = %username, failures, "Sign-in blocked by lockout");
        return Err(AppError::RateLimited(
            "Too many failed sign-in attempts. Please try again later.".to_string(),
        ));
    }

    let user_agent = client_user_agent(&headers);
    let ip_address = client_ip(&headers);

    let tokens = match state.cognito.initiate_auth(&username, &payload.password).await {
        Ok(tokens) => tokens,
        Err(e) => {
            state
                .sessions
                .record_login(
                    &username,
                    &username,
                    false,
                    Some(&e.to_string()),
                    ip_address.as_deref(),
                    user_agent.as_deref(),
                )
                .await?;
            return Err(e);
        }
    };

    // The provider accepted the credentials; verify the access token it
    // minted actually belongs to our pool before trusting it.
    let claims = auth::validate_access_token(
        &tokens.access_token,
        &state.jwks_cache,
        &state.config.token_issuer(),
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, username = %username, "Rejecting sign-in: bad access token");
        AppError::Unauthorized("Sign-in failed: the issued token could not be verified.".to_string())
    })?;

    let user = state.cognito.get_user(&tokens.access_token).await?;

    let email = user
        .attributes
        .get("email")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let record = state
        .sessions
        .create(NewSession {
            user_id: claims.sub,
            username: user.username.clone(),
            email,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user_attributes: user.attributes.clone(),
            user_agent: user_agent.clone(),
            ip_address: ip_address.clone(),
        })
        .await?;

    state
        .sessions
        .record_login(
            &record.user_id,
            &record.username,
            true,
            None,
            ip_address.as_deref(),
            user_agent.as_deref(),
        )
        .await?;

    state
        .sessions
        .record_activity(
            record.id,
            &record.user_id,
            "sign_in",
            json!({ "login_method": record.login_method }),
            Some("/api/auth/sign-in"),
        )
        .await?;

    let token = auth::generate_session_token(
        record.id,
        record.expires_at.timestamp(),
        &state.config.session_secret,
    )?;

    Ok(Json(SignInResponse {
        token,
        username: record.username,
        user_attributes: record.user_attributes,
        expires_at: record.expires_at,
        mfa_enabled: user.mfa_enabled,
    }))
}

/// POST /api/auth/sign-up
#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Account created, confirmation pending", body = SignUpResponse),
        (status = 409, description = "Username already exists"),
        (status = 422, description = "Local validation failed")
    ),
    tag = "auth"
)]
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignUpRequest>,
) -> AppResult<Json<SignUpResponse>> {
    let username = validation::validate_username(&payload.username)?.to_string();
    validation::validate_password(&payload.password)?;
    let email = validation::validate_email(&payload.email)?.to_string();

    let response = state.cognito.sign_up(&username, &payload.password, &email).await?;

    let user_confirmed = response
        .get("UserConfirmed")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let user_sub = response
        .get("UserSub")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let message = if user_confirmed {
        "Account created. You can sign in now.".to_string()
    } else {
        "Account created. Check your email for the confirmation code.".to_string()
    };

    Ok(Json(SignUpResponse {
        user_confirmed,
        user_sub,
        message,
    }))
}

/// POST /api/auth/confirm
#[utoipa::path(
    post,
    path = "/api/auth/confirm",
    request_body = ConfirmSignUpRequest,
    responses(
        (status = 200, description = "Account confirmed", body = MessageResponse),
        (status = 400, description = "Code mismatch or expired")
    ),
    tag = "auth"
)]
pub async fn confirm_sign_up(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConfirmSignUpRequest>,
) -> AppResult<Json<MessageResponse>> {
    let username = validation::validate_username(&payload.username)?.to_string();

    if payload.code.trim().is_empty() {
        return Err(AppError::Validation("Please enter the confirmation code.".to_string()));
    }

    state.cognito.confirm_sign_up(&username, &payload.code).await?;

    Ok(Json(MessageResponse {
        message: "Your account has been confirmed. You can sign in now.".to_string(),
    }))
}

/// POST /api/auth/resend-confirmation
#[utoipa::path(
    post,
    path = "/api/auth/resend-confirmation",
    request_body = ResendConfirmationRequest,
    responses(
        (status = 200, description = "Code resent", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn resend_confirmation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResendConfirmationRequest>,
) -> AppResult<Json<MessageResponse>> {
    let username = validation::validate_username(&payload.username)?.to_string();

    state.cognito.resend_confirmation_code(&username).await?;

    Ok(Json(MessageResponse {
        message: "A new confirmation code is on its way.".to_string(),
    }))
}

/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Attributes of the signed-in user"),
        (status = 401, description = "No live session")
    ),
    tag = "auth",
    security(("cookie_auth" = []))
)]
pub async fn get_me(user: SessionUser) -> Json<serde_json::Value> {
    Json(json!({
        "username": user.username,
        "display_name": user.display_name,
        "email": user.email,
        "user_attributes": user.user_attributes,
    }))
}

/// GET /api/auth/session
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Current session status", body = SessionStatusResponse),
        (status = 401, description = "No live session")
    ),
    tag = "auth",
    security(("cookie_auth" = []))
)]
pub async fn session_status(user: SessionUser) -> Json<SessionStatusResponse> {
    let minutes_remaining = (user.expires_at - Utc::now()).num_minutes().max(0);

    Json(SessionStatusResponse {
        authenticated: true,
        username: user.username,
        expires_at: user.expires_at,
        minutes_remaining,
    })
}

/// POST /api/auth/refresh
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "Access token refreshed", body = MessageResponse),
        (status = 400, description = "Session has no refresh token"),
        (status = 401, description = "Refresh token no longer valid")
    ),
    tag = "auth",
    security(("cookie_auth" = []))
)]
pub async fn refresh_session(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> AppResult<Json<MessageResponse>> {
    let record = state
        .sessions
        .fetch_valid(user.session_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session not found".to_string()))?;

    let refresh_token = record.refresh_token.as_deref().ok_or_else(|| {
        AppError::BadRequest("This session has no refresh token.".to_string())
    })?;

    let tokens = state.cognito.refresh_tokens(refresh_token).await?;

    auth::validate_access_token(
        &tokens.access_token,
        &state.jwks_cache,
        &state.config.token_issuer(),
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, session_id = %user.session_id, "Refreshed token failed validation");
        AppError::Unauthorized("Token refresh failed.".to_string())
    })?;

    state
        .sessions
        .update_tokens(user.session_id, &tokens.access_token, tokens.refresh_token.as_deref())
        .await?;

    Ok(Json(MessageResponse {
        message: format!("Access token refreshed; valid for {} seconds.", tokens.expires_in),
    }))
}

/// POST /api/auth/extend
#[utoipa::path(
    post,
    path = "/api/auth/extend",
    responses(
        (status = 200, description = "Expiry window extended", body = ExtendSessionResponse),
        (status = 401, description = "No live session")
    ),
    tag = "auth",
    security(("cookie_auth" = []))
)]
pub async fn extend_session(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> AppResult<Json<ExtendSessionResponse>> {
    let expires_at = state.sessions.extend(user.session_id).await?;

    Ok(Json(ExtendSessionResponse {
        expires_at,
        message: "Session extended.".to_string(),
    }))
}

/// POST /api/auth/sign-out
#[utoipa::path(
    post,
    path = "/api/auth/sign-out",
    responses(
        (status = 200, description = "Session revoked", body = MessageResponse),
        (status = 401, description = "No live session")
    ),
    tag = "auth",
    security(("cookie_auth" = []))
)]
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> AppResult<Json<MessageResponse>> {
    if let Some(record) = state.sessions.fetch_valid(user.session_id).await? {
        // Provider-side sign-out is best effort; the local session dies
        // either way.
        if let Err(e) = state.cognito.global_sign_out(&record.access_token).await {
            tracing::warn!(error = %e, session_id = %user.session_id, "Global sign-out failed, clearing local session anyway");
        }
    }

    state
        .sessions
        .record_activity(
            user.session_id,
            &user.user_id,
            "sign_out",
            json!({}),
            Some("/api/auth/sign-out"),
        )
        .await?;

    state.sessions.revoke(user.session_id).await?;
    state.sessions.record_logout(&user.user_id).await?;

    Ok(Json(MessageResponse {
        message: "You have been signed out.".to_string(),
    }))
}
