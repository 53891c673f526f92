use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{extractors::SessionUser, AppResult, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub total_users: i64,
    pub active_sessions: i64,
    pub sign_ins_today: i64,
    pub failed_sign_ins_today: i64,
    /// Share of today's sign-in attempts that succeeded; absent until the
    /// first attempt of the day.
    pub sign_in_success_rate: Option<f64>,
    pub pending_leave_requests: i64,
    pub last_login_time: Option<DateTime<Utc>>,
}

/// GET /api/dashboard - aggregates backing the admin console landing page
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Dashboard aggregates", body = DashboardResponse),
        (status = 401, description = "No live session")
    ),
    tag = "dashboard",
    security(("cookie_auth" = []))
)]
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> AppResult<Json<DashboardResponse>> {
    let total_users: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT user_id) FROM user_sessions")
            .fetch_one(&state.db)
            .await?;

    let active_sessions: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_sessions WHERE is_active AND expires_at > NOW()",
    )
    .fetch_one(&state.db)
    .await?;

    let (sign_ins_today, failed_sign_ins_today): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE success),
            COUNT(*) FILTER (WHERE NOT success)
        FROM login_history
        WHERE login_time >= date_trunc('day', NOW())
        "#,
    )
    .fetch_one(&state.db)
    .await?;

    let attempts = sign_ins_today + failed_sign_ins_today;
    let sign_in_success_rate = if attempts > 0 {
        Some(sign_ins_today as f64 / attempts as f64 * 100.0)
    } else {
        None
    };

    let pending_leave_requests: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM leave_applications WHERE status = 'pending'")
            .fetch_one(&state.db)
            .await?;

    let last_login_time: Option<DateTime<Utc>> = sqlx::query_scalar(
        "SELECT MAX(login_time) FROM login_history WHERE user_id = $1 AND success",
    )
    .bind(&user.user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(DashboardResponse {
        total_users,
        active_sessions,
        sign_ins_today,
        failed_sign_ins_today,
        sign_in_success_rate,
        pending_leave_requests,
        last_login_time,
    }))
}
