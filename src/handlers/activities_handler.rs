use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{
    extractors::SessionUser,
    models::{LoginHistoryEntry, UserActivity},
    AppResult, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct GetActivitiesQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "activityType")]
    pub activity_type: Option<String>,
}

/// GET /api/activities?userId=&activityType=
#[utoipa::path(
    get,
    path = "/api/activities",
    params(GetActivitiesQuery),
    responses(
        (status = 200, description = "Recorded user activities, newest first", body = Vec<UserActivity>)
    ),
    tag = "activities",
    security(("cookie_auth" = []))
)]
pub async fn get_activities(
    State(state): State<Arc<AppState>>,
    _user: SessionUser,
    Query(query): Query<GetActivitiesQuery>,
) -> AppResult<Json<Vec<UserActivity>>> {
    let mut sql = String::from("SELECT * FROM user_activities WHERE 1=1");
    let mut bindings: Vec<String> = Vec::new();

    if let Some(user_id) = query.user_id {
        sql.push_str(&format!(" AND user_id = ${}", bindings.len() + 1));
        bindings.push(user_id);
    }

    if let Some(activity_type) = query.activity_type {
        sql.push_str(&format!(" AND activity_type = ${}", bindings.len() + 1));
        bindings.push(activity_type);
    }

    sql.push_str(" ORDER BY created_at DESC LIMIT 200");

    let mut query_builder = sqlx::query_as::<_, UserActivity>(&sql);
    for binding in bindings {
        query_builder = query_builder.bind(binding);
    }

    let activities = query_builder.fetch_all(&state.db).await?;

    Ok(Json(activities))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct GetLoginHistoryQuery {
    pub username: Option<String>,
}

/// GET /api/login-history?username=
#[utoipa::path(
    get,
    path = "/api/login-history",
    params(GetLoginHistoryQuery),
    responses(
        (status = 200, description = "Sign-in attempts, newest first", body = Vec<LoginHistoryEntry>)
    ),
    tag = "activities",
    security(("cookie_auth" = []))
)]
pub async fn get_login_history(
    State(state): State<Arc<AppState>>,
    _user: SessionUser,
    Query(query): Query<GetLoginHistoryQuery>,
) -> AppResult<Json<Vec<LoginHistoryEntry>>> {
    let entries = if let Some(username) = query.username {
        sqlx::query_as::<_, LoginHistoryEntry>(
            "SELECT * FROM login_history WHERE username = $1 ORDER BY login_time DESC LIMIT 200",
        )
        .bind(username)
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as::<_, LoginHistoryEntry>(
            "SELECT * FROM login_history ORDER BY login_time DESC LIMIT 200",
        )
        .fetch_all(&state.db)
        .await?
    };

    Ok(Json(entries))
}
