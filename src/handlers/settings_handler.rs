use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{extractors::SessionUser, models::SystemSetting, AppError, AppResult, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingInput {
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// GET /api/settings
#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Active system settings", body = Vec<SystemSetting>)
    ),
    tag = "settings",
    security(("cookie_auth" = []))
)]
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    _user: SessionUser,
) -> AppResult<Json<Vec<SystemSetting>>> {
    let settings = sqlx::query_as::<_, SystemSetting>(
        "SELECT * FROM system_settings WHERE is_active ORDER BY category, setting_key",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(settings))
}

/// PUT /api/settings/{key} - create or update a setting
#[utoipa::path(
    put,
    path = "/api/settings/{key}",
    params(("key" = String, Path, description = "Setting key")),
    request_body = UpdateSettingInput,
    responses(
        (status = 200, description = "Setting stored", body = SystemSetting),
        (status = 422, description = "Empty key")
    ),
    tag = "settings",
    security(("cookie_auth" = []))
)]
pub async fn put_setting(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(key): Path<String>,
    Json(input): Json<UpdateSettingInput>,
) -> AppResult<Json<SystemSetting>> {
    let key = key.trim();
    if key.is_empty() {
        return Err(AppError::Validation("Setting key cannot be empty".to_string()));
    }

    let setting = sqlx::query_as::<_, SystemSetting>(
        r#"
        INSERT INTO system_settings (id, setting_key, setting_value, description, category, updated_by)
        VALUES ($1, $2, $3, $4, COALESCE($5, 'general'), $6)
        ON CONFLICT (setting_key) DO UPDATE
        SET setting_value = EXCLUDED.setting_value,
            description = COALESCE(EXCLUDED.description, system_settings.description),
            category = COALESCE($5, system_settings.category),
            updated_at = NOW(),
            updated_by = EXCLUDED.updated_by
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(key)
    .bind(&input.value)
    .bind(&input.description)
    .bind(&input.category)
    .bind(&user.username)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, key, "Failed to store setting");
        e
    })?;

    Ok(Json(setting))
}
