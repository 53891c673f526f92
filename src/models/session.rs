use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Server-side session row. The signed token handed to the client only
/// carries the row id; everything else, tokens included, stays here.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: String,
    pub username: String,
    pub email: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user_attributes: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub login_method: String,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Preferred display name for the signed-in user: the `name` attribute
    /// when the pool provides one, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.user_attributes
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LoginHistoryEntry {
    pub id: Uuid,
    pub user_id: String,
    pub username: String,
    pub login_time: DateTime<Utc>,
    pub logout_time: Option<DateTime<Utc>>,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserActivity {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: String,
    pub activity_type: String,
    #[schema(value_type = Object)]
    pub activity_detail: serde_json::Value,
    pub page_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SystemSetting {
    pub id: Uuid,
    pub setting_key: String,
    #[schema(value_type = Object)]
    pub setting_value: serde_json::Value,
    pub description: Option<String>,
    pub category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}
