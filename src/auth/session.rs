use chrono::{DateTime, Duration, Utc};
use moka::future::Cache;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::SessionRecord;
use crate::{AppError, AppResult};

/// Sliding expiry window for a signed-in session.
pub const SESSION_TTL_HOURS: i64 = 8;

/// Consecutive failed sign-ins before local lockout kicks in.
pub const MAX_LOGIN_ATTEMPTS: i64 = 5;

pub fn is_locked_out(consecutive_failures: i64) -> bool {
    consecutive_failures >= MAX_LOGIN_ATTEMPTS
}

/// Everything needed to open a session after the provider accepted the
/// credentials.
pub struct NewSession {
    pub user_id: String,
    pub username: String,
    pub email: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user_attributes: serde_json::Value,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Server-side session store over the `user_sessions` table, with a moka
/// cache in front of hot lookups. The database row is authoritative; cache
/// entries are dropped on every mutation.
#[derive(Clone)]
pub struct SessionStore {
    db: PgPool,
    cache: Cache<Uuid, SessionRecord>,
}

impl SessionStore {
    pub fn new(db: PgPool, cache: Cache<Uuid, SessionRecord>) -> Self {
        Self { db, cache }
    }

    pub async fn create(&self, new: NewSession) -> AppResult<SessionRecord> {
        let id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);

        let record = sqlx::query_as::<_, SessionRecord>(
            r#"
            INSERT INTO user_sessions (
                id, user_id, username, email, access_token, refresh_token,
                user_attributes, expires_at, user_agent, ip_address
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&new.user_id)
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.access_token)
        .bind(&new.refresh_token)
        .bind(&new.user_attributes)
        .bind(expires_at)
        .bind(&new.user_agent)
        .bind(&new.ip_address)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, username = %new.username, "Failed to create session");
            e
        })?;

        self.cache.insert(id, record.clone()).await;
        tracing::info!(session_id = %id, username = %record.username, "Session created");

        Ok(record)
    }

    /// Load a live session. An expired row is deactivated and evicted as a
    /// side effect, so a stale token can never pass a later check.
    pub async fn fetch_valid(&self, id: Uuid) -> AppResult<Option<SessionRecord>> {
        let now = Utc::now();

        let record = match self.cache.get(&id).await {
            Some(record) => Some(record),
            None => {
                let row = sqlx::query_as::<_, SessionRecord>(
                    "SELECT * FROM user_sessions WHERE id = $1 AND is_active",
                )
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

                if let Some(ref record) = row {
                    self.cache.insert(id, record.clone()).await;
                }
                row
            }
        };

        let Some(record) = record else {
            return Ok(None);
        };

        if !record.is_active {
            self.cache.invalidate(&id).await;
            return Ok(None);
        }

        if record.is_expired(now) {
            tracing::info!(session_id = %id, username = %record.username, "Session expired, deactivating");
            self.revoke(id).await?;
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Slide the expiry window out to now + 8 hours.
    pub async fn extend(&self, id: Uuid) -> AppResult<DateTime<Utc>> {
        let expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);

        let updated = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            UPDATE user_sessions
            SET expires_at = $1, updated_at = NOW()
            WHERE id = $2 AND is_active
            RETURNING expires_at
            "#,
        )
        .bind(expires_at)
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session not found".to_string()))?;

        self.cache.invalidate(&id).await;

        Ok(updated)
    }

    /// Swap in fresh provider tokens after a refresh grant.
    pub async fn update_tokens(
        &self,
        id: Uuid,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE user_sessions
            SET access_token = $1,
                refresh_token = COALESCE($2, refresh_token),
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(access_token)
        .bind(refresh_token)
        .bind(id)
        .execute(&self.db)
        .await?;

        self.cache.invalidate(&id).await;

        Ok(())
    }

    pub async fn revoke(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE user_sessions SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        self.cache.invalidate(&id).await;

        Ok(())
    }

    pub async fn record_login(
        &self,
        user_id: &str,
        username: &str,
        success: bool,
        failure_reason: Option<&str>,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO login_history (id, user_id, username, success, failure_reason, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(username)
        .bind(success)
        .bind(failure_reason)
        .bind(ip_address)
        .bind(user_agent)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Stamp the logout time on the user's most recent successful login.
    pub async fn record_logout(&self, user_id: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE login_history
            SET logout_time = NOW()
            WHERE id = (
                SELECT id FROM login_history
                WHERE user_id = $1 AND success AND logout_time IS NULL
                ORDER BY login_time DESC
                LIMIT 1
            )
            "#,
        )
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Failed sign-ins for a username since its last success. A successful
    /// login resets the streak by inserting a success row.
    pub async fn consecutive_failures(&self, username: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM login_history
            WHERE username = $1
              AND NOT success
              AND login_time > COALESCE(
                  (SELECT MAX(login_time) FROM login_history WHERE username = $1 AND success),
                  'epoch'::timestamptz
              )
            "#,
        )
        .bind(username)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    pub async fn record_activity(
        &self,
        session_id: Uuid,
        user_id: &str,
        activity_type: &str,
        activity_detail: serde_json::Value,
        page_path: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_activities (id, session_id, user_id, activity_type, activity_detail, page_path)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .bind(user_id)
        .bind(activity_type)
        .bind(activity_detail)
        .bind(page_path)
        .execute(&self.db)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id, activity_type, "Failed to record activity");
            e
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lockout_threshold() {
        assert!(!is_locked_out(0));
        assert!(!is_locked_out(4));
        assert!(is_locked_out(5));
        assert!(is_locked_out(12));
    }
}
