use sqlx::PgPool;

/// One-shot schema bootstrap. Creates every table the service uses if it
/// does not exist yet and seeds the employee reference data on first run.
pub async fn ensure_schema(db: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_sessions (
            id UUID PRIMARY KEY,
            user_id TEXT NOT NULL,
            username TEXT NOT NULL,
            email TEXT,
            access_token TEXT NOT NULL,
            refresh_token TEXT,
            user_attributes JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            expires_at TIMESTAMPTZ NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            user_agent TEXT,
            ip_address TEXT,
            login_method TEXT NOT NULL DEFAULT 'cognito'
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS login_history (
            id UUID PRIMARY KEY,
            user_id TEXT NOT NULL,
            username TEXT NOT NULL,
            login_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            logout_time TIMESTAMPTZ,
            success BOOLEAN NOT NULL DEFAULT TRUE,
            failure_reason TEXT,
            ip_address TEXT,
            user_agent TEXT
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_activities (
            id UUID PRIMARY KEY,
            session_id UUID NOT NULL,
            user_id TEXT NOT NULL,
            activity_type TEXT NOT NULL,
            activity_detail JSONB NOT NULL DEFAULT '{}'::jsonb,
            page_path TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            ip_address TEXT,
            user_agent TEXT
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS system_settings (
            id UUID PRIMARY KEY,
            setting_key TEXT NOT NULL UNIQUE,
            setting_value JSONB NOT NULL,
            description TEXT,
            category TEXT NOT NULL DEFAULT 'general',
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_by TEXT
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            position TEXT NOT NULL,
            department TEXT NOT NULL,
            join_date DATE NOT NULL
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leave_applications (
            id BIGSERIAL PRIMARY KEY,
            applicant_id INTEGER NOT NULL REFERENCES employees(id),
            applicant_name TEXT NOT NULL,
            leave_type TEXT NOT NULL,
            start_date DATE NOT NULL,
            end_date DATE NOT NULL,
            days DOUBLE PRECISION NOT NULL,
            selected_dates DATE[],
            reason TEXT NOT NULL,
            middle_approver TEXT,
            approver TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            processed_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_login_history_username ON login_history (username, login_time DESC)",
    )
    .execute(db)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_leave_applications_applicant ON leave_applications (applicant_id, applied_at DESC)",
    )
    .execute(db)
    .await?;

    seed_employees(db).await?;

    Ok(())
}

/// Seed the static employee directory on an empty database so the leave
/// workflow is usable out of the box.
async fn seed_employees(db: &PgPool) -> Result<(), sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(db)
        .await?;

    if count > 0 {
        return Ok(());
    }

    tracing::info!("Seeding employee reference data");

    let employees: [(i32, &str, &str, &str, &str); 5] = [
        (1, "Dana Kim", "Associate", "Engineering", "2020-03-15"),
        (2, "Morgan Park", "Team Lead", "Engineering", "2017-06-01"),
        (3, "Lee Harper", "Director", "Engineering", "2012-01-09"),
        (4, "Sam Choi", "Deputy Manager", "People Ops", "2018-11-20"),
        (5, "Jun Chung", "Associate", "Marketing", "2023-02-13"),
    ];

    for (id, name, position, department, join_date) in employees {
        sqlx::query(
            r#"
            INSERT INTO employees (id, name, position, department, join_date)
            VALUES ($1, $2, $3, $4, $5::date)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(position)
        .bind(department)
        .bind(join_date)
        .execute(db)
        .await?;
    }

    Ok(())
}
