use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{
    extractors::SessionUser,
    leave::policy,
    models::{
        CreateLeaveInput, Employee, LeaveApplication, LeaveMutationResponse, LeaveStatus,
        LeaveSummaryEntry, VacationBalance,
    },
    AppError, AppResult, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListLeavesQuery {
    #[serde(rename = "applicantId")]
    pub applicant_id: Option<i32>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    #[serde(rename = "employeeId")]
    pub employee_id: i32,
}

// Helper enum for typed sqlx binding of mixed filter values
enum FilterValue {
    Int(i32),
    Str(String),
}

async fn fetch_employee(db: &PgPool, employee_id: i32) -> AppResult<Employee> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
        .bind(employee_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", employee_id)))
}

async fn fetch_application(db: &PgPool, id: i64) -> AppResult<LeaveApplication> {
    sqlx::query_as::<_, LeaveApplication>("SELECT * FROM leave_applications WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Leave request {} not found", id)))
}

/// Balance derived from the entitlement ladder and the applicant's history.
/// Days of applications cancelled after approval stay counted as used.
// TODO: decide with the product owner whether cancelling an approved
// request should return its days to the balance.
async fn compute_balance(db: &PgPool, employee: &Employee) -> AppResult<VacationBalance> {
    let today = Utc::now().date_naive();
    let total = policy::annual_leave_entitlement(employee.join_date, today);

    let used: f64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(days), 0)
        FROM leave_applications
        WHERE applicant_id = $1 AND status IN ('approved', 'cancelled')
        "#,
    )
    .bind(employee.id)
    .fetch_one(db)
    .await?;

    Ok(VacationBalance {
        total,
        used,
        remaining: f64::from(total) - used,
    })
}

/// POST /api/leave
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = CreateLeaveInput,
    responses(
        (status = 200, description = "Leave request submitted", body = LeaveMutationResponse),
        (status = 400, description = "Bad dates or insufficient balance"),
        (status = 404, description = "Unknown employee"),
        (status = 422, description = "Missing reason or approver")
    ),
    tag = "leave",
    security(("cookie_auth" = []))
)]
pub async fn create_leave(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Json(input): Json<CreateLeaveInput>,
) -> AppResult<Json<LeaveMutationResponse>> {
    if input.reason.trim().is_empty() {
        return Err(AppError::Validation("A reason is required.".to_string()));
    }
    if input.approver.trim().is_empty() {
        return Err(AppError::Validation("An approver is required.".to_string()));
    }

    let mut selected_dates = input.selected_dates.clone().filter(|d| !d.is_empty());
    if let Some(ref mut dates) = selected_dates {
        dates.sort();
        dates.dedup();
    }

    // With explicit date picks the stored range spans the set.
    let (start_date, end_date) = match selected_dates.as_deref() {
        Some([first, .., last]) => (*first, *last),
        Some([only]) => (*only, *only),
        _ => (input.start_date, input.end_date),
    };

    if start_date > end_date {
        return Err(AppError::BadRequest(
            "start_date cannot be after end_date".to_string(),
        ));
    }

    let today = Utc::now().date_naive();
    if start_date < today {
        return Err(AppError::BadRequest(
            "Leave cannot start in the past".to_string(),
        ));
    }

    let employee = fetch_employee(&state.db, input.applicant_id).await?;

    let days = policy::requested_days(
        start_date,
        end_date,
        input.leave_type,
        selected_dates.as_deref(),
    );

    // Soft balance check at submission time only; later transitions do not
    // re-check.
    let balance = compute_balance(&state.db, &employee).await?;
    if days > balance.remaining {
        return Err(AppError::BadRequest(format!(
            "Insufficient leave balance: requested {} days, {} remaining",
            days, balance.remaining
        )));
    }

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO leave_applications (
            applicant_id, applicant_name, leave_type, start_date, end_date,
            days, selected_dates, reason, middle_approver, approver, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending')
        RETURNING id
        "#,
    )
    .bind(employee.id)
    .bind(&employee.name)
    .bind(input.leave_type.db_value())
    .bind(start_date)
    .bind(end_date)
    .bind(days)
    .bind(&selected_dates)
    .bind(input.reason.trim())
    .bind(input.middle_approver.as_deref().map(str::trim))
    .bind(input.approver.trim())
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, applicant_id = employee.id, "Failed to create leave request");
        e
    })?;

    state
        .sessions
        .record_activity(
            user.session_id,
            &user.user_id,
            "leave_submitted",
            json!({ "leave_id": id, "days": days }),
            Some("/api/leave"),
        )
        .await?;

    Ok(Json(LeaveMutationResponse {
        success: true,
        message: "Leave request submitted".to_string(),
        id: Some(id),
    }))
}

/// GET /api/leave?applicantId=&status=
#[utoipa::path(
    get,
    path = "/api/leave",
    params(ListLeavesQuery),
    responses(
        (status = 200, description = "Leave requests, newest first", body = Vec<LeaveApplication>),
        (status = 400, description = "Unknown status filter")
    ),
    tag = "leave",
    security(("cookie_auth" = []))
)]
pub async fn list_leaves(
    State(state): State<Arc<AppState>>,
    _user: SessionUser,
    Query(query): Query<ListLeavesQuery>,
) -> AppResult<Json<Vec<LeaveApplication>>> {
    if let Some(ref status) = query.status {
        if LeaveStatus::parse(status).is_none() {
            return Err(AppError::BadRequest(format!("Unknown status: {}", status)));
        }
    }

    let mut sql = String::from("SELECT * FROM leave_applications WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(applicant_id) = query.applicant_id {
        sql.push_str(&format!(" AND applicant_id = ${}", args.len() + 1));
        args.push(FilterValue::Int(applicant_id));
    }

    if let Some(status) = query.status {
        sql.push_str(&format!(" AND status = ${}", args.len() + 1));
        args.push(FilterValue::Str(status));
    }

    sql.push_str(" ORDER BY applied_at DESC");

    let mut query_builder = sqlx::query_as::<_, LeaveApplication>(&sql);
    for arg in args {
        query_builder = match arg {
            FilterValue::Int(v) => query_builder.bind(v),
            FilterValue::Str(s) => query_builder.bind(s),
        };
    }

    let applications = query_builder.fetch_all(&state.db).await?;

    Ok(Json(applications))
}

/// GET /api/leave/pending - approval queue for the signed-in user
#[utoipa::path(
    get,
    path = "/api/leave/pending",
    responses(
        (status = 200, description = "Pending requests naming the caller as approver", body = Vec<LeaveApplication>)
    ),
    tag = "leave",
    security(("cookie_auth" = []))
)]
pub async fn pending_queue(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
) -> AppResult<Json<Vec<LeaveApplication>>> {
    let applications = sqlx::query_as::<_, LeaveApplication>(
        r#"
        SELECT * FROM leave_applications
        WHERE status = 'pending' AND (approver = $1 OR middle_approver = $1)
        ORDER BY applied_at
        "#,
    )
    .bind(&user.display_name)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(applications))
}

/// GET /api/leave/{id}
#[utoipa::path(
    get,
    path = "/api/leave/{id}",
    params(("id" = i64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveApplication),
        (status = 404, description = "Leave request not found")
    ),
    tag = "leave",
    security(("cookie_auth" = []))
)]
pub async fn get_leave(
    State(state): State<Arc<AppState>>,
    _user: SessionUser,
    Path(id): Path<i64>,
) -> AppResult<Json<LeaveApplication>> {
    let application = fetch_application(&state.db, id).await?;
    Ok(Json(application))
}

async fn decide(
    state: &AppState,
    user: &SessionUser,
    id: i64,
    decision: LeaveStatus,
) -> AppResult<LeaveMutationResponse> {
    let application = fetch_application(&state.db, id).await?;

    if !policy::may_decide(&application, &user.display_name) {
        return Err(AppError::Forbidden(
            "Only the named approver or middle approver may decide this request".to_string(),
        ));
    }

    let current = LeaveStatus::parse(&application.status)
        .ok_or_else(|| AppError::Internal(format!("Corrupt leave status: {}", application.status)))?;
    if !current.can_transition_to(decision) {
        return Err(AppError::Conflict(
            "Leave request not found or already processed".to_string(),
        ));
    }

    // The WHERE clause repeats the state check so a concurrent decision
    // cannot double-apply; zero rows affected leaves the row untouched.
    let result = sqlx::query(
        r#"
        UPDATE leave_applications
        SET status = $1, processed_at = NOW()
        WHERE id = $2 AND status = 'pending'
        "#,
    )
    .bind(decision.db_value())
    .bind(id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id = id, "Leave decision failed");
        e
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Leave request not found or already processed".to_string(),
        ));
    }

    let activity = match decision {
        LeaveStatus::Approved => "leave_approved",
        _ => "leave_rejected",
    };
    state
        .sessions
        .record_activity(
            user.session_id,
            &user.user_id,
            activity,
            json!({ "leave_id": id }),
            None,
        )
        .await?;

    Ok(LeaveMutationResponse {
        success: true,
        message: format!("Leave request {}", decision.db_value()),
        id: Some(id),
    })
}

/// POST /api/leave/{id}/approve
#[utoipa::path(
    post,
    path = "/api/leave/{id}/approve",
    params(("id" = i64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Request approved", body = LeaveMutationResponse),
        (status = 403, description = "Caller is not a named approver"),
        (status = 409, description = "Request is not pending")
    ),
    tag = "leave",
    security(("cookie_auth" = []))
)]
pub async fn approve_leave(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<i64>,
) -> AppResult<Json<LeaveMutationResponse>> {
    let response = decide(&state, &user, id, LeaveStatus::Approved).await?;
    Ok(Json(response))
}

/// POST /api/leave/{id}/reject
#[utoipa::path(
    post,
    path = "/api/leave/{id}/reject",
    params(("id" = i64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Request rejected", body = LeaveMutationResponse),
        (status = 403, description = "Caller is not a named approver"),
        (status = 409, description = "Request is not pending")
    ),
    tag = "leave",
    security(("cookie_auth" = []))
)]
pub async fn reject_leave(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<i64>,
) -> AppResult<Json<LeaveMutationResponse>> {
    let response = decide(&state, &user, id, LeaveStatus::Rejected).await?;
    Ok(Json(response))
}

/// POST /api/leave/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/leave/{id}/cancel",
    params(("id" = i64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Request cancelled", body = LeaveMutationResponse),
        (status = 403, description = "Caller may not cancel this request today"),
        (status = 409, description = "Request is not approved")
    ),
    tag = "leave",
    security(("cookie_auth" = []))
)]
pub async fn cancel_leave(
    State(state): State<Arc<AppState>>,
    user: SessionUser,
    Path(id): Path<i64>,
) -> AppResult<Json<LeaveMutationResponse>> {
    let application = fetch_application(&state.db, id).await?;

    let current = LeaveStatus::parse(&application.status)
        .ok_or_else(|| AppError::Internal(format!("Corrupt leave status: {}", application.status)))?;
    if !current.can_transition_to(LeaveStatus::Cancelled) {
        return Err(AppError::Conflict(
            "Only approved requests can be cancelled".to_string(),
        ));
    }

    let today = Utc::now().date_naive();
    let actor_role = policy::cancel_eligibility(&application, &user.display_name, today)
        .ok_or_else(|| {
            AppError::Forbidden(
                "You are not allowed to cancel this request today. Applicants may cancel up to the day before the start; approvers from the start date on.".to_string(),
            )
        })?;

    let result = sqlx::query(
        r#"
        UPDATE leave_applications
        SET status = 'cancelled', processed_at = NOW()
        WHERE id = $1 AND status = 'approved'
        "#,
    )
    .bind(id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id = id, "Leave cancellation failed");
        e
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Leave request not found or already processed".to_string(),
        ));
    }

    state
        .sessions
        .record_activity(
            user.session_id,
            &user.user_id,
            "leave_cancelled",
            json!({ "leave_id": id, "actor_role": actor_role }),
            None,
        )
        .await?;

    Ok(Json(LeaveMutationResponse {
        success: true,
        message: "Leave request cancelled".to_string(),
        id: Some(id),
    }))
}

/// GET /api/leave/balance?employeeId=
#[utoipa::path(
    get,
    path = "/api/leave/balance",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Derived vacation balance", body = VacationBalance),
        (status = 404, description = "Unknown employee")
    ),
    tag = "leave",
    security(("cookie_auth" = []))
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    _user: SessionUser,
    Query(query): Query<EmployeeQuery>,
) -> AppResult<Json<VacationBalance>> {
    let employee = fetch_employee(&state.db, query.employee_id).await?;
    let balance = compute_balance(&state.db, &employee).await?;

    Ok(Json(balance))
}

/// GET /api/leave/summary?employeeId= - approved days per month
#[utoipa::path(
    get,
    path = "/api/leave/summary",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Approved leave days grouped by month", body = Vec<LeaveSummaryEntry>),
        (status = 404, description = "Unknown employee")
    ),
    tag = "leave",
    security(("cookie_auth" = []))
)]
pub async fn monthly_summary(
    State(state): State<Arc<AppState>>,
    _user: SessionUser,
    Query(query): Query<EmployeeQuery>,
) -> AppResult<Json<Vec<LeaveSummaryEntry>>> {
    fetch_employee(&state.db, query.employee_id).await?;

    let entries = sqlx::query_as::<_, LeaveSummaryEntry>(
        r#"
        SELECT to_char(start_date, 'YYYY-MM') AS month, SUM(days) AS days
        FROM leave_applications
        WHERE applicant_id = $1 AND status = 'approved'
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(query.employee_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}
