use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::leave::LeaveType;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLeaveInput {
    #[schema(example = 1)]
    pub applicant_id: i32,
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-08-25", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-08-27", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Explicit date picks. When present the day count is the size of this
    /// set rather than the start..=end range.
    #[schema(value_type = Option<Vec<String>>)]
    pub selected_dates: Option<Vec<NaiveDate>>,
    #[schema(example = "Family trip")]
    pub reason: String,
    pub middle_approver: Option<String>,
    #[schema(example = "Morgan Park")]
    pub approver: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveMutationResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

/// Derived on demand from the employee's join date and their application
/// history; never stored.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct VacationBalance {
    #[schema(example = 18)]
    pub total: u32,
    #[schema(example = 3.5)]
    pub used: f64,
    #[schema(example = 14.5)]
    pub remaining: f64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct LeaveSummaryEntry {
    /// Month in YYYY-MM form.
    #[schema(example = "2026-08")]
    pub month: String,
    #[schema(example = 4.5)]
    pub days: f64,
}
