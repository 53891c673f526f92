use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    Annual,
    HalfDayAm,
    HalfDayPm,
}

impl LeaveType {
    pub fn db_value(&self) -> &'static str {
        match self {
            LeaveType::Annual => "annual",
            LeaveType::HalfDayAm => "half_day_am",
            LeaveType::HalfDayPm => "half_day_pm",
        }
    }

    pub fn is_half_day(&self) -> bool {
        matches!(self, LeaveType::HalfDayAm | LeaveType::HalfDayPm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn db_value(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
            LeaveStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(LeaveStatus::Pending),
            "approved" => Some(LeaveStatus::Approved),
            "rejected" => Some(LeaveStatus::Rejected),
            "cancelled" => Some(LeaveStatus::Cancelled),
            _ => None,
        }
    }

    /// The workflow state machine. A pending request can be approved or
    /// rejected; an approved request can be cancelled; rejected and
    /// cancelled are terminal.
    pub fn can_transition_to(self, next: LeaveStatus) -> bool {
        matches!(
            (self, next),
            (LeaveStatus::Pending, LeaveStatus::Approved)
                | (LeaveStatus::Pending, LeaveStatus::Rejected)
                | (LeaveStatus::Approved, LeaveStatus::Cancelled)
        )
    }
}

/// A leave application. Created on submission and mutated only by the
/// approve/reject/cancel transitions; rows are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveApplication {
    pub id: i64,
    pub applicant_id: i32,
    pub applicant_name: String,
    #[schema(example = "annual", value_type = String)]
    pub leave_type: String,
    #[schema(example = "2026-08-25", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-08-27", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 3.0)]
    pub days: f64,
    #[schema(value_type = Option<Vec<String>>)]
    pub selected_dates: Option<Vec<NaiveDate>>,
    pub reason: String,
    pub middle_approver: Option<String>,
    pub approver: String,
    #[schema(example = "pending", value_type = String)]
    pub status: String,
    pub applied_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_can_be_decided_either_way() {
        assert!(LeaveStatus::Pending.can_transition_to(LeaveStatus::Approved));
        assert!(LeaveStatus::Pending.can_transition_to(LeaveStatus::Rejected));
        assert!(!LeaveStatus::Pending.can_transition_to(LeaveStatus::Cancelled));
    }

    #[test]
    fn test_only_approved_can_be_cancelled() {
        assert!(LeaveStatus::Approved.can_transition_to(LeaveStatus::Cancelled));
        assert!(!LeaveStatus::Approved.can_transition_to(LeaveStatus::Rejected));
        assert!(!LeaveStatus::Approved.can_transition_to(LeaveStatus::Pending));
    }

    #[test]
    fn test_rejected_and_cancelled_are_terminal() {
        for terminal in [LeaveStatus::Rejected, LeaveStatus::Cancelled] {
            for next in [
                LeaveStatus::Pending,
                LeaveStatus::Approved,
                LeaveStatus::Rejected,
                LeaveStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_round_trips_through_db_value() {
        for status in [
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Cancelled,
        ] {
            assert_eq!(LeaveStatus::parse(status.db_value()), Some(status));
        }
        assert_eq!(LeaveStatus::parse("withdrawn"), None);
    }
}
