//! Leave policy rules: entitlement accrual, requested-day counting and the
//! cancellation/approval gates. Everything here is a pure function of its
//! inputs; callers pass "today" in so the rules stay clock-free.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;
use utoipa::ToSchema;

use crate::models::{LeaveApplication, LeaveStatus, LeaveType};

/// Annual leave entitlement in days for an employee who joined on
/// `join_date`, evaluated against `today`.
///
/// Statutory ladder: under one year of tenure grants 11 days, one to three
/// years grants 15, and from the third year on one extra day accrues per
/// year of tenure beyond the second, capped at 25.
pub fn annual_leave_entitlement(join_date: NaiveDate, today: NaiveDate) -> u32 {
    let tenure_years = (today - join_date).num_days() / 365;

    if tenure_years < 1 {
        11
    } else if tenure_years < 3 {
        15
    } else {
        (15 + (tenure_years - 2)).min(25) as u32
    }
}

/// Number of leave days a request consumes.
///
/// Half-day variants always count 0.5 regardless of the date range. An
/// explicit selected-date set overrides the range: the count is the set's
/// cardinality. Otherwise the inclusive span start..=end is counted.
pub fn requested_days(
    start_date: NaiveDate,
    end_date: NaiveDate,
    leave_type: LeaveType,
    selected_dates: Option<&[NaiveDate]>,
) -> f64 {
    if leave_type.is_half_day() {
        return 0.5;
    }

    if let Some(dates) = selected_dates {
        if !dates.is_empty() {
            let unique: BTreeSet<NaiveDate> = dates.iter().copied().collect();
            return unique.len() as f64;
        }
    }

    ((end_date - start_date).num_days() + 1) as f64
}

/// Who is allowed to cancel an approved application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CancelActor {
    /// The applicant themselves, up to the day before the leave starts.
    Applicant,
    /// A named approver, from the start date onward.
    Approver,
}

/// Cancellation gate. Only `approved` applications are cancellable at all.
/// Through the day before the start date the applicant may cancel; from the
/// start date on, only the approver or middle approver may.
///
/// Actors are matched by display name, as the rest of the approval flow
/// does.
pub fn cancel_eligibility(
    application: &LeaveApplication,
    actor: &str,
    today: NaiveDate,
) -> Option<CancelActor> {
    if LeaveStatus::parse(&application.status) != Some(LeaveStatus::Approved) {
        return None;
    }

    let day_before = application.start_date.checked_sub_days(Days::new(1))?;

    if today <= day_before && application.applicant_name == actor {
        return Some(CancelActor::Applicant);
    }

    if today > day_before && is_named_approver(application, actor) {
        return Some(CancelActor::Approver);
    }

    None
}

/// Whether `actor` may decide (approve or reject) a pending application.
pub fn may_decide(application: &LeaveApplication, actor: &str) -> bool {
    is_named_approver(application, actor)
}

fn is_named_approver(application: &LeaveApplication, actor: &str) -> bool {
    application.approver == actor
        || application.middle_approver.as_deref() == Some(actor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn application(
        status: &str,
        start: NaiveDate,
        applicant: &str,
        approver: &str,
        middle: Option<&str>,
    ) -> LeaveApplication {
        LeaveApplication {
            id: 1,
            applicant_id: 1,
            applicant_name: applicant.to_string(),
            leave_type: "annual".to_string(),
            start_date: start,
            end_date: start,
            days: 1.0,
            selected_dates: None,
            reason: "personal".to_string(),
            middle_approver: middle.map(|s| s.to_string()),
            approver: approver.to_string(),
            status: status.to_string(),
            applied_at: DateTime::<Utc>::MIN_UTC,
            processed_at: None,
        }
    }

    #[test]
    fn test_entitlement_under_one_year() {
        let today = date(2026, 8, 4);
        assert_eq!(annual_leave_entitlement(date(2026, 1, 1), today), 11);
        assert_eq!(annual_leave_entitlement(date(2025, 8, 10), today), 11);
    }

    #[test]
    fn test_entitlement_one_to_three_years() {
        let today = date(2026, 8, 4);
        assert_eq!(annual_leave_entitlement(date(2025, 8, 1), today), 15);
        assert_eq!(annual_leave_entitlement(date(2024, 1, 1), today), 15);
    }

    #[test]
    fn test_entitlement_three_years_and_up() {
        let today = date(2026, 8, 4);
        // 3 full years -> 15 + (3 - 2) = 16
        assert_eq!(annual_leave_entitlement(date(2023, 8, 1), today), 16);
        // 10 years -> 15 + 8 = 23
        assert_eq!(annual_leave_entitlement(date(2016, 8, 1), today), 23);
    }

    #[test]
    fn test_entitlement_caps_at_25() {
        let today = date(2026, 8, 4);
        assert_eq!(annual_leave_entitlement(date(2014, 1, 1), today), 25);
        assert_eq!(annual_leave_entitlement(date(1990, 1, 1), today), 25);
    }

    #[test]
    fn test_entitlement_monotonic_in_tenure() {
        let today = date(2026, 8, 4);
        let mut previous = 0;
        // Walk tenure from 0 to 20 years; entitlement never decreases.
        for years in 0..=20 {
            let join = date(2026 - years, 1, 1);
            let entitlement = annual_leave_entitlement(join, today);
            assert!(entitlement >= previous, "entitlement dipped at {} years", years);
            assert!(entitlement <= 25);
            previous = entitlement;
        }
    }

    #[test]
    fn test_entitlement_example_scenario() {
        // Joined 2020-03-15, evaluated 2025-08-20: five full years of
        // tenure, so 15 + 3 = 18 days.
        assert_eq!(
            annual_leave_entitlement(date(2020, 3, 15), date(2025, 8, 20)),
            18
        );
    }

    #[test]
    fn test_half_day_is_half_regardless_of_range() {
        let start = date(2026, 8, 10);
        let end = date(2026, 8, 21);
        assert_eq!(requested_days(start, end, LeaveType::HalfDayAm, None), 0.5);
        assert_eq!(requested_days(start, end, LeaveType::HalfDayPm, None), 0.5);
    }

    #[test]
    fn test_range_count_is_inclusive() {
        let start = date(2026, 8, 10);
        assert_eq!(requested_days(start, start, LeaveType::Annual, None), 1.0);
        assert_eq!(
            requested_days(start, date(2026, 8, 14), LeaveType::Annual, None),
            5.0
        );
    }

    #[test]
    fn test_selected_dates_override_range() {
        let start = date(2026, 8, 1);
        let end = date(2026, 8, 31);
        let picks = [date(2026, 8, 3), date(2026, 8, 17), date(2026, 8, 24)];
        assert_eq!(
            requested_days(start, end, LeaveType::Annual, Some(&picks)),
            3.0
        );
    }

    #[test]
    fn test_selected_dates_deduplicate() {
        let day = date(2026, 8, 3);
        let picks = [day, day, date(2026, 8, 4)];
        assert_eq!(
            requested_days(day, date(2026, 8, 4), LeaveType::Annual, Some(&picks)),
            2.0
        );
    }

    #[test]
    fn test_empty_selected_dates_fall_back_to_range() {
        let start = date(2026, 8, 10);
        let picks: [NaiveDate; 0] = [];
        assert_eq!(
            requested_days(start, date(2026, 8, 11), LeaveType::Annual, Some(&picks)),
            2.0
        );
    }

    #[test]
    fn test_applicant_can_cancel_before_start() {
        let today = date(2026, 8, 4);
        let app = application("approved", date(2026, 8, 5), "Dana Kim", "Morgan Park", None);
        assert_eq!(
            cancel_eligibility(&app, "Dana Kim", today),
            Some(CancelActor::Applicant)
        );
        // The approver gets no self-service cancel window before the start.
        assert_eq!(cancel_eligibility(&app, "Morgan Park", today), None);
    }

    #[test]
    fn test_only_approver_can_cancel_from_start_date() {
        let today = date(2026, 8, 4);
        let app = application("approved", today, "Dana Kim", "Morgan Park", None);
        assert_eq!(cancel_eligibility(&app, "Dana Kim", today), None);
        assert_eq!(
            cancel_eligibility(&app, "Morgan Park", today),
            Some(CancelActor::Approver)
        );
    }

    #[test]
    fn test_middle_approver_can_cancel_from_start_date() {
        let today = date(2026, 8, 4);
        let app = application(
            "approved",
            date(2026, 8, 1),
            "Dana Kim",
            "Morgan Park",
            Some("Lee Harper"),
        );
        assert_eq!(
            cancel_eligibility(&app, "Lee Harper", today),
            Some(CancelActor::Approver)
        );
        assert_eq!(cancel_eligibility(&app, "Sam Choi", today), None);
    }

    #[test]
    fn test_non_approved_statuses_are_not_cancellable() {
        let today = date(2026, 8, 4);
        for status in ["pending", "rejected", "cancelled"] {
            let app = application(status, date(2026, 8, 10), "Dana Kim", "Morgan Park", None);
            assert_eq!(cancel_eligibility(&app, "Dana Kim", today), None);
            assert_eq!(cancel_eligibility(&app, "Morgan Park", today), None);
        }
    }

    #[test]
    fn test_may_decide_matches_named_approvers_only() {
        let app = application(
            "pending",
            date(2026, 8, 10),
            "Dana Kim",
            "Morgan Park",
            Some("Lee Harper"),
        );
        assert!(may_decide(&app, "Morgan Park"));
        assert!(may_decide(&app, "Lee Harper"));
        assert!(!may_decide(&app, "Dana Kim"));
        assert!(!may_decide(&app, "Jun Chung"));
    }
}
