pub mod policy;

pub use policy::{annual_leave_entitlement, cancel_eligibility, may_decide, requested_days, CancelActor};
