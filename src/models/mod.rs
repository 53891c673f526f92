pub mod employee;
pub mod leave;
pub mod leave_input;
pub mod session;

pub use employee::Employee;
pub use leave::{LeaveApplication, LeaveStatus, LeaveType};
pub use leave_input::{CreateLeaveInput, LeaveMutationResponse, LeaveSummaryEntry, VacationBalance};
pub use session::{LoginHistoryEntry, SessionRecord, SystemSetting, UserActivity};
