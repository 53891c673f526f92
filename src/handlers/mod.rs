pub mod activities_handler;
pub mod auth_handler;
pub mod dashboard_handler;
pub mod employees_handler;
pub mod health;
pub mod leave_handler;
pub mod metrics;
pub mod settings_handler;

pub use health::health_check;
pub use metrics::{metrics_handler, setup_metrics_recorder, MetricsState};
