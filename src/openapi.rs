use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::Modify;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LeaveDesk API",
        version = "1.0.0",
        description = "Backend API for the LeaveDesk leave-tracking and admin console service",
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // Health
        crate::handlers::health::health_check,

        // Auth
        crate::handlers::auth_handler::sign_in,
        crate::handlers::auth_handler::sign_up,
        crate::handlers::auth_handler::confirm_sign_up,
        crate::handlers::auth_handler::resend_confirmation,
        crate::handlers::auth_handler::get_me,
        crate::handlers::auth_handler::session_status,
        crate::handlers::auth_handler::refresh_session,
        crate::handlers::auth_handler::extend_session,
        crate::handlers::auth_handler::sign_out,

        // Dashboard
        crate::handlers::dashboard_handler::get_dashboard,

        // Employees
        crate::handlers::employees_handler::get_employees,

        // Leave
        crate::handlers::leave_handler::create_leave,
        crate::handlers::leave_handler::list_leaves,
        crate::handlers::leave_handler::pending_queue,
        crate::handlers::leave_handler::get_leave,
        crate::handlers::leave_handler::approve_leave,
        crate::handlers::leave_handler::reject_leave,
        crate::handlers::leave_handler::cancel_leave,
        crate::handlers::leave_handler::get_balance,
        crate::handlers::leave_handler::monthly_summary,

        // Activities / audit
        crate::handlers::activities_handler::get_activities,
        crate::handlers::activities_handler::get_login_history,

        // Settings
        crate::handlers::settings_handler::get_settings,
        crate::handlers::settings_handler::put_setting,
    ),
    components(
        schemas(
            // Core models
            crate::models::Employee,
            crate::models::LeaveApplication,
            crate::models::LeaveType,
            crate::models::LeaveStatus,
            crate::models::UserActivity,
            crate::models::LoginHistoryEntry,
            crate::models::SystemSetting,

            // Input / response models
            crate::models::CreateLeaveInput,
            crate::models::LeaveMutationResponse,
            crate::models::VacationBalance,
            crate::models::LeaveSummaryEntry,
            crate::leave::CancelActor,
            crate::handlers::auth_handler::SignInRequest,
            crate::handlers::auth_handler::SignInResponse,
            crate::handlers::auth_handler::SignUpRequest,
            crate::handlers::auth_handler::SignUpResponse,
            crate::handlers::auth_handler::ConfirmSignUpRequest,
            crate::handlers::auth_handler::ResendConfirmationRequest,
            crate::handlers::auth_handler::MessageResponse,
            crate::handlers::auth_handler::SessionStatusResponse,
            crate::handlers::auth_handler::ExtendSessionResponse,
            crate::handlers::dashboard_handler::DashboardResponse,
            crate::handlers::settings_handler::UpdateSettingInput,
        )
    ),
    tags(
        (name = "health", description = "Health check"),
        (name = "auth", description = "Cognito-backed authentication and sessions"),
        (name = "dashboard", description = "Admin console aggregates"),
        (name = "employees", description = "Employee reference data"),
        (name = "leave", description = "Leave requests and the approval workflow"),
        (name = "activities", description = "Audit trail"),
        (name = "settings", description = "System settings"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("ld_session"))),
            )
        }
    }
}
