use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    response::Html,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

use crate::{handlers, openapi::ApiDoc};

pub fn build_router(state: Arc<crate::AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true);

    // Auth routes
    let auth_routes = Router::new()
        .route("/sign-in", post(handlers::auth_handler::sign_in))
        .route("/sign-up", post(handlers::auth_handler::sign_up))
        .route("/confirm", post(handlers::auth_handler::confirm_sign_up))
        .route("/resend-confirmation", post(handlers::auth_handler::resend_confirmation))
        .route("/me", get(handlers::auth_handler::get_me))
        .route("/session", get(handlers::auth_handler::session_status))
        .route("/refresh", post(handlers::auth_handler::refresh_session))
        .route("/extend", post(handlers::auth_handler::extend_session))
        .route("/sign-out", post(handlers::auth_handler::sign_out));

    // Leave routes
    let leave_routes = Router::new()
        .route("/", post(handlers::leave_handler::create_leave))
        .route("/", get(handlers::leave_handler::list_leaves))
        // Literal segments must come before /{id} to prevent route shadowing
        .route("/pending", get(handlers::leave_handler::pending_queue))
        .route("/balance", get(handlers::leave_handler::get_balance))
        .route("/summary", get(handlers::leave_handler::monthly_summary))
        .route("/{id}", get(handlers::leave_handler::get_leave))
        .route("/{id}/approve", post(handlers::leave_handler::approve_leave))
        .route("/{id}/reject", post(handlers::leave_handler::reject_leave))
        .route("/{id}/cancel", post(handlers::leave_handler::cancel_leave));

    // Settings routes
    let settings_routes = Router::new()
        .route("/", get(handlers::settings_handler::get_settings))
        .route("/{key}", put(handlers::settings_handler::put_setting));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .nest("/api/auth", auth_routes)
        .route("/api/dashboard", get(handlers::dashboard_handler::get_dashboard))
        .route("/api/employees", get(handlers::employees_handler::get_employees))
        .nest("/api/leave", leave_routes)
        .route("/api/activities", get(handlers::activities_handler::get_activities))
        .route("/api/login-history", get(handlers::activities_handler::get_login_history))
        .nest("/api/settings", settings_routes)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/swagger-ui", get(swagger_ui))
        .layer(middleware::from_fn(crate::middleware::metrics_middleware))
        .layer(middleware::from_fn(crate::middleware::request_id_middleware))
        .layer(cors)
        .with_state(state)
}

async fn swagger_ui() -> Html<&'static str> {
    Html(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>LeaveDesk API</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {
            SwaggerUIBundle({
                url: '/api-docs/openapi.json',
                dom_id: '#swagger-ui',
                deepLinking: true,
            });
        };
    </script>
</body>
</html>
"#)
}
