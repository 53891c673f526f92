use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{extractors::SessionUser, models::Employee, AppResult, AppState};

/// GET /api/employees
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "Employee directory", body = Vec<Employee>)
    ),
    tag = "employees",
    security(("cookie_auth" = []))
)]
pub async fn get_employees(
    State(state): State<Arc<AppState>>,
    _user: SessionUser,
) -> AppResult<Json<Vec<Employee>>> {
    let employees = sqlx::query_as::<_, Employee>(
        "SELECT * FROM employees ORDER BY id",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(employees))
}
