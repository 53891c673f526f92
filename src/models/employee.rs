use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Employee {
    pub id: i32,
    pub name: String,
    pub position: String,
    pub department: String,
    #[schema(example = "2020-03-15", format = "date", value_type = String)]
    pub join_date: NaiveDate,
}
