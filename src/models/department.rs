use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::require_text;
use crate::error::AppResult;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DepartmentModel {
    pub department_id: i64,
    pub department_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentReq {
    #[serde(default)]
    pub department_name: String,
}

impl DepartmentReq {
    pub fn validate(&self) -> AppResult<&str> {
        require_text(&self.department_name, "department_name")
    }
}
