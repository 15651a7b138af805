use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{de, require_text};
use crate::error::AppResult;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmployeeModel {
    pub employee_id: i64,
    pub employee_name: String,
    pub department_id: Option<String>,
    pub designation_id: Option<String>,
}

/// Department and designation are free text; numeric ids are stored as text.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeReq {
    #[serde(default)]
    pub employee_name: String,
    #[serde(default, deserialize_with = "de::text")]
    pub department_id: String,
    #[serde(default, deserialize_with = "de::text")]
    pub designation_id: String,
}

impl EmployeeReq {
    pub fn validate(&self) -> AppResult<()> {
        require_text(&self.employee_name, "employee_name")?;
        require_text(&self.department_id, "department_id")?;
        require_text(&self.designation_id, "designation_id")?;
        Ok(())
    }
}
