use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::require_text;
use crate::error::AppResult;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DesignationModel {
    pub designation_id: i64,
    pub designation_title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DesignationReq {
    #[serde(default)]
    pub designation_title: String,
}

impl DesignationReq {
    pub fn validate(&self) -> AppResult<&str> {
        require_text(&self.designation_title, "designation_title")
    }
}
