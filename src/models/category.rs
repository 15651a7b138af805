use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::require_text;
use crate::error::AppResult;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategoryModel {
    pub category_id: i64,
    pub category_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryReq {
    #[serde(default)]
    pub category_name: String,
}

impl CategoryReq {
    pub fn validate(&self) -> AppResult<&str> {
        require_text(&self.category_name, "category_name")
    }
}
