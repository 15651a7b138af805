use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::require_text;
use crate::error::AppResult;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLogModel {
    pub audit_id: i64,
    pub user_id: Option<i64>,
    pub item_id: Option<i64>,
    pub action_performed: String,
    pub timestamp: Option<NaiveDateTime>,
}

/// An audit row about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub user_id: Option<i64>,
    pub item_id: Option<i64>,
    pub action_performed: String,
}

impl AuditEntry {
    pub fn new(user_id: i64, item_id: i64, action: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            item_id: Some(item_id),
            action_performed: action.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditLogReq {
    pub user_id: Option<i64>,
    pub item_id: Option<i64>,
    #[serde(default)]
    pub action_performed: String,
}

impl AuditLogReq {
    pub fn validate(&self) -> AppResult<AuditEntry> {
        let action = require_text(&self.action_performed, "action_performed")?;
        Ok(AuditEntry {
            user_id: self.user_id,
            item_id: self.item_id,
            action_performed: action.to_string(),
        })
    }
}
