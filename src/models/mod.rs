pub mod audit_log;
pub mod category;
pub mod de;
pub mod department;
pub mod designation;
pub mod document;
pub mod employee;
pub mod issuance;
pub mod item;
pub mod report;
pub mod role;
pub mod status;
pub mod stock;
pub mod user;

pub use audit_log::*;
pub use category::*;
pub use department::*;
pub use designation::*;
pub use document::*;
pub use employee::*;
pub use issuance::*;
pub use item::*;
pub use report::*;
pub use role::{Permission, Role};
pub use status::{IssuanceStatus, ItemStatus};
pub use stock::*;
pub use user::*;

use crate::error::{AppError, AppResult};

/// Trims `value` and fails with "`field` is required" when nothing is left.
pub fn require_text<'a>(value: &'a str, field: &str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    Ok(trimmed)
}
