use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::de;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StockModel {
    pub stock_id: i64,
    pub item_id: i64,
    pub quantity_in_stock: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStockReq {
    #[serde(deserialize_with = "de::id")]
    pub item_id: i64,
    pub quantity_in_stock: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStockReq {
    pub quantity_in_stock: Option<i32>,
}

pub fn validate_quantity(quantity: Option<i32>) -> AppResult<i32> {
    match quantity {
        None => Err(AppError::InvalidInput("quantity_in_stock is required".into())),
        Some(q) if q < 0 => Err(AppError::InvalidInput(
            "quantity_in_stock cannot be negative".into(),
        )),
        Some(q) => Ok(q),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_rules() {
        assert_eq!(validate_quantity(Some(0)).unwrap(), 0);
        assert!(validate_quantity(Some(-1)).is_err());
        assert!(validate_quantity(None).is_err());
    }
}
