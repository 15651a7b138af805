use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::de;
use super::status::ItemStatus;
use super::require_text;
use crate::error::{AppError, AppResult};

/// Categories whose items count as peripherals for bulk issuance.
pub const PERIPHERAL_CATEGORIES: &[&str] = &[
    "Mouse",
    "Keyboard",
    "Speaker",
    "Monitor",
    "Headphone",
    "Webcam",
    "Microphone",
    "Printer",
    "Scanner",
    "USB Drive",
    "External Hard Drive",
    "Network Cable",
    "Power Cable",
    "Adapter",
];

/// Column list matching [`ItemModel`], for queries that alias `items` as `i`.
pub const ITEM_COLUMNS: &str = "i.item_id, i.category_id, c.category_name, i.serial_number, \
     i.brand, i.model, i.specifications, i.vendor, i.date_of_purchase, i.warranty_end_date, i.status";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ItemModel {
    pub item_id: i64,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub serial_number: String,
    pub brand: String,
    pub model: String,
    pub specifications: Option<String>,
    pub vendor: Option<String>,
    pub date_of_purchase: Option<NaiveDate>,
    pub warranty_end_date: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub status: ItemStatus,
}

/// Body of item create and update requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemReq {
    #[serde(deserialize_with = "de::id")]
    pub category_id: i64,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub specifications: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default, deserialize_with = "de::optional_date")]
    pub date_of_purchase: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::optional_date")]
    pub warranty_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<ItemStatus>,
}

impl ItemReq {
    pub fn validate(&self) -> AppResult<()> {
        require_text(&self.serial_number, "serial_number")?;
        require_text(&self.brand, "brand")?;
        require_text(&self.model, "model")?;
        if self.date_of_purchase.is_none() {
            return Err(AppError::InvalidInput("date_of_purchase is required".into()));
        }
        if let (Some(bought), Some(warranty)) = (self.date_of_purchase, self.warranty_end_date) {
            if warranty < bought {
                return Err(AppError::InvalidInput(
                    "warranty_end_date cannot be before date_of_purchase".into(),
                ));
            }
        }
        Ok(())
    }

    /// Status for a newly created item. New items cannot start out issued.
    pub fn initial_status(&self) -> AppResult<ItemStatus> {
        match self.status.unwrap_or(ItemStatus::InStock) {
            ItemStatus::Issued => Err(AppError::InvalidInput(
                "New items cannot be created as Issued; use the issuance workflow".into(),
            )),
            status => Ok(status),
        }
    }

    pub fn specifications(&self) -> Option<&str> {
        self.specifications.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref().filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(json: &str) -> ItemReq {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_valid_item() {
        let item = req(
            r#"{"category_id":"2","serial_number":"SN-1","brand":"Dell","model":"Latitude",
                "date_of_purchase":"2024-01-10","warranty_end_date":"2027-01-10","vendor":""}"#,
        );
        item.validate().unwrap();
        assert_eq!(item.category_id, 2);
        assert_eq!(item.initial_status().unwrap(), ItemStatus::InStock);
        assert_eq!(item.vendor(), None);
    }

    #[test]
    fn test_missing_serial_rejected() {
        let item = req(r#"{"category_id":1,"brand":"HP","model":"X","date_of_purchase":"2024-01-10"}"#);
        let err = item.validate().unwrap_err();
        assert_eq!(err.to_string(), "serial_number is required");
    }

    #[test]
    fn test_missing_purchase_date_rejected() {
        let item = req(r#"{"category_id":1,"serial_number":"S","brand":"HP","model":"X"}"#);
        assert!(item.validate().is_err());
    }

    #[test]
    fn test_warranty_before_purchase_rejected() {
        let item = req(
            r#"{"category_id":1,"serial_number":"S","brand":"HP","model":"X",
                "date_of_purchase":"2024-05-01","warranty_end_date":"2024-04-01"}"#,
        );
        assert!(item.validate().is_err());
    }

    #[test]
    fn test_cannot_create_issued() {
        let item = req(
            r#"{"category_id":1,"serial_number":"S","brand":"HP","model":"X",
                "date_of_purchase":"2024-05-01","status":"Issued"}"#,
        );
        assert!(item.initial_status().is_err());
    }
}
