use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::de;
use super::status::IssuanceStatus;
use crate::error::{AppError, AppResult};

/// Select list and joins shared by every issuance log listing.
pub const LOG_SELECT: &str = "SELECT il.log_id, il.item_id, il.employee_id, il.issue_date, il.return_date, \
     il.status, il.issued_by_user_id, i.serial_number, i.brand, i.model, e.employee_name, \
     e.department_id, d.department_name, u.username AS issued_by_username \
     FROM issuance_logs il \
     LEFT JOIN items i ON il.item_id = i.item_id \
     LEFT JOIN employees e ON il.employee_id = e.employee_id \
     LEFT JOIN departments d ON e.department_id = CAST(d.department_id AS CHAR) \
     LEFT JOIN users u ON il.issued_by_user_id = u.user_id";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct IssuanceLogModel {
    pub log_id: i64,
    pub item_id: i64,
    pub employee_id: i64,
    pub issue_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub status: IssuanceStatus,
    pub issued_by_user_id: Option<i64>,
    pub serial_number: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub employee_name: Option<String>,
    pub department_id: Option<String>,
    pub department_name: Option<String>,
    pub issued_by_username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueReq {
    #[serde(deserialize_with = "de::id")]
    pub item_id: i64,
    #[serde(deserialize_with = "de::id")]
    pub employee_id: i64,
    #[serde(deserialize_with = "de::date")]
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub status: Option<String>,
}

impl IssueReq {
    pub fn validate(&self) -> AppResult<()> {
        expect_status(self.status.as_deref(), IssuanceStatus::Issued)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuePeripheralsReq {
    #[serde(default, deserialize_with = "de::ids")]
    pub item_ids: Vec<i64>,
    #[serde(deserialize_with = "de::id")]
    pub employee_id: i64,
    #[serde(deserialize_with = "de::date")]
    pub issue_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiveReq {
    #[serde(deserialize_with = "de::id")]
    pub log_id: i64,
    #[serde(deserialize_with = "de::date")]
    pub return_date: NaiveDate,
    #[serde(default)]
    pub status: Option<String>,
}

impl ReceiveReq {
    pub fn validate(&self) -> AppResult<()> {
        expect_status(self.status.as_deref(), IssuanceStatus::Returned)
    }
}

fn expect_status(given: Option<&str>, expected: IssuanceStatus) -> AppResult<()> {
    match given {
        None => Ok(()),
        Some(s) if s == expected.as_str() => Ok(()),
        Some(s) => Err(AppError::InvalidInput(format!(
            "status must be '{}', got '{}'",
            expected, s
        ))),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsQuery {
    #[serde(default, deserialize_with = "de::optional_date")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::optional_date")]
    pub to: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_status_must_be_issued() {
        let ok: IssueReq = serde_json::from_str(
            r#"{"item_id":3,"employee_id":"5","issue_date":"2024-01-15","status":"Issued"}"#,
        )
        .unwrap();
        ok.validate().unwrap();

        let bad: IssueReq = serde_json::from_str(
            r#"{"item_id":3,"employee_id":5,"issue_date":"2024-01-15","status":"Returned"}"#,
        )
        .unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_receive_without_status_is_fine() {
        let req: ReceiveReq =
            serde_json::from_str(r#"{"log_id":"11","return_date":"2024-02-01"}"#).unwrap();
        req.validate().unwrap();
        assert_eq!(req.log_id, 11);
    }

    #[test]
    fn test_peripheral_ids_accept_strings() {
        let req: IssuePeripheralsReq = serde_json::from_str(
            r#"{"item_ids":[1,"2"],"employee_id":5,"issue_date":"2024-01-15"}"#,
        )
        .unwrap();
        assert_eq!(req.item_ids, vec![1, 2]);
    }
}
