use chrono::NaiveDate;
use sqlx::{MySql, MySqlPool, QueryBuilder, Transaction};

use super::{IssuanceStore, LogState, NewIssuanceLog};
use crate::error::{AppError, AppResult};
use crate::models::{AuditEntry, IssuanceStatus, ItemStatus};

/// Issuance store backed by one MySQL transaction.
///
/// Nothing is persisted until [`commit`](Self::commit); dropping the store
/// rolls the transaction back.
pub struct MySqlIssuanceStore {
    tx: Transaction<'static, MySql>,
}

impl MySqlIssuanceStore {
    pub async fn begin(pool: &MySqlPool) -> AppResult<Self> {
        Ok(Self {
            tx: pool.begin().await?,
        })
    }

    pub async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

fn push_id_list(qb: &mut QueryBuilder<'_, MySql>, ids: &[i64]) {
    qb.push("(");
    let mut list = qb.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    list.push_unseparated(")");
}

impl IssuanceStore for MySqlIssuanceStore {
    async fn lock_items(&mut self, item_ids: &[i64]) -> AppResult<Vec<(i64, ItemStatus)>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<MySql>::new("SELECT item_id, status FROM items WHERE item_id IN ");
        push_id_list(&mut qb, item_ids);
        qb.push(" FOR UPDATE");

        let rows: Vec<(i64, String)> = qb.build_query_as().fetch_all(&mut *self.tx).await?;
        rows.into_iter()
            .map(|(id, status)| {
                status
                    .parse::<ItemStatus>()
                    .map(|s| (id, s))
                    .map_err(|e| AppError::Internal(e.to_string()))
            })
            .collect()
    }

    async fn employee_exists(&mut self, employee_id: i64) -> AppResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT employee_id FROM employees WHERE employee_id = ?")
                .bind(employee_id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(found.is_some())
    }

    async fn set_item_status(&mut self, item_ids: &[i64], status: ItemStatus) -> AppResult<()> {
        if item_ids.is_empty() {
            return Ok(());
        }
        let mut qb = QueryBuilder::<MySql>::new("UPDATE items SET status = ");
        qb.push_bind(status.as_str());
        qb.push(" WHERE item_id IN ");
        push_id_list(&mut qb, item_ids);
        qb.build().execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn insert_log(&mut self, log: &NewIssuanceLog) -> AppResult<i64> {
        let result = sqlx::query(
            "INSERT INTO issuance_logs (item_id, employee_id, issue_date, status, issued_by_user_id) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(log.item_id)
        .bind(log.employee_id)
        .bind(log.issue_date)
        .bind(IssuanceStatus::Issued.as_str())
        .bind(log.issued_by_user_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.last_insert_id() as i64)
    }

    async fn lock_log(&mut self, log_id: i64) -> AppResult<Option<LogState>> {
        let row: Option<(i64, i64, NaiveDate, Option<NaiveDate>, String)> = sqlx::query_as(
            "SELECT log_id, item_id, issue_date, return_date, status \
             FROM issuance_logs WHERE log_id = ? FOR UPDATE",
        )
        .bind(log_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|(log_id, item_id, issue_date, return_date, status)| {
            let status = status
                .parse::<IssuanceStatus>()
                .map_err(|e| AppError::Internal(e.to_string()))?;
            Ok(LogState {
                log_id,
                item_id,
                issue_date,
                return_date,
                status,
            })
        })
        .transpose()
    }

    async fn close_log(&mut self, log_id: i64, return_date: NaiveDate) -> AppResult<()> {
        sqlx::query("UPDATE issuance_logs SET return_date = ?, status = ? WHERE log_id = ?")
            .bind(return_date)
            .bind(IssuanceStatus::Returned.as_str())
            .bind(log_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn record_audit(&mut self, entry: &AuditEntry) -> AppResult<()> {
        crate::services::audit_log_service::insert(&mut *self.tx, entry).await?;
        Ok(())
    }
}
