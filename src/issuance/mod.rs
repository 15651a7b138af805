//! Issuance workflow: checking items out to employees and taking them back.
//!
//! Item status and issuance logs move together:
//!
//! ```text
//! In Stock --issue--> Issued (open log) --return--> In Stock (log Returned)
//! ```
//!
//! The workflow only talks to an [`IssuanceStore`]. The MySQL store runs every
//! call inside one transaction with the touched item rows locked, so a failed
//! check or write leaves nothing behind once the transaction is dropped.

pub mod mysql;

use std::collections::HashSet;
use std::future::Future;

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthenticatedUser;
use crate::models::{AuditEntry, IssuanceStatus, ItemStatus, Permission};

pub use mysql::MySqlIssuanceStore;

/// A log row as needed by the return path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogState {
    pub log_id: i64,
    pub item_id: i64,
    pub issue_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: IssuanceStatus,
}

impl LogState {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none() && self.status == IssuanceStatus::Issued
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssuanceLog {
    pub item_id: i64,
    pub employee_id: i64,
    pub issue_date: NaiveDate,
    pub issued_by_user_id: i64,
}

/// Persistence used by the workflow.
pub trait IssuanceStore: Send {
    /// Loads (and locks) the items that exist among `item_ids`.
    fn lock_items(
        &mut self,
        item_ids: &[i64],
    ) -> impl Future<Output = AppResult<Vec<(i64, ItemStatus)>>> + Send;

    fn employee_exists(&mut self, employee_id: i64) -> impl Future<Output = AppResult<bool>> + Send;

    fn set_item_status(
        &mut self,
        item_ids: &[i64],
        status: ItemStatus,
    ) -> impl Future<Output = AppResult<()>> + Send;

    fn insert_log(&mut self, log: &NewIssuanceLog) -> impl Future<Output = AppResult<i64>> + Send;

    fn lock_log(&mut self, log_id: i64) -> impl Future<Output = AppResult<Option<LogState>>> + Send;

    fn close_log(
        &mut self,
        log_id: i64,
        return_date: NaiveDate,
    ) -> impl Future<Output = AppResult<()>> + Send;

    fn record_audit(&mut self, entry: &AuditEntry) -> impl Future<Output = AppResult<()>> + Send;
}

/// Which endpoint the request came through; only the error wording differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueMode {
    Single,
    Peripherals,
}

#[derive(Debug, Clone)]
pub struct IssueCommand {
    pub mode: IssueMode,
    pub item_ids: Vec<i64>,
    pub employee_id: i64,
    pub issue_date: NaiveDate,
    pub issued_by_user_id: i64,
}

impl IssueCommand {
    /// Checks that need no stored state: at least one item, no repeats.
    pub fn validate(&self) -> AppResult<()> {
        if self.item_ids.is_empty() {
            return Err(AppError::InvalidInput(
                "Please provide at least one item ID".into(),
            ));
        }
        let mut seen = HashSet::with_capacity(self.item_ids.len());
        if let Some(dup) = self.item_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(AppError::InvalidInput(format!(
                "Item {} is listed more than once",
                dup
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueOutcome {
    pub log_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnOutcome {
    pub log_id: i64,
    pub item_id: i64,
}

/// Issues every requested item or none of them.
pub async fn issue<S: IssuanceStore>(store: &mut S, cmd: &IssueCommand) -> AppResult<IssueOutcome> {
    cmd.validate()?;

    let found = store.lock_items(&cmd.item_ids).await?;
    if found.len() != cmd.item_ids.len() {
        return Err(AppError::NotFound(match cmd.mode {
            IssueMode::Single => "Item not found".into(),
            IssueMode::Peripherals => "One or more items not found".into(),
        }));
    }

    let unavailable: Vec<i64> = cmd
        .item_ids
        .iter()
        .copied()
        .filter(|id| {
            found
                .iter()
                .any(|(found_id, status)| found_id == id && !status.is_available())
        })
        .collect();
    if !unavailable.is_empty() {
        return Err(match cmd.mode {
            IssueMode::Single => AppError::invalid_state("Item is not available for issuance"),
            IssueMode::Peripherals => AppError::InvalidState {
                message: "Some items are not available for issuance".into(),
                unavailable_items: unavailable,
            },
        });
    }

    if !store.employee_exists(cmd.employee_id).await? {
        return Err(AppError::NotFound("Employee not found".into()));
    }

    store.set_item_status(&cmd.item_ids, ItemStatus::Issued).await?;

    let mut log_ids = Vec::with_capacity(cmd.item_ids.len());
    for &item_id in &cmd.item_ids {
        let log_id = store
            .insert_log(&NewIssuanceLog {
                item_id,
                employee_id: cmd.employee_id,
                issue_date: cmd.issue_date,
                issued_by_user_id: cmd.issued_by_user_id,
            })
            .await?;
        store
            .record_audit(&AuditEntry::new(
                cmd.issued_by_user_id,
                item_id,
                format!("Issued to employee {} (log {})", cmd.employee_id, log_id),
            ))
            .await?;
        log_ids.push(log_id);
    }

    tracing::info!(
        employee_id = cmd.employee_id,
        items = ?cmd.item_ids,
        "Issued {} item(s)",
        log_ids.len()
    );
    Ok(IssueOutcome { log_ids })
}

/// Closes an open log and puts its item back in stock.
pub async fn receive<S: IssuanceStore>(
    store: &mut S,
    log_id: i64,
    return_date: NaiveDate,
    received_by_user_id: i64,
) -> AppResult<ReturnOutcome> {
    let log = store
        .lock_log(log_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Issuance log not found".into()))?;

    if !log.is_open() {
        return Err(AppError::invalid_state("Item has already been returned"));
    }
    if return_date < log.issue_date {
        return Err(AppError::InvalidInput(
            "return_date cannot be before issue_date".into(),
        ));
    }

    store.lock_items(&[log.item_id]).await?;
    store.close_log(log.log_id, return_date).await?;
    store
        .set_item_status(&[log.item_id], ItemStatus::InStock)
        .await?;
    store
        .record_audit(&AuditEntry::new(
            received_by_user_id,
            log.item_id,
            format!("Returned (log {})", log.log_id),
        ))
        .await?;

    tracing::info!(log_id = log.log_id, item_id = log.item_id, "Item returned");
    Ok(ReturnOutcome {
        log_id: log.log_id,
        item_id: log.item_id,
    })
}

/// Which issuance logs a caller may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogScope {
    All,
    IssuedBy(i64),
}

impl LogScope {
    pub fn for_user(user: &AuthenticatedUser) -> Self {
        if user.role.allows(Permission::ViewAllIssuance) {
            LogScope::All
        } else {
            LogScope::IssuedBy(user.user_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::collections::HashMap;

    #[derive(Debug, Clone, Default)]
    struct MemoryStore {
        items: HashMap<i64, ItemStatus>,
        employees: HashSet<i64>,
        logs: Vec<(NewIssuanceLog, Option<NaiveDate>, IssuanceStatus)>,
        audits: Vec<AuditEntry>,
    }

    impl MemoryStore {
        fn with_items(items: &[(i64, ItemStatus)]) -> Self {
            let mut store = MemoryStore::default();
            store.items.extend(items.iter().copied());
            store.employees.insert(5);
            store
        }

        fn open_logs_for(&self, item_id: i64) -> usize {
            self.logs
                .iter()
                .filter(|(log, ret, _)| log.item_id == item_id && ret.is_none())
                .count()
        }
    }

    impl IssuanceStore for MemoryStore {
        async fn lock_items(&mut self, item_ids: &[i64]) -> AppResult<Vec<(i64, ItemStatus)>> {
            Ok(item_ids
                .iter()
                .filter_map(|id| self.items.get(id).map(|s| (*id, *s)))
                .collect())
        }

        async fn employee_exists(&mut self, employee_id: i64) -> AppResult<bool> {
            Ok(self.employees.contains(&employee_id))
        }

        async fn set_item_status(&mut self, item_ids: &[i64], status: ItemStatus) -> AppResult<()> {
            for id in item_ids {
                self.items.insert(*id, status);
            }
            Ok(())
        }

        async fn insert_log(&mut self, log: &NewIssuanceLog) -> AppResult<i64> {
            self.logs.push((log.clone(), None, IssuanceStatus::Issued));
            Ok(self.logs.len() as i64)
        }

        async fn lock_log(&mut self, log_id: i64) -> AppResult<Option<LogState>> {
            let idx = usize::try_from(log_id - 1).ok();
            Ok(idx.and_then(|i| self.logs.get(i)).map(|(log, ret, status)| LogState {
                log_id,
                item_id: log.item_id,
                issue_date: log.issue_date,
                return_date: *ret,
                status: *status,
            }))
        }

        async fn close_log(&mut self, log_id: i64, return_date: NaiveDate) -> AppResult<()> {
            let entry = &mut self.logs[(log_id - 1) as usize];
            entry.1 = Some(return_date);
            entry.2 = IssuanceStatus::Returned;
            Ok(())
        }

        async fn record_audit(&mut self, entry: &AuditEntry) -> AppResult<()> {
            self.audits.push(entry.clone());
            Ok(())
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn single(item_id: i64) -> IssueCommand {
        IssueCommand {
            mode: IssueMode::Single,
            item_ids: vec![item_id],
            employee_id: 5,
            issue_date: date("2024-01-15"),
            issued_by_user_id: 1,
        }
    }

    fn peripherals(item_ids: Vec<i64>) -> IssueCommand {
        IssueCommand {
            mode: IssueMode::Peripherals,
            item_ids,
            ..single(0)
        }
    }

    #[tokio::test]
    async fn test_issue_in_stock_item() {
        let mut store = MemoryStore::with_items(&[(3, ItemStatus::InStock)]);

        let outcome = issue(&mut store, &single(3)).await.unwrap();

        assert_eq!(outcome.log_ids, vec![1]);
        assert_eq!(store.items[&3], ItemStatus::Issued);
        assert_eq!(store.open_logs_for(3), 1);
        let (log, ret, status) = &store.logs[0];
        assert_eq!(
            log,
            &NewIssuanceLog {
                item_id: 3,
                employee_id: 5,
                issue_date: date("2024-01-15"),
                issued_by_user_id: 1,
            }
        );
        assert_eq!(*ret, None);
        assert_eq!(*status, IssuanceStatus::Issued);
        assert_eq!(store.audits.len(), 1);
    }

    #[tokio::test]
    async fn test_issue_unavailable_item_changes_nothing() {
        for status in [ItemStatus::Issued, ItemStatus::OutOfStock] {
            let mut store = MemoryStore::with_items(&[(3, status)]);
            let err = issue(&mut store, &single(3)).await.unwrap_err();
            assert_eq!(err.to_string(), "Item is not available for issuance");
            assert_eq!(store.items[&3], status);
            assert!(store.logs.is_empty());
            assert!(store.audits.is_empty());
        }
    }

    #[tokio::test]
    async fn test_issue_missing_item_or_employee() {
        let mut store = MemoryStore::with_items(&[(3, ItemStatus::InStock)]);
        let err = issue(&mut store, &single(99)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Item not found"));

        let mut cmd = single(3);
        cmd.employee_id = 42;
        let err = issue(&mut store, &cmd).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Employee not found"));
        assert_eq!(store.items[&3], ItemStatus::InStock);
    }

    #[tokio::test]
    async fn test_bulk_issue_is_all_or_nothing() {
        let mut store = MemoryStore::with_items(&[
            (1, ItemStatus::InStock),
            (2, ItemStatus::Issued),
            (3, ItemStatus::InStock),
            (4, ItemStatus::OutOfStock),
        ]);

        let err = issue(&mut store, &peripherals(vec![1, 2, 3, 4])).await.unwrap_err();
        match err {
            AppError::InvalidState { unavailable_items, .. } => {
                assert_eq!(unavailable_items, vec![2, 4]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.items[&1], ItemStatus::InStock);
        assert_eq!(store.items[&3], ItemStatus::InStock);
        assert!(store.logs.is_empty());

        let err = issue(&mut store, &peripherals(vec![1, 77])).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "One or more items not found"));
        assert!(store.logs.is_empty());
    }

    #[tokio::test]
    async fn test_bulk_issue_success() {
        let mut store = MemoryStore::with_items(&[(1, ItemStatus::InStock), (3, ItemStatus::InStock)]);
        let outcome = issue(&mut store, &peripherals(vec![1, 3])).await.unwrap();
        assert_eq!(outcome.log_ids.len(), 2);
        assert_eq!(store.open_logs_for(1), 1);
        assert_eq!(store.open_logs_for(3), 1);
        assert_eq!(store.items[&1], ItemStatus::Issued);
        assert_eq!(store.items[&3], ItemStatus::Issued);
    }

    #[tokio::test]
    async fn test_bulk_issue_rejects_empty_and_duplicates() {
        let mut store = MemoryStore::with_items(&[(1, ItemStatus::InStock)]);
        assert!(matches!(
            issue(&mut store, &peripherals(vec![])).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            issue(&mut store, &peripherals(vec![1, 1])).await,
            Err(AppError::InvalidInput(_))
        ));
        assert_eq!(store.items[&1], ItemStatus::InStock);
    }

    #[tokio::test]
    async fn test_return_restores_stock() {
        let mut store = MemoryStore::with_items(&[(3, ItemStatus::InStock)]);
        let outcome = issue(&mut store, &single(3)).await.unwrap();
        let log_id = outcome.log_ids[0];

        let returned = receive(&mut store, log_id, date("2024-02-01"), 1).await.unwrap();

        assert_eq!(returned, ReturnOutcome { log_id, item_id: 3 });
        assert_eq!(store.items[&3], ItemStatus::InStock);
        assert_eq!(store.open_logs_for(3), 0);
        assert_eq!(store.logs[0].2, IssuanceStatus::Returned);
        assert_eq!(store.logs[0].1, Some(date("2024-02-01")));

        // the item can go out again
        issue(&mut store, &single(3)).await.unwrap();
        assert_eq!(store.open_logs_for(3), 1);
    }

    #[tokio::test]
    async fn test_double_return_rejected() {
        let mut store = MemoryStore::with_items(&[(3, ItemStatus::InStock)]);
        issue(&mut store, &single(3)).await.unwrap();
        receive(&mut store, 1, date("2024-02-01"), 1).await.unwrap();
        // reissued to someone else; a stale return must not free it
        issue(&mut store, &single(3)).await.unwrap();

        let err = receive(&mut store, 1, date("2024-03-01"), 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Item has already been returned");
        assert_eq!(store.items[&3], ItemStatus::Issued);
    }

    #[tokio::test]
    async fn test_return_errors() {
        let mut store = MemoryStore::with_items(&[(3, ItemStatus::InStock)]);
        assert!(matches!(
            receive(&mut store, 8, date("2024-02-01"), 1).await,
            Err(AppError::NotFound(_))
        ));

        issue(&mut store, &single(3)).await.unwrap();
        assert!(matches!(
            receive(&mut store, 1, date("2023-12-31"), 1).await,
            Err(AppError::InvalidInput(_))
        ));
        assert_eq!(store.open_logs_for(3), 1);
    }

    #[test]
    fn test_log_scope() {
        for role in Role::ALL {
            let user = AuthenticatedUser {
                user_id: 9,
                username: "u".into(),
                role,
            };
            assert_eq!(LogScope::for_user(&user), LogScope::All);
        }
    }
}
