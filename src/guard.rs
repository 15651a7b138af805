//! Referential checks run before deleting items and categories.

use sqlx::MySqlConnection;

use crate::error::{AppError, AppResult};

/// Rows that still reference an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemDependents {
    pub issuance_logs: i64,
    pub documents: i64,
    pub composite_items: i64,
}

impl ItemDependents {
    pub async fn count(conn: &mut MySqlConnection, item_id: i64) -> AppResult<Self> {
        let issuance_logs: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM issuance_logs WHERE item_id = ?")
                .bind(item_id)
                .fetch_one(&mut *conn)
                .await?;
        let documents: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM item_documents WHERE item_id = ?")
                .bind(item_id)
                .fetch_one(&mut *conn)
                .await?;
        let composite_items: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM composite_items \
             WHERE ? IN (desktop_id, cpu_id, lcd_id, keyboard_id, mouse_id, speaker_id)",
        )
        .bind(item_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Self {
            issuance_logs,
            documents,
            composite_items,
        })
    }

    /// Fails on the first kind of dependent found, reporting its count.
    pub fn ensure_deletable(&self) -> AppResult<()> {
        if self.issuance_logs > 0 {
            return Err(AppError::HasDependents {
                message: "Cannot delete item. It has issuance history. Please return all issued items first.".into(),
                count_field: "issuanceCount",
                count: self.issuance_logs,
            });
        }
        if self.documents > 0 {
            return Err(AppError::HasDependents {
                message: "Cannot delete item. It has associated documents. Please remove documents first.".into(),
                count_field: "documentCount",
                count: self.documents,
            });
        }
        if self.composite_items > 0 {
            return Err(AppError::HasDependents {
                message: "Cannot delete item. It is part of composite items. Please remove from composite items first.".into(),
                count_field: "compositeCount",
                count: self.composite_items,
            });
        }
        Ok(())
    }
}

/// Items still filed under a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryDependents {
    pub items: i64,
}

impl CategoryDependents {
    pub async fn count(conn: &mut MySqlConnection, category_id: i64) -> AppResult<Self> {
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE category_id = ?")
            .bind(category_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(Self { items })
    }

    pub fn ensure_deletable(&self) -> AppResult<()> {
        if self.items > 0 {
            return Err(AppError::HasDependents {
                message: "Cannot delete category. It is being used by items in the inventory.".into(),
                count_field: "itemCount",
                count: self.items,
            });
        }
        Ok(())
    }
}
