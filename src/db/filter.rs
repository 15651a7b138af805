use serde::Deserialize;
use sqlx::{MySql, QueryBuilder};

use crate::models::{de, ItemStatus, ITEM_COLUMNS};

/// Optional filters for item listings. Every value is bound, never spliced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemFilter {
    /// Substring match on serial number, model or brand.
    pub search: Option<String>,
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "de::optional_parsed")]
    pub category: Option<i64>,
    #[serde(default, deserialize_with = "de::optional_parsed")]
    pub status: Option<ItemStatus>,
    pub model: Option<String>,
    /// Only items currently issued to this employee.
    #[serde(default, deserialize_with = "de::optional_parsed")]
    pub issued_to: Option<i64>,
    /// Only items whose category name is in this list.
    #[serde(skip)]
    pub category_names: Vec<String>,
}

impl ItemFilter {
    /// Builds the full item select, filters applied, ordered by id.
    pub fn select_query(&self) -> QueryBuilder<'_, MySql> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} FROM items i LEFT JOIN categories c ON i.category_id = c.category_id WHERE 1=1",
            ITEM_COLUMNS
        ));
        self.push_conditions(&mut qb);
        qb.push(" ORDER BY i.item_id");
        qb
    }

    pub fn push_conditions<'a>(&'a self, qb: &mut QueryBuilder<'a, MySql>) {
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(term));
            qb.push(" AND (i.serial_number LIKE ")
                .push_bind(pattern.clone())
                .push(" OR i.model LIKE ")
                .push_bind(pattern.clone())
                .push(" OR i.brand LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(brand) = self.brand.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND i.brand = ").push_bind(brand);
        }
        if let Some(category) = self.category {
            qb.push(" AND i.category_id = ").push_bind(category);
        }
        if let Some(status) = self.status {
            qb.push(" AND i.status = ").push_bind(status.as_str());
        }
        if let Some(model) = self.model.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND i.model = ").push_bind(model);
        }
        if let Some(employee_id) = self.issued_to {
            qb.push(
                " AND EXISTS (SELECT 1 FROM issuance_logs il WHERE il.item_id = i.item_id \
                 AND il.return_date IS NULL AND il.employee_id = ",
            )
            .push_bind(employee_id)
            .push(")");
        }
        if !self.category_names.is_empty() {
            qb.push(" AND c.category_name IN (");
            let mut names = qb.separated(", ");
            for name in &self.category_names {
                names.push_bind(name.as_str());
            }
            names.push_unseparated(")");
        }
    }
}

/// Escapes `%`, `_` and `\` so user input matches literally inside LIKE.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
