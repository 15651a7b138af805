use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockReport {
    pub total: i64,
    pub in_stock: i64,
    pub issued: i64,
    pub out_of_stock: i64,
}

impl StockReport {
    pub fn from_counts(counts: &[StatusCount]) -> Self {
        let mut report = StockReport::default();
        for row in counts {
            match row.status.as_str() {
                "In Stock" => report.in_stock += row.count,
                "Issued" => report.issued += row.count,
                "Out of Stock" => report.out_of_stock += row.count,
                other => tracing::warn!("Unknown item status in report: {}", other),
            }
            report.total += row.count;
        }
        report
    }
}
