use chrono::NaiveDate;

use super::Month;

pub const SOURCE_MANUAL: &str = "manual";

/// A ledger entry. Amounts are integer cents: income positive, expense negative.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Option<i64>,
    pub property_id: i64,
    pub date: NaiveDate,
    pub category_id: i64,
    pub amount: i64,
    pub memo: String,
    pub source: String,
    /// Billing period for accrual reporting, when tracked.
    pub statement_month: Option<Month>,
    pub deleted_at: Option<String>,
    pub created_at: String,
}

impl Transaction {
    pub fn new(property_id: i64, date: NaiveDate, category_id: i64, amount: i64) -> Self {
        Self {
            id: None,
            property_id,
            date,
            category_id,
            amount,
            memo: String::new(),
            source: SOURCE_MANUAL.to_string(),
            statement_month: None,
            deleted_at: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
