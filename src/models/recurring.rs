use chrono::NaiveDate;

use super::Month;

/// A monthly charge or credit template.
///
/// `amount` is the positive magnitude in cents; the ledger sign comes from the
/// category type at posting time.
#[derive(Debug, Clone)]
pub struct RecurringRule {
    pub id: Option<i64>,
    pub property_id: i64,
    /// `None` once the category has been deleted.
    pub category_id: Option<i64>,
    pub amount: i64,
    pub memo: Option<String>,
    /// 1..=28
    pub day_of_month: u32,
    pub start_month: Month,
    /// Inclusive.
    pub end_month: Option<Month>,
    pub is_active: bool,
}

impl RecurringRule {
    /// Whether `month` falls inside the rule's start/end window.
    pub fn covers(&self, month: Month) -> bool {
        month >= self.start_month && self.end_month.map_or(true, |end| month <= end)
    }

    pub fn is_due_in(&self, month: Month) -> bool {
        self.is_active && self.covers(month)
    }

    pub fn due_date(&self, month: Month) -> NaiveDate {
        due_date_for_month(month, self.day_of_month)
    }
}

/// The date in `month` at `day_of_month`, clamped to the month's last day.
pub fn due_date_for_month(month: Month, day_of_month: u32) -> NaiveDate {
    month.day_clamped(day_of_month)
}

/// Proof that a rule was materialized for one month.
#[derive(Debug, Clone)]
pub struct RecurringPosting {
    pub id: Option<i64>,
    pub recurring_rule_id: i64,
    pub month: Month,
    pub ledger_transaction_id: i64,
}
