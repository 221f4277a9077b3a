use crate::models::CategoryType;

/// Income or expense, after resolving transfers by sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flow {
    Income,
    Expense,
}

/// Canonical sign for `amount` under `category_type`, regardless of how it was
/// entered. Transfers keep their sign.
pub fn normalize(amount: i64, category_type: CategoryType) -> i64 {
    match category_type {
        CategoryType::Income => amount.saturating_abs(),
        CategoryType::Expense => amount.saturating_abs().saturating_neg(),
        CategoryType::Transfer => amount,
    }
}

/// Bucket an amount as income or expense. Transfers go by sign, zero counts as
/// income.
pub fn effective_type(amount: i64, category_type: CategoryType) -> Flow {
    match category_type {
        CategoryType::Income => Flow::Income,
        CategoryType::Expense => Flow::Expense,
        CategoryType::Transfer if amount >= 0 => Flow::Income,
        CategoryType::Transfer => Flow::Expense,
    }
}
