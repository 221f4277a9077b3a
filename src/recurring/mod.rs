//! Recurring monthly charges: rule commands, the per-month schedule, and the
//! posting engine that turns due rules into ledger entries exactly once.
//!
//! Every entry point first checks that the recurring tables exist. On a
//! database with a pending migration the result is
//! [`RecurringOutcome::Unavailable`] rather than an error.

mod posting;
mod rules;
mod schedule;

use anyhow::Result;

use crate::db::Database;

pub(crate) use posting::{post_catch_up_through_month, post_for_month};
pub(crate) use rules::{
    create_recurring_rule, delete_recurring_rule, toggle_recurring_rule, update_recurring_rule,
    RuleForm,
};
pub(crate) use schedule::{resolve_schedule, resolve_schedule_for_month};

/// A rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub(crate) struct ValidationError {
    pub(crate) field: &'static str,
    pub(crate) reason: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Expected results of a recurring command or query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RecurringOutcome<T> {
    Done(T),
    Invalid(ValidationError),
    /// The recurring tables are missing; run migrations.
    Unavailable,
}

impl<T> RecurringOutcome<T> {
    #[cfg(test)]
    pub(crate) fn done(self) -> Option<T> {
        match self {
            Self::Done(v) => Some(v),
            _ => None,
        }
    }
}

fn tables_ready(db: &Database) -> Result<bool> {
    let ready = db.recurring_tables_ready()?;
    if !ready {
        tracing::warn!("recurring tables missing, recurring features unavailable");
    }
    Ok(ready)
}

/// Run `f` only when the recurring tables exist.
fn when_ready<T>(
    db: &mut Database,
    f: impl FnOnce(&mut Database) -> Result<RecurringOutcome<T>>,
) -> Result<RecurringOutcome<T>> {
    if !tables_ready(db)? {
        return Ok(RecurringOutcome::Unavailable);
    }
    f(db)
}
