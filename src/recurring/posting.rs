use anyhow::Result;

use super::schedule::{schedule_for_month, ScheduledRule};
use super::{when_ready, RecurringOutcome};
use crate::db::{Database, PostResult};
use crate::models::{Month, Transaction};
use crate::money;

/// Post every due, not-yet-posted rule of the property for `month`.
/// Returns how many ledger entries were written; zero means nothing new.
pub(crate) fn post_for_month(
    db: &mut Database,
    property_id: i64,
    month: Month,
) -> Result<RecurringOutcome<usize>> {
    when_ready(db, |db| {
        Ok(RecurringOutcome::Done(post_month(db, property_id, month)?))
    })
}

/// Post every month from the earliest active rule's start through
/// `through_month`. Safe to re-run: posted months are skipped.
pub(crate) fn post_catch_up_through_month(
    db: &mut Database,
    property_id: i64,
    through_month: Month,
) -> Result<RecurringOutcome<usize>> {
    when_ready(db, |db| {
        let Some(first) = db.earliest_active_start_month(property_id)? else {
            return Ok(RecurringOutcome::Done(0));
        };

        let mut total = 0;
        for month in first.through(through_month) {
            total += post_month(db, property_id, month)?;
        }
        tracing::info!(property_id, %first, %through_month, posted = total, "catch-up complete");
        Ok(RecurringOutcome::Done(total))
    })
}

fn post_month(db: &mut Database, property_id: i64, month: Month) -> Result<usize> {
    let pending: Vec<ScheduledRule> = schedule_for_month(db, property_id, month, false)?
        .into_iter()
        .filter(|s| !s.already_posted)
        .collect();

    let mut posted = 0;
    for item in &pending {
        let txn = ledger_entry_for(property_id, item);
        match db.post_recurring(item.rule_id, month, &txn)? {
            PostResult::Posted { transaction_id } => {
                tracing::info!(
                    rule_id = item.rule_id,
                    %month,
                    transaction_id,
                    amount = txn.amount,
                    "posted recurring rule"
                );
                posted += 1;
            }
            PostResult::AlreadyPosted => {
                tracing::debug!(rule_id = item.rule_id, %month, "already posted");
            }
        }
    }
    Ok(posted)
}

fn ledger_entry_for(property_id: i64, item: &ScheduledRule) -> Transaction {
    let mut txn = Transaction::new(
        property_id,
        item.due_date,
        item.category_id,
        money::normalize(item.amount_cents, item.category.category_type),
    );
    let label = item
        .memo
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or(&item.category.name);
    txn.memo = format!("Recurring: {label}");
    txn
}
