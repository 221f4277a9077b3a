use anyhow::Result;
use chrono::NaiveDate;
use std::collections::HashMap;

use super::{tables_ready, RecurringOutcome};
use crate::db::Database;
use crate::models::{Category, Month};

/// One rule's instance for a given month.
#[derive(Debug, Clone)]
pub(crate) struct ScheduledRule {
    pub(crate) rule_id: i64,
    pub(crate) category_id: i64,
    /// Positive magnitude as stored on the rule.
    pub(crate) amount_cents: i64,
    pub(crate) day_of_month: u32,
    pub(crate) memo: Option<String>,
    pub(crate) due_date: NaiveDate,
    pub(crate) is_active: bool,
    pub(crate) already_posted: bool,
    pub(crate) category: Category,
}

/// Active rules of the property due in `month`, each marked with whether it
/// was already posted.
pub(crate) fn resolve_schedule_for_month(
    db: &Database,
    property_id: i64,
    month: Month,
) -> Result<RecurringOutcome<Vec<ScheduledRule>>> {
    resolve_schedule(db, property_id, month, false)
}

/// Like [`resolve_schedule_for_month`]; `include_inactive` also lists paused
/// rules whose window covers `month`, for display.
pub(crate) fn resolve_schedule(
    db: &Database,
    property_id: i64,
    month: Month,
    include_inactive: bool,
) -> Result<RecurringOutcome<Vec<ScheduledRule>>> {
    if !tables_ready(db)? {
        return Ok(RecurringOutcome::Unavailable);
    }
    Ok(RecurringOutcome::Done(schedule_for_month(
        db,
        property_id,
        month,
        include_inactive,
    )?))
}

pub(super) fn schedule_for_month(
    db: &Database,
    property_id: i64,
    month: Month,
    include_inactive: bool,
) -> Result<Vec<ScheduledRule>> {
    let categories: HashMap<i64, Category> = db
        .get_categories()?
        .into_iter()
        .filter_map(|c| c.id.map(|id| (id, c)))
        .collect();
    let posted = db.posted_rule_ids(property_id, month)?;

    let mut scheduled: Vec<ScheduledRule> = db
        .get_recurring_rules(property_id)?
        .into_iter()
        .filter(|rule| {
            if include_inactive {
                rule.covers(month)
            } else {
                rule.is_due_in(month)
            }
        })
        .filter_map(|rule| {
            let rule_id = rule.id?;
            let Some(category) = rule.category_id.and_then(|id| categories.get(&id)) else {
                tracing::debug!(rule_id, %month, "skipping rule without a category");
                return None;
            };
            Some(ScheduledRule {
                rule_id,
                category_id: rule.category_id?,
                amount_cents: rule.amount,
                day_of_month: rule.day_of_month,
                due_date: rule.due_date(month),
                is_active: rule.is_active,
                already_posted: posted.contains(&rule_id),
                category: category.clone(),
                memo: rule.memo,
            })
        })
        .collect();

    scheduled.sort_by_key(|s| (s.day_of_month, s.rule_id));
    Ok(scheduled)
}
