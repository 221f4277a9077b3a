use anyhow::Result;

use super::{when_ready, RecurringOutcome, ValidationError};
use crate::db::Database;
use crate::models::{Month, RecurringRule};
use crate::money;

const MAX_DAY_OF_MONTH: u32 = 28;

/// Rule fields as submitted, before validation.
#[derive(Debug, Clone, Default)]
pub(crate) struct RuleForm {
    pub(crate) category_id: Option<i64>,
    /// Dollar magnitude, e.g. "200" or "$1,250.00".
    pub(crate) amount: String,
    pub(crate) memo: String,
    pub(crate) day_of_month: String,
    pub(crate) start_month: String,
    /// Empty for open-ended.
    pub(crate) end_month: String,
    pub(crate) is_active: bool,
}

impl RuleForm {
    #[cfg(test)]
    pub(crate) fn new(category_id: i64, amount: &str, day_of_month: u32, start_month: &str) -> Self {
        Self {
            category_id: Some(category_id),
            amount: amount.to_string(),
            memo: String::new(),
            day_of_month: day_of_month.to_string(),
            start_month: start_month.to_string(),
            end_month: String::new(),
            is_active: true,
        }
    }

    /// Check every field against the database and build the rule.
    pub(crate) fn validate(
        &self,
        db: &Database,
        property_id: i64,
    ) -> Result<std::result::Result<RecurringRule, ValidationError>> {
        if db.get_property_by_id(property_id)?.is_none() {
            return Ok(Err(ValidationError::new("property", "property not found")));
        }

        let Some(category_id) = self.category_id else {
            return Ok(Err(ValidationError::new("category", "category is required")));
        };
        if db.get_category_by_id(category_id)?.is_none() {
            return Ok(Err(ValidationError::new("category", "category not found")));
        }

        Ok(self.validate_fields(property_id, category_id))
    }

    fn validate_fields(
        &self,
        property_id: i64,
        category_id: i64,
    ) -> std::result::Result<RecurringRule, ValidationError> {
        if self.amount.trim().is_empty() {
            return Err(ValidationError::new("amount", "amount is required"));
        }
        // Entered as a magnitude; the category decides the sign
        let amount = money::parse_dollars(&self.amount)
            .map_err(|e| ValidationError::new("amount", e.to_string()))?
            .saturating_abs();
        if amount == 0 {
            return Err(ValidationError::new("amount", "amount must be greater than zero"));
        }

        let day_of_month: u32 = self
            .day_of_month
            .trim()
            .parse()
            .map_err(|_| ValidationError::new("day_of_month", "day of month must be a number"))?;
        if !(1..=MAX_DAY_OF_MONTH).contains(&day_of_month) {
            return Err(ValidationError::new(
                "day_of_month",
                format!("day of month must be between 1 and {MAX_DAY_OF_MONTH}"),
            ));
        }

        if self.start_month.trim().is_empty() {
            return Err(ValidationError::new("start_month", "start month is required"));
        }
        let start_month = self
            .start_month
            .parse::<Month>()
            .map_err(|e| ValidationError::new("start_month", e.to_string()))?;

        let end_month = match self.end_month.trim() {
            "" => None,
            raw => Some(raw.parse::<Month>().map_err(|e| {
                ValidationError::new("end_month", e.to_string())
            })?),
        };
        if end_month.is_some_and(|end| end < start_month) {
            return Err(ValidationError::new(
                "end_month",
                "end month must not be before start month",
            ));
        }

        let memo = self.memo.trim();
        Ok(RecurringRule {
            id: None,
            property_id,
            category_id: Some(category_id),
            amount,
            memo: (!memo.is_empty()).then(|| memo.to_string()),
            day_of_month,
            start_month,
            end_month,
            is_active: self.is_active,
        })
    }
}

pub(crate) fn create_recurring_rule(
    db: &mut Database,
    property_id: i64,
    form: &RuleForm,
) -> Result<RecurringOutcome<i64>> {
    when_ready(db, |db| {
        let rule = match form.validate(db, property_id)? {
            Ok(rule) => rule,
            Err(e) => return Ok(RecurringOutcome::Invalid(e)),
        };
        let id = db.insert_recurring_rule(&rule)?;
        tracing::info!(rule_id = id, property_id, "created recurring rule");
        Ok(RecurringOutcome::Done(id))
    })
}

/// Replace a rule's fields. Earlier postings keep the old amount and category.
pub(crate) fn update_recurring_rule(
    db: &mut Database,
    id: i64,
    property_id: i64,
    form: &RuleForm,
) -> Result<RecurringOutcome<()>> {
    when_ready(db, |db| {
        let rule = match form.validate(db, property_id)? {
            Ok(rule) => rule,
            Err(e) => return Ok(RecurringOutcome::Invalid(e)),
        };
        if !db.update_recurring_rule(id, &rule)? {
            return Ok(RecurringOutcome::Invalid(rule_not_found()));
        }
        tracing::info!(rule_id = id, property_id, "updated recurring rule");
        Ok(RecurringOutcome::Done(()))
    })
}

pub(crate) fn toggle_recurring_rule(
    db: &mut Database,
    id: i64,
    property_id: i64,
    is_active: bool,
) -> Result<RecurringOutcome<()>> {
    when_ready(db, |db| {
        if !db.set_recurring_rule_active(id, property_id, is_active)? {
            return Ok(RecurringOutcome::Invalid(rule_not_found()));
        }
        tracing::info!(rule_id = id, property_id, is_active, "toggled recurring rule");
        Ok(RecurringOutcome::Done(()))
    })
}

/// Delete a rule and its posting records. Ledger entries already posted stay.
pub(crate) fn delete_recurring_rule(
    db: &mut Database,
    id: i64,
    property_id: i64,
) -> Result<RecurringOutcome<()>> {
    when_ready(db, |db| {
        if !db.delete_recurring_rule(id, property_id)? {
            return Ok(RecurringOutcome::Invalid(rule_not_found()));
        }
        tracing::info!(rule_id = id, property_id, "deleted recurring rule");
        Ok(RecurringOutcome::Done(()))
    })
}

fn rule_not_found() -> ValidationError {
    ValidationError::new("id", "recurring rule not found for this property")
}
