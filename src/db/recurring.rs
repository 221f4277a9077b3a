use anyhow::Result;
use rusqlite::{params, Row, TransactionBehavior};
use std::collections::HashSet;

use super::{optional, Database};
use crate::models::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PostResult {
    Posted { transaction_id: i64 },
    AlreadyPosted,
}

const RULE_COLUMNS: &str = "id, property_id, category_id, amount, memo, day_of_month, \
     start_month, end_month, is_active";

fn rule_from_row(row: &Row<'_>) -> rusqlite::Result<RecurringRule> {
    Ok(RecurringRule {
        id: Some(row.get(0)?),
        property_id: row.get(1)?,
        category_id: row.get(2)?,
        amount: row.get(3)?,
        memo: row.get(4)?,
        day_of_month: row.get(5)?,
        start_month: row.get(6)?,
        end_month: row.get(7)?,
        is_active: row.get(8)?,
    })
}

pub(super) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Insert the ledger entry and its posting record on an open transaction.
/// On `AlreadyPosted` the caller must roll back.
pub(super) fn write_posting(
    tx: &rusqlite::Transaction<'_>,
    rule_id: i64,
    month: Month,
    txn: &Transaction,
) -> Result<PostResult> {
    tx.execute(
        "INSERT INTO transactions (property_id, date, category_id, amount, memo, source, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            txn.property_id,
            txn.date,
            txn.category_id,
            txn.amount,
            txn.memo,
            txn.source,
            txn.created_at,
        ],
    )?;
    let transaction_id = tx.last_insert_rowid();

    let inserted = tx.execute(
        "INSERT INTO recurring_postings (recurring_rule_id, month, ledger_transaction_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![rule_id, month, transaction_id, chrono::Utc::now().to_rfc3339()],
    );
    match inserted {
        Ok(_) => Ok(PostResult::Posted { transaction_id }),
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!(rule_id, %month, "lost posting race, treating as already posted");
            Ok(PostResult::AlreadyPosted)
        }
        Err(e) => Err(e.into()),
    }
}

impl Database {
    // ── Rules ─────────────────────────────────────────────────

    pub(crate) fn insert_recurring_rule(&self, rule: &RecurringRule) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO recurring_rules (property_id, category_id, amount, memo, day_of_month, start_month, end_month, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                rule.property_id,
                rule.category_id,
                rule.amount,
                rule.memo,
                rule.day_of_month,
                rule.start_month,
                rule.end_month,
                rule.is_active,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Overwrite a rule's fields. Past postings are left as they are.
    pub(crate) fn update_recurring_rule(&self, id: i64, rule: &RecurringRule) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE recurring_rules
             SET category_id = ?1, amount = ?2, memo = ?3, day_of_month = ?4,
                 start_month = ?5, end_month = ?6, is_active = ?7
             WHERE id = ?8 AND property_id = ?9",
            params![
                rule.category_id,
                rule.amount,
                rule.memo,
                rule.day_of_month,
                rule.start_month,
                rule.end_month,
                rule.is_active,
                id,
                rule.property_id,
            ],
        )?;
        Ok(changed > 0)
    }

    pub(crate) fn set_recurring_rule_active(
        &self,
        id: i64,
        property_id: i64,
        is_active: bool,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE recurring_rules SET is_active = ?1 WHERE id = ?2 AND property_id = ?3",
            params![is_active, id, property_id],
        )?;
        Ok(changed > 0)
    }

    /// Removes the rule and, by cascade, its posting records. Ledger entries
    /// it produced stay.
    pub(crate) fn delete_recurring_rule(&self, id: i64, property_id: i64) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM recurring_rules WHERE id = ?1 AND property_id = ?2",
            params![id, property_id],
        )?;
        Ok(removed > 0)
    }

    pub(crate) fn get_recurring_rule(&self, id: i64, property_id: i64) -> Result<Option<RecurringRule>> {
        optional(self.conn.query_row(
            &format!("SELECT {RULE_COLUMNS} FROM recurring_rules WHERE id = ?1 AND property_id = ?2"),
            params![id, property_id],
            rule_from_row,
        ))
    }

    pub(crate) fn get_recurring_rules(&self, property_id: i64) -> Result<Vec<RecurringRule>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM recurring_rules WHERE property_id = ?1
             ORDER BY day_of_month, id"
        ))?;
        let rows = stmt.query_map(params![property_id], rule_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn earliest_active_start_month(&self, property_id: i64) -> Result<Option<Month>> {
        Ok(self.conn.query_row(
            "SELECT MIN(start_month) FROM recurring_rules WHERE property_id = ?1 AND is_active = 1",
            params![property_id],
            |row| row.get(0),
        )?)
    }

    // ── Postings ──────────────────────────────────────────────

    /// Rule ids of the property already posted for `month`.
    pub(crate) fn posted_rule_ids(&self, property_id: i64, month: Month) -> Result<HashSet<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.recurring_rule_id
             FROM recurring_postings p
             JOIN recurring_rules r ON r.id = p.recurring_rule_id
             WHERE r.property_id = ?1 AND p.month = ?2",
        )?;
        let rows = stmt.query_map(params![property_id, month], |row| row.get(0))?;
        Ok(rows.collect::<std::result::Result<HashSet<_>, _>>()?)
    }

    pub(crate) fn get_postings(&self, rule_id: i64) -> Result<Vec<RecurringPosting>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recurring_rule_id, month, ledger_transaction_id
             FROM recurring_postings WHERE recurring_rule_id = ?1 ORDER BY month",
        )?;
        let rows = stmt.query_map(params![rule_id], |row| {
            Ok(RecurringPosting {
                id: Some(row.get(0)?),
                recurring_rule_id: row.get(1)?,
                month: row.get(2)?,
                ledger_transaction_id: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Atomically write one ledger entry and its posting record for
    /// `(rule_id, month)`, unless that pair is already posted.
    ///
    /// The check and the insert run under the write lock, so a writer that
    /// lost the race to another connection sees its posting and reports
    /// `AlreadyPosted`.
    pub(crate) fn post_recurring(
        &mut self,
        rule_id: i64,
        month: Month,
        txn: &Transaction,
    ) -> Result<PostResult> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM recurring_postings WHERE recurring_rule_id = ?1 AND month = ?2)",
            params![rule_id, month],
            |row| row.get(0),
        )?;
        if exists {
            return Ok(PostResult::AlreadyPosted);
        }

        let result = write_posting(&tx, rule_id, month, txn)?;
        if let PostResult::Posted { .. } = result {
            tx.commit()?;
        }
        Ok(result)
    }
}
