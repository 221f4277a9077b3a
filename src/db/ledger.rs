use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Row};
use std::ops::RangeInclusive;

use super::{optional, Database};
use crate::models::*;
use crate::money;

/// The slice of a ledger entry the reports need.
#[derive(Debug, Clone)]
pub(crate) struct LedgerRow {
    pub(crate) property_id: i64,
    pub(crate) category_id: i64,
    pub(crate) date: NaiveDate,
    pub(crate) statement_month: Option<Month>,
    pub(crate) amount: i64,
}

const PROPERTY_COLUMNS: &str = "id, nickname, street, city, state, zip, equity, created_at";

const TRANSACTION_COLUMNS: &str = "id, property_id, date, category_id, amount, memo, source, \
     statement_month, deleted_at, created_at";

fn property_from_row(row: &Row<'_>) -> rusqlite::Result<Property> {
    Ok(Property {
        id: Some(row.get(0)?),
        nickname: row.get(1)?,
        street: row.get(2)?,
        city: row.get(3)?,
        state: row.get(4)?,
        zip: row.get(5)?,
        equity: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        category_type: row.get(2)?,
        parent_id: row.get(3)?,
        tax_bucket: row.get(4)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: Some(row.get(0)?),
        property_id: row.get(1)?,
        date: row.get(2)?,
        category_id: row.get(3)?,
        amount: row.get(4)?,
        memo: row.get(5)?,
        source: row.get(6)?,
        statement_month: row.get(7)?,
        deleted_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn annual_from_row(row: &Row<'_>) -> rusqlite::Result<AnnualCategoryAmount> {
    let owner: String = row.get(6)?;
    Ok(AnnualCategoryAmount {
        id: Some(row.get(0)?),
        property_id: row.get(1)?,
        year: row.get(2)?,
        category_id: row.get(3)?,
        amount: row.get(4)?,
        note: row.get(5)?,
        owner: (!owner.is_empty()).then_some(owner),
    })
}

impl Database {
    // ── Properties ────────────────────────────────────────────

    pub(crate) fn insert_property(&self, property: &Property) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO properties (nickname, street, city, state, zip, equity, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                property.nickname,
                property.street,
                property.city,
                property.state,
                property.zip,
                property.equity,
                property.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_properties(&self) -> Result<Vec<Property>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties ORDER BY nickname, id"
        ))?;
        let rows = stmt.query_map([], property_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_property_by_id(&self, id: i64) -> Result<Option<Property>> {
        optional(self.conn.query_row(
            &format!("SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = ?1"),
            params![id],
            property_from_row,
        ))
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn get_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, category_type, parent_id, tax_bucket FROM categories ORDER BY name",
        )?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_category_by_id(&self, id: i64) -> Result<Option<Category>> {
        optional(self.conn.query_row(
            "SELECT id, name, category_type, parent_id, tax_bucket FROM categories WHERE id = ?1",
            params![id],
            category_from_row,
        ))
    }

    pub(crate) fn insert_category(&self, cat: &Category) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO categories (name, category_type, parent_id, tax_bucket)
             VALUES (?1, ?2, ?3, ?4)",
            params![cat.name, cat.category_type, cat.parent_id, cat.tax_bucket],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Fails while ledger entries or annual amounts still use the category.
    /// Recurring rules keep a NULL category and stop being scheduled.
    pub(crate) fn delete_category(&self, id: i64) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])
            .with_context(|| format!("Category {id} is still in use"))?;
        Ok(removed > 0)
    }

    fn category_type_of(&self, category_id: i64) -> Result<CategoryType> {
        self.get_category_by_id(category_id)?
            .map(|c| c.category_type)
            .ok_or_else(|| anyhow::anyhow!("Category {category_id} not found"))
    }

    // ── Transactions ──────────────────────────────────────────

    /// Insert a ledger entry with its amount normalized to the category's sign.
    pub(crate) fn insert_transaction(&self, txn: &Transaction) -> Result<i64> {
        let amount = money::normalize(txn.amount, self.category_type_of(txn.category_id)?);
        self.conn.execute(
            "INSERT INTO transactions (property_id, date, category_id, amount, memo, source, statement_month, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                txn.property_id,
                txn.date,
                txn.category_id,
                amount,
                txn.memo,
                txn.source,
                txn.statement_month,
                txn.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_transaction_by_id(&self, id: i64) -> Result<Option<Transaction>> {
        optional(self.conn.query_row(
            &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
            params![id],
            transaction_from_row,
        ))
    }

    pub(crate) fn get_transactions(
        &self,
        property_id: Option<i64>,
        month: Option<Month>,
        include_deleted: bool,
    ) -> Result<Vec<Transaction>> {
        let mut sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(pid) = property_id {
            sql.push_str(&format!(" AND property_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(pid));
        }
        if let Some(m) = month {
            sql.push_str(&format!(
                " AND date >= ?{} AND date <= ?{}",
                param_values.len() + 1,
                param_values.len() + 2
            ));
            param_values.push(Box::new(m.first_day()));
            param_values.push(Box::new(m.last_day()));
        }
        if !include_deleted {
            sql.push_str(" AND deleted_at IS NULL");
        }
        sql.push_str(" ORDER BY date DESC, id DESC");

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), transaction_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn soft_delete_transaction(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE transactions SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![chrono::Utc::now().to_rfc3339(), id],
        )?;
        Ok(changed > 0)
    }

    pub(crate) fn restore_transaction(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE transactions SET deleted_at = NULL WHERE id = ?1 AND deleted_at IS NOT NULL",
            params![id],
        )?;
        Ok(changed > 0)
    }

    /// Live ledger rows dated in `[start, end_exclusive)`.
    pub(crate) fn ledger_rows(
        &self,
        property_id: Option<i64>,
        start: NaiveDate,
        end_exclusive: NaiveDate,
    ) -> Result<Vec<LedgerRow>> {
        self.query_ledger_rows(
            "date >= ?2 AND date < ?3",
            property_id,
            &[&start, &end_exclusive],
        )
    }

    /// Live ledger rows dated in `[start, end_exclusive)` or billed to a
    /// statement month in `months`.
    pub(crate) fn ledger_rows_with_statements(
        &self,
        property_id: Option<i64>,
        start: NaiveDate,
        end_exclusive: NaiveDate,
        months: RangeInclusive<Month>,
    ) -> Result<Vec<LedgerRow>> {
        self.query_ledger_rows(
            "((date >= ?2 AND date < ?3) OR (statement_month >= ?4 AND statement_month <= ?5))",
            property_id,
            &[&start, &end_exclusive, months.start(), months.end()],
        )
    }

    fn query_ledger_rows(
        &self,
        window: &str,
        property_id: Option<i64>,
        window_params: &[&dyn rusqlite::types::ToSql],
    ) -> Result<Vec<LedgerRow>> {
        let sql = format!(
            "SELECT property_id, category_id, date, statement_month, amount
             FROM transactions
             WHERE deleted_at IS NULL AND (?1 IS NULL OR property_id = ?1) AND {window}
             ORDER BY date, id"
        );
        let mut params_ref: Vec<&dyn rusqlite::types::ToSql> = vec![&property_id];
        params_ref.extend_from_slice(window_params);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), |row| {
            Ok(LedgerRow {
                property_id: row.get(0)?,
                category_id: row.get(1)?,
                date: row.get(2)?,
                statement_month: row.get(3)?,
                amount: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ── Annual amounts ────────────────────────────────────────

    /// Insert or replace the figure for (property, year, category, owner),
    /// normalized to the category's sign.
    pub(crate) fn upsert_annual_amount(&self, annual: &AnnualCategoryAmount) -> Result<i64> {
        let amount = money::normalize(annual.amount, self.category_type_of(annual.category_id)?);
        let id = self.conn.query_row(
            "INSERT INTO annual_category_amounts (property_id, year, category_id, amount, note, owner)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(property_id, year, category_id, owner)
             DO UPDATE SET amount = excluded.amount, note = excluded.note
             RETURNING id",
            params![
                annual.property_id,
                annual.year,
                annual.category_id,
                amount,
                annual.note,
                annual.owner.as_deref().unwrap_or(""),
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub(crate) fn get_annual_amounts(
        &self,
        property_id: Option<i64>,
        years: RangeInclusive<i32>,
    ) -> Result<Vec<AnnualCategoryAmount>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, property_id, year, category_id, amount, note, owner
             FROM annual_category_amounts
             WHERE (?1 IS NULL OR property_id = ?1) AND year >= ?2 AND year <= ?3
             ORDER BY property_id, year, category_id, owner",
        )?;
        let rows = stmt.query_map(
            params![property_id, years.start(), years.end()],
            annual_from_row,
        )?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}
