mod ledger;
mod recurring;
mod schema;

use anyhow::{Context, Result};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection};
use std::path::Path;
use std::time::Duration;

use crate::models::{CategoryType, TaxBucket};

pub(crate) use ledger::LedgerRow;
pub(crate) use recurring::PostResult;

/// How long a writer waits on another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path, auto_migrate: bool) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to set busy timeout")?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        Self::init(conn, auto_migrate)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::init(conn, true)
    }

    /// In-memory database left at schema version 1, as if a migration were
    /// still pending.
    #[cfg(test)]
    pub(crate) fn open_in_memory_unmigrated() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::init(conn, false)
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    fn init(conn: Connection, auto_migrate: bool) -> Result<Self> {
        let mut db = Self { conn };
        db.ensure_base_schema()
            .context("Failed to create base schema")?;
        if auto_migrate {
            db.migrate().context("Database migration failed")?;
        }
        db.seed_default_categories()?;
        Ok(db)
    }

    fn ensure_base_schema(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;
        if has_version_table {
            return Ok(());
        }

        // Fresh database - base schema only; recurring tables arrive by migration
        let tx = self.conn.transaction()?;
        tx.execute_batch(schema::SCHEMA_V1)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
        tracing::info!("created database schema v1");
        Ok(())
    }

    pub(crate) fn schema_version(&self) -> Result<i32> {
        let version = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);
        Ok(version)
    }

    /// Apply every pending migration. Returns how many ran.
    pub(crate) fn migrate(&mut self) -> Result<usize> {
        let current = self.schema_version()?;
        let mut applied = 0;

        let tx = self.conn.transaction()?;
        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                tx.execute_batch(sql)
                    .with_context(|| format!("Migration from v{from_version} failed"))?;
                applied += 1;
                tracing::info!(from_version, "applied migration");
            }
        }
        if current < schema::CURRENT_VERSION {
            tx.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }
        tx.commit()?;

        Ok(applied)
    }

    /// Whether the recurring rule and posting tables exist.
    pub(crate) fn recurring_tables_ready(&self) -> Result<bool> {
        let mut stmt = self.conn.prepare(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
        )?;
        for name in schema::RECURRING_TABLE_NAMES {
            let exists: bool = stmt.query_row(params![name], |row| row.get(0))?;
            if !exists {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn seed_default_categories(&mut self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        use CategoryType::{Expense, Income, Transfer};
        let defaults = [
            ("Rent", Income),
            ("Late Fees", Income),
            ("Pet Fees", Income),
            ("Other Income", Income),
            ("Advertising", Expense),
            ("Cleaning and Maintenance", Expense),
            ("HOA", Expense),
            ("Insurance", Expense),
            ("Legal and Professional Fees", Expense),
            ("Management Fees", Expense),
            ("Mortgage Interest", Expense),
            ("Property Tax", Expense),
            ("Repairs", Expense),
            ("Supplies", Expense),
            ("Travel", Expense),
            ("Utilities", Expense),
            ("Owner Contribution", Transfer),
            ("Owner Distribution", Transfer),
            ("Security Deposit", Transfer),
        ];

        let tx = self.conn.transaction()?;
        for (name, category_type) in &defaults {
            tx.execute(
                "INSERT OR IGNORE INTO categories (name, category_type) VALUES (?1, ?2)",
                params![name, category_type],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

// ── SQL conversions ───────────────────────────────────────────

impl ToSql for CategoryType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        CategoryType::parse(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown category type '{s}'").into()))
    }
}

impl ToSql for TaxBucket {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TaxBucket {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        TaxBucket::parse(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown tax bucket '{s}'").into()))
    }
}

/// Map `QueryReturnedNoRows` to `None`.
fn optional<T>(result: rusqlite::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests;
