pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS properties (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    nickname    TEXT NOT NULL,
    street      TEXT NOT NULL DEFAULT '',
    city        TEXT NOT NULL DEFAULT '',
    state       TEXT NOT NULL DEFAULT '',
    zip         TEXT NOT NULL DEFAULT '',
    equity      INTEGER,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL UNIQUE,
    category_type TEXT NOT NULL CHECK (category_type IN ('income', 'expense', 'transfer')),
    parent_id     INTEGER REFERENCES categories(id) ON DELETE SET NULL,
    tax_bucket    TEXT
);

CREATE TABLE IF NOT EXISTS transactions (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    property_id     INTEGER NOT NULL REFERENCES properties(id),
    date            TEXT NOT NULL,
    category_id     INTEGER NOT NULL REFERENCES categories(id),
    amount          INTEGER NOT NULL,
    memo            TEXT NOT NULL DEFAULT '',
    source          TEXT NOT NULL DEFAULT 'manual',
    statement_month TEXT,
    deleted_at      TEXT,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
CREATE INDEX IF NOT EXISTS idx_transactions_property ON transactions(property_id);
CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);
CREATE INDEX IF NOT EXISTS idx_transactions_statement_month ON transactions(statement_month);

CREATE TABLE IF NOT EXISTS annual_category_amounts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    property_id INTEGER NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
    year        INTEGER NOT NULL,
    category_id INTEGER NOT NULL REFERENCES categories(id),
    amount      INTEGER NOT NULL,
    note        TEXT NOT NULL DEFAULT '',
    owner       TEXT NOT NULL DEFAULT ''
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_annual_unique
    ON annual_category_amounts(property_id, year, category_id, owner);
"#;

pub(crate) const RECURRING_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS recurring_rules (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    property_id   INTEGER NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
    category_id   INTEGER REFERENCES categories(id) ON DELETE SET NULL,
    amount        INTEGER NOT NULL CHECK (amount > 0),
    memo          TEXT,
    day_of_month  INTEGER NOT NULL CHECK (day_of_month BETWEEN 1 AND 28),
    start_month   TEXT NOT NULL,
    end_month     TEXT,
    is_active     BOOLEAN NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    CHECK (end_month IS NULL OR end_month >= start_month)
);

CREATE INDEX IF NOT EXISTS idx_recurring_rules_property ON recurring_rules(property_id);

CREATE TABLE IF NOT EXISTS recurring_postings (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    recurring_rule_id     INTEGER NOT NULL REFERENCES recurring_rules(id) ON DELETE CASCADE,
    month                 TEXT NOT NULL,
    ledger_transaction_id INTEGER NOT NULL REFERENCES transactions(id),
    created_at            TEXT NOT NULL,
    UNIQUE(recurring_rule_id, month)
);
"#;

pub(crate) const RECURRING_TABLE_NAMES: &[&str] = &["recurring_rules", "recurring_postings"];

pub(crate) const CURRENT_VERSION: i32 = 2;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[(1, RECURRING_TABLES)];
