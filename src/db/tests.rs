#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;

use super::recurring::{is_unique_violation, write_posting};
use super::*;
use crate::models::*;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn month(s: &str) -> Month {
    s.parse().unwrap()
}

fn category_id(db: &Database, name: &str) -> i64 {
    let cats = db.get_categories().unwrap();
    Category::find_by_name(&cats, name).and_then(|c| c.id).unwrap()
}

fn setup_property(db: &Database) -> i64 {
    db.insert_property(&Property::new("Maple Duplex".into())).unwrap()
}

fn make_rule(property_id: i64, category_id: i64) -> RecurringRule {
    RecurringRule {
        id: None,
        property_id,
        category_id: Some(category_id),
        amount: 20000,
        memo: None,
        day_of_month: 5,
        start_month: month("2024-01"),
        end_month: None,
        is_active: true,
    }
}

// ── Schema ────────────────────────────────────────────────────

#[test]
fn test_fresh_database_is_fully_migrated() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(db.schema_version().unwrap(), schema::CURRENT_VERSION);
    assert!(db.recurring_tables_ready().unwrap());
}

#[test]
fn test_unmigrated_database_lacks_recurring_tables() {
    let mut db = Database::open_in_memory_unmigrated().unwrap();
    assert_eq!(db.schema_version().unwrap(), 1);
    assert!(!db.recurring_tables_ready().unwrap());

    assert_eq!(db.migrate().unwrap(), 1);
    assert!(db.recurring_tables_ready().unwrap());
    assert_eq!(db.schema_version().unwrap(), schema::CURRENT_VERSION);

    // Nothing left to apply
    assert_eq!(db.migrate().unwrap(), 0);
}

#[test]
fn test_reopen_file_database_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    {
        let db = Database::open(&path, true).unwrap();
        setup_property(&db);
    }
    let db = Database::open(&path, true).unwrap();
    assert_eq!(db.get_properties().unwrap().len(), 1);
    assert_eq!(db.schema_version().unwrap(), schema::CURRENT_VERSION);
}

#[test]
fn test_file_database_without_auto_migrate_stays_at_v1() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let db = Database::open(&path, false).unwrap();
    assert!(!db.recurring_tables_ready().unwrap());
    drop(db);

    let db = Database::open(&path, true).unwrap();
    assert!(db.recurring_tables_ready().unwrap());
}

// ── Default data ──────────────────────────────────────────────

#[test]
fn test_default_categories_seeded_with_types() {
    let db = Database::open_in_memory().unwrap();
    let cats = db.get_categories().unwrap();
    let rent = Category::find_by_name(&cats, "Rent").unwrap();
    assert_eq!(rent.category_type, CategoryType::Income);
    let hoa = Category::find_by_name(&cats, "HOA").unwrap();
    assert_eq!(hoa.category_type, CategoryType::Expense);
    let contribution = Category::find_by_name(&cats, "Owner Contribution").unwrap();
    assert_eq!(contribution.category_type, CategoryType::Transfer);
}

// ── Properties ────────────────────────────────────────────────

#[test]
fn test_property_crud() {
    let db = Database::open_in_memory().unwrap();
    let mut p = Property::new("Oak Street".into());
    p.city = "Austin".into();
    p.equity = Some(5_000_000);
    let id = db.insert_property(&p).unwrap();

    let fetched = db.get_property_by_id(id).unwrap().unwrap();
    assert_eq!(fetched.nickname, "Oak Street");
    assert_eq!(fetched.city, "Austin");
    assert_eq!(fetched.equity, Some(5_000_000));
    assert!(db.get_property_by_id(id + 100).unwrap().is_none());
}

// ── Categories ────────────────────────────────────────────────

#[test]
fn test_category_with_tax_bucket_override() {
    let db = Database::open_in_memory().unwrap();
    let mut cat = Category::new("Lawn Service".into(), CategoryType::Expense);
    cat.tax_bucket = Some(TaxBucket::CleaningAndMaintenance);
    let id = db.insert_category(&cat).unwrap();

    let fetched = db.get_category_by_id(id).unwrap().unwrap();
    assert_eq!(fetched.tax_bucket, Some(TaxBucket::CleaningAndMaintenance));
    assert_eq!(fetched.category_type, CategoryType::Expense);
}

#[test]
fn test_delete_category_in_use_fails() {
    let db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    let hoa = category_id(&db, "HOA");
    db.insert_transaction(&Transaction::new(pid, ymd(2024, 1, 5), hoa, 100))
        .unwrap();
    assert!(db.delete_category(hoa).is_err());
}

#[test]
fn test_delete_category_nulls_rule_category() {
    let db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    let cid = db
        .insert_category(&Category::new("Pool Service".into(), CategoryType::Expense))
        .unwrap();
    let rule_id = db.insert_recurring_rule(&make_rule(pid, cid)).unwrap();

    assert!(db.delete_category(cid).unwrap());
    let rule = db.get_recurring_rule(rule_id, pid).unwrap().unwrap();
    assert!(rule.category_id.is_none());
}

// ── Transactions ──────────────────────────────────────────────

#[test]
fn test_insert_transaction_normalizes_sign() {
    let db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);

    let expense = db
        .insert_transaction(&Transaction::new(pid, ymd(2024, 1, 5), category_id(&db, "Repairs"), 4500))
        .unwrap();
    let income = db
        .insert_transaction(&Transaction::new(pid, ymd(2024, 1, 1), category_id(&db, "Rent"), -150000))
        .unwrap();
    let transfer = db
        .insert_transaction(&Transaction::new(
            pid,
            ymd(2024, 1, 2),
            category_id(&db, "Owner Distribution"),
            -30000,
        ))
        .unwrap();

    assert_eq!(db.get_transaction_by_id(expense).unwrap().unwrap().amount, -4500);
    assert_eq!(db.get_transaction_by_id(income).unwrap().unwrap().amount, 150000);
    assert_eq!(db.get_transaction_by_id(transfer).unwrap().unwrap().amount, -30000);
}

#[test]
fn test_insert_transaction_unknown_category_fails() {
    let db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    assert!(db
        .insert_transaction(&Transaction::new(pid, ymd(2024, 1, 5), 99999, 100))
        .is_err());
}

#[test]
fn test_soft_delete_and_restore() {
    let db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    let id = db
        .insert_transaction(&Transaction::new(pid, ymd(2024, 3, 1), category_id(&db, "Rent"), 100000))
        .unwrap();

    assert!(db.soft_delete_transaction(id).unwrap());
    assert!(!db.soft_delete_transaction(id).unwrap());
    assert!(db.get_transactions(Some(pid), None, false).unwrap().is_empty());
    assert_eq!(db.get_transactions(Some(pid), None, true).unwrap().len(), 1);
    assert!(db
        .ledger_rows(Some(pid), ymd(2024, 1, 1), ymd(2025, 1, 1))
        .unwrap()
        .is_empty());

    assert!(db.restore_transaction(id).unwrap());
    assert!(!db.restore_transaction(id).unwrap());
    assert_eq!(db.get_transactions(Some(pid), None, false).unwrap().len(), 1);
}

#[test]
fn test_get_transactions_by_month() {
    let db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    let rent = category_id(&db, "Rent");
    for date in [ymd(2024, 1, 31), ymd(2024, 2, 1), ymd(2024, 2, 29), ymd(2024, 3, 1)] {
        db.insert_transaction(&Transaction::new(pid, date, rent, 100)).unwrap();
    }
    let feb = db.get_transactions(Some(pid), Some(month("2024-02")), false).unwrap();
    assert_eq!(feb.len(), 2);
    // Newest first
    assert_eq!(feb[0].date, ymd(2024, 2, 29));
}

#[test]
fn test_ledger_rows_half_open_window() {
    let db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    let other = db.insert_property(&Property::new("Other".into())).unwrap();
    let rent = category_id(&db, "Rent");
    db.insert_transaction(&Transaction::new(pid, ymd(2024, 1, 1), rent, 100)).unwrap();
    db.insert_transaction(&Transaction::new(pid, ymd(2024, 1, 31), rent, 200)).unwrap();
    db.insert_transaction(&Transaction::new(pid, ymd(2024, 2, 1), rent, 400)).unwrap();
    db.insert_transaction(&Transaction::new(other, ymd(2024, 1, 15), rent, 800)).unwrap();

    let rows = db.ledger_rows(Some(pid), ymd(2024, 1, 1), ymd(2024, 2, 1)).unwrap();
    let total: i64 = rows.iter().map(|r| r.amount).sum();
    assert_eq!(total, 300);

    let all = db.ledger_rows(None, ymd(2024, 1, 1), ymd(2024, 2, 1)).unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn test_ledger_rows_with_statements_includes_billed_months() {
    let db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    let util = category_id(&db, "Utilities");
    let mut late_bill = Transaction::new(pid, ymd(2024, 4, 10), util, 9000);
    late_bill.statement_month = Some(month("2024-03"));
    db.insert_transaction(&late_bill).unwrap();

    let rows = db
        .ledger_rows_with_statements(
            Some(pid),
            ymd(2024, 3, 1),
            ymd(2024, 4, 1),
            month("2024-03")..=month("2024-03"),
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].statement_month, Some(month("2024-03")));
    assert!(db.ledger_rows(Some(pid), ymd(2024, 3, 1), ymd(2024, 4, 1)).unwrap().is_empty());
}

// ── Annual amounts ────────────────────────────────────────────

#[test]
fn test_annual_amount_upsert_replaces_and_normalizes() {
    let db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    let tax = category_id(&db, "Property Tax");

    let first = db
        .upsert_annual_amount(&AnnualCategoryAmount::new(pid, 2024, tax, 120000))
        .unwrap();
    let second = db
        .upsert_annual_amount(&AnnualCategoryAmount::new(pid, 2024, tax, 130000))
        .unwrap();
    assert_eq!(first, second);

    let rows = db.get_annual_amounts(Some(pid), 2024..=2024).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, -130000);
    assert!(rows[0].owner.is_none());
}

#[test]
fn test_annual_amounts_split_by_owner() {
    let db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    let tax = category_id(&db, "Property Tax");
    for (owner, amount) in [("Alex", 60000), ("Sam", 40000)] {
        let mut row = AnnualCategoryAmount::new(pid, 2024, tax, amount);
        row.owner = Some(owner.into());
        db.upsert_annual_amount(&row).unwrap();
    }
    let rows = db.get_annual_amounts(None, 2023..=2025).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.iter().map(|r| r.amount).sum::<i64>(), -100000);
}

// ── Recurring rules ───────────────────────────────────────────

#[test]
fn test_recurring_rule_crud_scoped_to_property() {
    let db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    let other = db.insert_property(&Property::new("Other".into())).unwrap();
    let hoa = category_id(&db, "HOA");
    let id = db.insert_recurring_rule(&make_rule(pid, hoa)).unwrap();

    assert!(db.get_recurring_rule(id, other).unwrap().is_none());
    assert!(!db.set_recurring_rule_active(id, other, false).unwrap());

    assert!(db.set_recurring_rule_active(id, pid, false).unwrap());
    assert!(!db.get_recurring_rule(id, pid).unwrap().unwrap().is_active);

    let mut edited = make_rule(pid, hoa);
    edited.amount = 25000;
    edited.end_month = Some(month("2024-12"));
    assert!(db.update_recurring_rule(id, &edited).unwrap());
    let fetched = db.get_recurring_rule(id, pid).unwrap().unwrap();
    assert_eq!(fetched.amount, 25000);
    assert_eq!(fetched.end_month, Some(month("2024-12")));
    assert!(fetched.is_active);
}

#[test]
fn test_rule_end_before_start_rejected_by_schema() {
    let db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    let mut rule = make_rule(pid, category_id(&db, "HOA"));
    rule.end_month = Some(month("2023-12"));
    assert!(db.insert_recurring_rule(&rule).is_err());
}

#[test]
fn test_earliest_active_start_month() {
    let db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    let hoa = category_id(&db, "HOA");
    assert!(db.earliest_active_start_month(pid).unwrap().is_none());

    let mut old_inactive = make_rule(pid, hoa);
    old_inactive.start_month = month("2020-01");
    old_inactive.is_active = false;
    db.insert_recurring_rule(&old_inactive).unwrap();
    let mut active = make_rule(pid, hoa);
    active.start_month = month("2023-06");
    db.insert_recurring_rule(&active).unwrap();

    assert_eq!(db.earliest_active_start_month(pid).unwrap(), Some(month("2023-06")));
}

// ── Postings ──────────────────────────────────────────────────

fn posting_txn(pid: i64, cid: i64) -> Transaction {
    let mut txn = Transaction::new(pid, ymd(2024, 1, 5), cid, -20000);
    txn.memo = "Recurring: HOA".into();
    txn
}

#[test]
fn test_post_recurring_is_idempotent() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    let hoa = category_id(&db, "HOA");
    let rule_id = db.insert_recurring_rule(&make_rule(pid, hoa)).unwrap();
    let txn = posting_txn(pid, hoa);

    let first = db.post_recurring(rule_id, month("2024-01"), &txn).unwrap();
    assert!(matches!(first, PostResult::Posted { .. }));
    let second = db.post_recurring(rule_id, month("2024-01"), &txn).unwrap();
    assert_eq!(second, PostResult::AlreadyPosted);

    assert_eq!(db.get_transactions(Some(pid), None, false).unwrap().len(), 1);
    let postings = db.get_postings(rule_id).unwrap();
    assert_eq!(postings.len(), 1);
    if let PostResult::Posted { transaction_id } = first {
        assert_eq!(postings[0].ledger_transaction_id, transaction_id);
    }
    assert!(db.posted_rule_ids(pid, month("2024-01")).unwrap().contains(&rule_id));
    assert!(db.posted_rule_ids(pid, month("2024-02")).unwrap().is_empty());
}

#[test]
fn test_unique_constraint_backstops_skipped_check() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    let hoa = category_id(&db, "HOA");
    let rule_id = db.insert_recurring_rule(&make_rule(pid, hoa)).unwrap();
    let txn = posting_txn(pid, hoa);
    db.post_recurring(rule_id, month("2024-01"), &txn).unwrap();

    // Skip the pre-check, as a racing writer would
    let tx = db.conn.transaction().unwrap();
    let result = write_posting(&tx, rule_id, month("2024-01"), &txn).unwrap();
    assert_eq!(result, PostResult::AlreadyPosted);
    drop(tx);

    assert_eq!(db.get_transactions(Some(pid), None, false).unwrap().len(), 1);
}

// ── Concurrent posting ────────────────────────────────────────

/// Two handles on one file database, with a property and an HOA rule.
fn open_pair(dir: &tempfile::TempDir) -> (Database, Database, i64, i64, i64) {
    let path = dir.path().join("ledger.db");
    let a = Database::open(&path, true).unwrap();
    let pid = setup_property(&a);
    let hoa = category_id(&a, "HOA");
    let rule_id = a.insert_recurring_rule(&make_rule(pid, hoa)).unwrap();
    let b = Database::open(&path, true).unwrap();
    (a, b, pid, hoa, rule_id)
}

#[test]
fn test_second_connection_sees_posting_as_already_posted() {
    let dir = tempfile::tempdir().unwrap();
    let (mut a, mut b, pid, hoa, rule_id) = open_pair(&dir);
    let txn = posting_txn(pid, hoa);

    let first = a.post_recurring(rule_id, month("2024-01"), &txn).unwrap();
    assert!(matches!(first, PostResult::Posted { .. }));
    let second = b.post_recurring(rule_id, month("2024-01"), &txn).unwrap();
    assert_eq!(second, PostResult::AlreadyPosted);

    assert_eq!(b.get_transactions(Some(pid), None, false).unwrap().len(), 1);
    assert_eq!(b.get_postings(rule_id).unwrap().len(), 1);
}

#[test]
fn test_posting_waits_for_writer_then_reports_already_posted() {
    let dir = tempfile::tempdir().unwrap();
    let (mut a, mut b, pid, hoa, rule_id) = open_pair(&dir);
    let txn = posting_txn(pid, hoa);
    let (locked, wait_for_lock) = std::sync::mpsc::channel();

    // A takes the write lock first and commits the same posting while B waits
    let writer = {
        let txn = txn.clone();
        std::thread::spawn(move || {
            let tx = a
                .conn
                .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
                .unwrap();
            locked.send(()).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(200));
            let result = write_posting(&tx, rule_id, month("2024-01"), &txn).unwrap();
            tx.commit().unwrap();
            result
        })
    };
    wait_for_lock.recv().unwrap();

    let second = b.post_recurring(rule_id, month("2024-01"), &txn).unwrap();
    let first = writer.join().unwrap();
    assert!(matches!(first, PostResult::Posted { .. }));
    assert_eq!(second, PostResult::AlreadyPosted);

    assert_eq!(b.get_transactions(Some(pid), None, false).unwrap().len(), 1);
    assert_eq!(b.get_postings(rule_id).unwrap().len(), 1);
}

#[test]
fn test_is_unique_violation_ignores_other_constraints() {
    let db = Database::open_in_memory().unwrap();
    let err = db
        .conn()
        .execute(
            "INSERT INTO transactions (property_id, date, category_id, amount, created_at)
             VALUES (424242, '2024-01-01', 1, 1, '')",
            [],
        )
        .unwrap_err();
    assert!(!is_unique_violation(&err));
}

#[test]
fn test_delete_rule_cascades_postings_but_keeps_ledger() {
    let mut db = Database::open_in_memory().unwrap();
    let pid = setup_property(&db);
    let hoa = category_id(&db, "HOA");
    let rule_id = db.insert_recurring_rule(&make_rule(pid, hoa)).unwrap();
    db.post_recurring(rule_id, month("2024-01"), &posting_txn(pid, hoa))
        .unwrap();

    assert!(db.delete_recurring_rule(rule_id, pid).unwrap());
    assert!(db.get_postings(rule_id).unwrap().is_empty());
    assert_eq!(db.get_transactions(Some(pid), None, false).unwrap().len(), 1);
}
