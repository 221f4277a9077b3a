use anyhow::Result;
use chrono::NaiveDate;

use super::{
    find_category, flag_value, has_flag, optional_property_id, parse_id, parse_month,
    positional, property_id, required_flag,
};
use crate::db::Database;
use crate::models::{
    AnnualCategoryAmount, Category, CategoryType, Month, Property, TaxBucket, Transaction,
};
use crate::money;

// ── Properties ───────────────────────────────────────────────

pub(super) fn cli_property(args: &[String], db: &mut Database) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("add") => property_add(&args[1..], db),
        Some("list") | None => property_list(db),
        Some(other) => anyhow::bail!("Unknown property command: {other}"),
    }
}

fn property_add(args: &[String], db: &mut Database) -> Result<()> {
    let usage = "propledger property add <nickname> [--street s] [--city c] [--state st] [--zip z] [--equity amount]";
    let Some(nickname) = positional(args).first().map(|s| s.trim().to_string()) else {
        anyhow::bail!("Usage: {usage}");
    };
    if nickname.is_empty() {
        anyhow::bail!("Usage: {usage}");
    }

    let mut property = Property::new(nickname);
    let text = |name: &str| flag_value(args, name).unwrap_or_default().trim().to_string();
    property.street = text("--street");
    property.city = text("--city");
    property.state = text("--state");
    property.zip = text("--zip");
    property.equity = flag_value(args, "--equity")
        .map(money::parse_dollars)
        .transpose()?;

    let id = db.insert_property(&property)?;
    tracing::info!(property_id = id, "created property");
    println!("Added property {id}: {property}");
    Ok(())
}

fn property_list(db: &Database) -> Result<()> {
    let properties = db.get_properties()?;
    if properties.is_empty() {
        println!("No properties");
        return Ok(());
    }

    println!("{:<4} {:<24} {:<14} Address", "ID", "Nickname", "Equity");
    println!("{}", "─".repeat(72));
    for p in &properties {
        println!(
            "{:<4} {:<24} {:<14} {}",
            p.id.unwrap_or(0),
            money::truncate(&p.nickname, 24),
            p.equity.map(money::format_cents).unwrap_or_default(),
            p.address(),
        );
    }
    Ok(())
}

// ── Categories ───────────────────────────────────────────────

pub(super) fn cli_category(args: &[String], db: &mut Database) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("list") | None => category_list(db),
        Some("add") => category_add(&args[1..], db),
        Some("delete") => category_delete(&args[1..], db),
        Some(other) => anyhow::bail!("Unknown category command: {other}"),
    }
}

fn category_list(db: &Database) -> Result<()> {
    let categories = db.get_categories()?;
    println!("{:<4} {:<28} {:<10} Schedule E", "ID", "Name", "Type");
    println!("{}", "─".repeat(60));
    for c in &categories {
        println!(
            "{:<4} {:<28} {:<10} {}",
            c.id.unwrap_or(0),
            money::truncate(&c.name, 28),
            c.category_type.as_str(),
            c.tax_bucket.map(|b| b.label()).unwrap_or("(by name)"),
        );
    }
    Ok(())
}

fn category_add(args: &[String], db: &mut Database) -> Result<()> {
    let usage = "propledger category add <name> --type <income|expense|transfer> [--tax-bucket line] [--parent category]";
    let Some(name) = positional(args).first().map(|s| s.trim().to_string()) else {
        anyhow::bail!("Usage: {usage}");
    };
    let raw_type = required_flag(args, "--type", usage)?;
    let category_type = CategoryType::parse(raw_type).ok_or_else(|| {
        let types: Vec<&str> = CategoryType::all().iter().map(|t| t.as_str()).collect();
        anyhow::anyhow!("Unknown category type: {raw_type}. Expected one of: {}", types.join(", "))
    })?;

    if Category::find_by_name(&db.get_categories()?, &name).is_some() {
        anyhow::bail!("Category '{name}' already exists");
    }

    let mut category = Category::new(name, category_type);
    if let Some(raw) = flag_value(args, "--tax-bucket") {
        let bucket = TaxBucket::parse(raw).ok_or_else(|| {
            let keys: Vec<&str> = TaxBucket::all().iter().map(|b| b.as_str()).collect();
            anyhow::anyhow!("Unknown tax bucket: {raw}. Expected one of: {}", keys.join(", "))
        })?;
        category.tax_bucket = Some(bucket);
    }
    if let Some(parent) = flag_value(args, "--parent") {
        category.parent_id = find_category(db, parent)?.id;
    }

    let id = db.insert_category(&category)?;
    println!("Added category {id}: {category} ({})", category.category_type);
    Ok(())
}

fn category_delete(args: &[String], db: &mut Database) -> Result<()> {
    let Some(key) = positional(args).first().copied() else {
        anyhow::bail!("Usage: propledger category delete <category>");
    };
    let category = find_category(db, key)?;
    let id = category
        .id
        .ok_or_else(|| anyhow::anyhow!("Category has no ID"))?;
    if db.delete_category(id)? {
        tracing::info!(category_id = id, "deleted category");
        println!("Deleted category: {category}");
    }
    Ok(())
}

// ── Transactions ─────────────────────────────────────────────

pub(super) fn cli_txn(args: &[String], db: &mut Database) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("add") => txn_add(&args[1..], db),
        Some("list") | None => txn_list(args.get(1..).unwrap_or_default(), db),
        Some("delete") => txn_set_deleted(&args[1..], db, true),
        Some("restore") => txn_set_deleted(&args[1..], db, false),
        Some(other) => anyhow::bail!("Unknown txn command: {other}"),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date '{raw}', expected YYYY-MM-DD"))
}

fn txn_add(args: &[String], db: &mut Database) -> Result<()> {
    let usage = "propledger txn add --date YYYY-MM-DD --category c --amount amount [--memo m] [--statement-month YYYY-MM]";
    let pid = property_id(db, args)?;
    let date = parse_date(required_flag(args, "--date", usage)?)?;
    let category = find_category(db, required_flag(args, "--category", usage)?)?;
    let category_id = category
        .id
        .ok_or_else(|| anyhow::anyhow!("Category has no ID"))?;
    let amount = money::parse_dollars(required_flag(args, "--amount", usage)?)?;

    let mut txn = Transaction::new(pid, date, category_id, amount);
    txn.memo = flag_value(args, "--memo").unwrap_or_default().to_string();
    txn.statement_month = flag_value(args, "--statement-month")
        .map(parse_month)
        .transpose()?;

    let id = db.insert_transaction(&txn)?;
    let stored = money::normalize(amount, category.category_type);
    println!(
        "Added transaction {id}: {date} {category} {}",
        money::format_cents(stored)
    );
    Ok(())
}

fn txn_list(args: &[String], db: &Database) -> Result<()> {
    let pid = optional_property_id(db, args)?;
    let month: Option<Month> = flag_value(args, "--month").map(parse_month).transpose()?;
    let txns = db.get_transactions(pid, month, has_flag(args, "--deleted"))?;
    if txns.is_empty() {
        println!("No transactions");
        return Ok(());
    }

    let categories = db.get_categories()?;
    println!(
        "{:<5} {:<10} {:<20} {:>12} {:<8} Memo",
        "ID", "Date", "Category", "Amount", "Billed"
    );
    println!("{}", "─".repeat(76));
    for t in &txns {
        let category = Category::find_by_id(&categories, t.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        let memo = if t.is_deleted() {
            format!("[deleted] {}", t.memo)
        } else {
            t.memo.clone()
        };
        println!(
            "{:<5} {:<10} {:<20} {:>12} {:<8} {}",
            t.id.unwrap_or(0),
            t.date.to_string(),
            money::truncate(category, 20),
            money::format_cents(t.amount),
            t.statement_month.map(|m| m.to_string()).unwrap_or_default(),
            money::truncate(&memo, 40),
        );
    }
    Ok(())
}

fn txn_set_deleted(args: &[String], db: &mut Database, delete: bool) -> Result<()> {
    let verb = if delete { "delete" } else { "restore" };
    let Some(raw) = positional(args).first().copied() else {
        anyhow::bail!("Usage: propledger txn {verb} <id>");
    };
    let id = parse_id(raw, "transaction")?;
    if db.get_transaction_by_id(id)?.is_none() {
        anyhow::bail!("Transaction {id} not found");
    }
    let changed = if delete {
        db.soft_delete_transaction(id)?
    } else {
        db.restore_transaction(id)?
    };
    if changed {
        tracing::info!(transaction_id = id, verb, "updated transaction");
        println!("Transaction {id}: {verb}d");
    } else {
        println!("Transaction {id}: nothing to {verb}");
    }
    Ok(())
}

// ── Annual amounts ───────────────────────────────────────────

pub(super) fn cli_annual(args: &[String], db: &mut Database) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("set") => annual_set(&args[1..], db),
        Some("list") | None => annual_list(args.get(1..).unwrap_or_default(), db),
        Some(other) => anyhow::bail!("Unknown annual command: {other}"),
    }
}

fn parse_year(raw: &str) -> Result<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|y| (1000..=9999).contains(y))
        .ok_or_else(|| anyhow::anyhow!("Invalid year: {raw}"))
}

fn annual_set(args: &[String], db: &mut Database) -> Result<()> {
    let usage = "propledger annual set --year YYYY --category c --amount amount [--owner name] [--note text]";
    let pid = property_id(db, args)?;
    let year = parse_year(required_flag(args, "--year", usage)?)?;
    let category = find_category(db, required_flag(args, "--category", usage)?)?;
    let category_id = category
        .id
        .ok_or_else(|| anyhow::anyhow!("Category has no ID"))?;
    let amount = money::parse_dollars(required_flag(args, "--amount", usage)?)?;

    let mut annual = AnnualCategoryAmount::new(pid, year, category_id, amount);
    annual.note = flag_value(args, "--note").unwrap_or_default().to_string();
    annual.owner = flag_value(args, "--owner")
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from);

    db.upsert_annual_amount(&annual)?;
    println!(
        "Set {year} {category}: {}",
        money::format_cents(money::normalize(amount, category.category_type))
    );
    Ok(())
}

fn annual_list(args: &[String], db: &Database) -> Result<()> {
    let pid = optional_property_id(db, args)?;
    let years = match flag_value(args, "--year") {
        Some(raw) => {
            let y = parse_year(raw)?;
            y..=y
        }
        None => 1000..=9999,
    };
    let rows = db.get_annual_amounts(pid, years)?;
    if rows.is_empty() {
        println!("No annual amounts");
        return Ok(());
    }

    let categories = db.get_categories()?;
    let properties = db.get_properties()?;
    println!(
        "{:<20} {:<6} {:<24} {:>12} {:<12} Note",
        "Property", "Year", "Category", "Amount", "Owner"
    );
    println!("{}", "─".repeat(84));
    for a in &rows {
        let property = properties
            .iter()
            .find(|p| p.id == Some(a.property_id))
            .map(|p| p.nickname.as_str())
            .unwrap_or("?");
        let category = Category::find_by_id(&categories, a.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        println!(
            "{:<20} {:<6} {:<24} {:>12} {:<12} {}",
            money::truncate(property, 20),
            a.year,
            money::truncate(category, 24),
            money::format_cents(a.amount),
            a.owner.as_deref().unwrap_or(""),
            a.note,
        );
    }
    Ok(())
}
