use anyhow::Result;

use super::{
    expect_done, find_category, flag_value, has_flag, month_flag, parse_id, positional,
    property_id,
};
use crate::db::Database;
use crate::models::{Category, RecurringRule};
use crate::money;
use crate::recurring::{self, RuleForm};

pub(super) fn cli_rule(args: &[String], db: &mut Database) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("add") => rule_add(&args[1..], db),
        Some("update") => rule_update(&args[1..], db),
        Some("toggle") => rule_toggle(&args[1..], db),
        Some("delete") => rule_delete(&args[1..], db),
        Some("list") | None => rule_list(args.get(1..).unwrap_or_default(), db),
        Some(other) => anyhow::bail!("Unknown rule command: {other}"),
    }
}

/// Overlay any rule flags present in `args` onto `form`.
fn apply_flags(args: &[String], db: &Database, form: &mut RuleForm) -> Result<()> {
    if let Some(key) = flag_value(args, "--category") {
        form.category_id = find_category(db, key)?.id;
    }
    let fields = [
        ("--amount", &mut form.amount),
        ("--memo", &mut form.memo),
        ("--day", &mut form.day_of_month),
        ("--start", &mut form.start_month),
        ("--end", &mut form.end_month),
    ];
    for (flag, field) in fields {
        if let Some(value) = flag_value(args, flag) {
            *field = value.to_string();
        }
    }
    if has_flag(args, "--inactive") {
        form.is_active = false;
    }
    Ok(())
}

/// The form that would recreate `rule` unchanged.
fn form_from_rule(rule: &RecurringRule) -> RuleForm {
    RuleForm {
        category_id: rule.category_id,
        amount: format!("{}.{:02}", rule.amount / 100, rule.amount % 100),
        memo: rule.memo.clone().unwrap_or_default(),
        day_of_month: rule.day_of_month.to_string(),
        start_month: rule.start_month.to_string(),
        end_month: rule.end_month.map(|m| m.to_string()).unwrap_or_default(),
        is_active: rule.is_active,
    }
}

fn rule_id_arg(args: &[String], command: &str) -> Result<i64> {
    let Some(raw) = positional(args).first().copied() else {
        anyhow::bail!("Usage: propledger rule {command} <id>");
    };
    parse_id(raw, "rule")
}

fn rule_add(args: &[String], db: &mut Database) -> Result<()> {
    let pid = property_id(db, args)?;
    let mut form = RuleForm {
        is_active: true,
        ..RuleForm::default()
    };
    apply_flags(args, db, &mut form)?;

    let id = expect_done(recurring::create_recurring_rule(db, pid, &form)?)?;
    println!("Added recurring rule {id}");
    Ok(())
}

fn rule_update(args: &[String], db: &mut Database) -> Result<()> {
    let pid = property_id(db, args)?;
    let id = rule_id_arg(args, "update")?;
    let Some(existing) = db.get_recurring_rule(id, pid)? else {
        anyhow::bail!("Recurring rule {id} not found for this property");
    };
    let mut form = form_from_rule(&existing);
    apply_flags(args, db, &mut form)?;

    expect_done(recurring::update_recurring_rule(db, id, pid, &form)?)?;
    println!("Updated recurring rule {id}");
    Ok(())
}

fn rule_toggle(args: &[String], db: &mut Database) -> Result<()> {
    let pid = property_id(db, args)?;
    let id = rule_id_arg(args, "toggle")?;
    let Some(existing) = db.get_recurring_rule(id, pid)? else {
        anyhow::bail!("Recurring rule {id} not found for this property");
    };
    let is_active = !existing.is_active;

    expect_done(recurring::toggle_recurring_rule(db, id, pid, is_active)?)?;
    println!(
        "Recurring rule {id} {}",
        if is_active { "resumed" } else { "paused" }
    );
    Ok(())
}

fn rule_delete(args: &[String], db: &mut Database) -> Result<()> {
    let pid = property_id(db, args)?;
    let id = rule_id_arg(args, "delete")?;
    expect_done(recurring::delete_recurring_rule(db, id, pid)?)?;
    println!("Deleted recurring rule {id} (posted transactions kept)");
    Ok(())
}

fn rule_list(args: &[String], db: &mut Database) -> Result<()> {
    let pid = property_id(db, args)?;
    if !db.recurring_tables_ready()? {
        anyhow::bail!("Recurring rules are not available on this database. Run: propledger migrate");
    }
    let rules = db.get_recurring_rules(pid)?;
    if rules.is_empty() {
        println!("No recurring rules");
        return Ok(());
    }

    let categories = db.get_categories()?;
    println!(
        "{:<4} {:<20} {:>12} {:>4} {:<8} {:<8} {:<7} {:>6} Memo",
        "ID", "Category", "Amount", "Day", "Start", "End", "Active", "Posted"
    );
    println!("{}", "─".repeat(88));
    for r in &rules {
        let category = r
            .category_id
            .and_then(|id| Category::find_by_id(&categories, id))
            .map(|c| c.name.as_str())
            .unwrap_or("(deleted)");
        let posted = match r.id {
            Some(id) => db.get_postings(id)?.len(),
            None => 0,
        };
        println!(
            "{:<4} {:<20} {:>12} {:>4} {:<8} {:<8} {:<7} {:>6} {}",
            r.id.unwrap_or(0),
            money::truncate(category, 20),
            money::format_cents(r.amount),
            r.day_of_month,
            r.start_month.to_string(),
            r.end_month.map(|m| m.to_string()).unwrap_or_else(|| "—".into()),
            if r.is_active { "yes" } else { "no" },
            posted,
            r.memo.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}

pub(super) fn cli_schedule(args: &[String], db: &mut Database) -> Result<()> {
    let pid = property_id(db, args)?;
    let month = month_flag(args, "--month")?;
    let outcome = if has_flag(args, "--all") {
        recurring::resolve_schedule(db, pid, month, true)?
    } else {
        recurring::resolve_schedule_for_month(db, pid, month)?
    };
    let items = expect_done(outcome)?;

    println!("Recurring schedule — {month}");
    println!("{}", "─".repeat(60));
    if items.is_empty() {
        println!("  Nothing due");
        return Ok(());
    }
    for item in &items {
        let status = if !item.is_active {
            "paused"
        } else if item.already_posted {
            "posted"
        } else {
            "due"
        };
        println!(
            "  {}  {:<24} {:>12}  {status}",
            item.due_date,
            money::truncate(&item.category.name, 24),
            money::format_cents(money::normalize(
                item.amount_cents,
                item.category.category_type
            )),
        );
    }
    Ok(())
}

pub(super) fn cli_post(args: &[String], db: &mut Database) -> Result<()> {
    let pid = property_id(db, args)?;
    let month = month_flag(args, "--month")?;
    let posted = expect_done(recurring::post_for_month(db, pid, month)?)?;
    if posted == 0 {
        println!("Nothing new to post for {month}");
    } else {
        println!("Posted {posted} recurring transaction(s) for {month}");
    }
    Ok(())
}

pub(super) fn cli_catch_up(args: &[String], db: &mut Database) -> Result<()> {
    let pid = property_id(db, args)?;
    let through = month_flag(args, "--through")?;
    let posted = expect_done(recurring::post_catch_up_through_month(db, pid, through)?)?;
    if posted == 0 {
        println!("Up to date through {through}");
    } else {
        println!("Posted {posted} recurring transaction(s) through {through}");
    }
    Ok(())
}
