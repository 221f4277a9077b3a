use anyhow::Result;
use std::path::PathBuf;

use super::{flag_value, has_flag, optional_property_id};
use crate::config::expand_home;
use crate::db::Database;
use crate::reports::{self, DateRange, ReportQuery, ReportTable};

const KINDS: &str = "pnl|net|cash-accrual|schedule-e|rental|leaderboard|trend";

pub(super) fn cli_report(args: &[String], db: &mut Database) -> Result<()> {
    let Some(kind) = args.first().map(String::as_str) else {
        anyhow::bail!("Usage: propledger report <{KINDS}> [--from D --to D | --year Y]");
    };
    let rest = &args[1..];
    let query = build_query(rest, db)?;
    let table = run_report(kind, db, &query)?;

    print!("{}", table.render());
    if let Some(path) = flag_value(rest, "--csv") {
        let path = PathBuf::from(expand_home(path));
        let rows = table.write_csv(&path)?;
        println!("Wrote {rows} rows to {}", path.display());
    }
    Ok(())
}

fn build_query(args: &[String], db: &Database) -> Result<ReportQuery> {
    let range = match (
        flag_value(args, "--from"),
        flag_value(args, "--to"),
        flag_value(args, "--year"),
    ) {
        (Some(from), Some(to), _) => DateRange::parse(from, to)?,
        (None, None, Some(year)) => {
            let y: i32 = year
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid year: {year}"))?;
            DateRange::year(y).ok_or_else(|| anyhow::anyhow!("Invalid year: {year}"))?
        }
        (None, None, None) => {
            let y = chrono::Datelike::year(&chrono::Local::now().date_naive());
            DateRange::year(y).ok_or_else(|| anyhow::anyhow!("Invalid year: {y}"))?
        }
        _ => anyhow::bail!("Use --from and --to together, or --year"),
    };

    let mut query = ReportQuery::new(range).with_transfers(has_flag(args, "--include-transfers"));
    if let Some(pid) = optional_property_id(db, args)? {
        query = query.for_property(pid);
    }
    Ok(query)
}

fn run_report(kind: &str, db: &Database, query: &ReportQuery) -> Result<ReportTable> {
    let table = match kind {
        "pnl" => reports::profit_and_loss(db, query)?.to_table(),
        "net" => reports::net_profit(db, query)?.to_table(),
        "cash-accrual" => reports::cash_vs_accrual(db, query)?.to_table(),
        "schedule-e" => reports::schedule_e(db, query)?.to_table(),
        "rental" => reports::rental_income(db, query)?.to_table(),
        "leaderboard" => reports::portfolio_leaderboard(db, query)?.to_table(),
        "trend" => reports::income_expense_trend(db, query)?.to_table(),
        other => anyhow::bail!("Unknown report: {other}. Expected one of: {KINDS}"),
    };
    tracing::debug!(
        kind,
        range = %query.range,
        days = query.range.days(),
        rows = table.rows.len(),
        "built report"
    );
    Ok(table)
}
