use anyhow::Result;

use super::{ledger, recurring, reports};
use crate::config::Config;
use crate::db::Database;

pub(crate) fn as_cli(args: &[String], config: &Config) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("propledger {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "migrate" => cli_migrate(config),
        command => {
            let mut db = open(config)?;
            match command {
                "property" => ledger::cli_property(rest, &mut db),
                "category" => ledger::cli_category(rest, &mut db),
                "txn" => ledger::cli_txn(rest, &mut db),
                "annual" => ledger::cli_annual(rest, &mut db),
                "rule" => recurring::cli_rule(rest, &mut db),
                "schedule" => recurring::cli_schedule(rest, &mut db),
                "post" => recurring::cli_post(rest, &mut db),
                "catch-up" => recurring::cli_catch_up(rest, &mut db),
                "report" => reports::cli_report(rest, &mut db),
                other => {
                    print_usage();
                    anyhow::bail!("Unknown command: {other}");
                }
            }
        }
    }
}

fn open(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    Database::open(&config.db_path, config.auto_migrate)
}

fn cli_migrate(config: &Config) -> Result<()> {
    config.ensure_db_dir()?;
    let mut db = Database::open(&config.db_path, false)?;
    let before = db.schema_version()?;
    let applied = db.migrate()?;
    if applied == 0 {
        println!("Database is up to date (schema v{before})");
    } else {
        println!(
            "Applied {applied} migration(s): schema v{before} → v{}",
            db.schema_version()?
        );
    }
    Ok(())
}

pub(crate) fn print_usage() {
    println!("PropLedger — rental property ledger with recurring charges");
    println!();
    println!("Usage: propledger [--db <path>] <command>");
    println!();
    println!("Properties & ledger:");
    println!("  property add <nickname>       Add a property");
    println!("    --street, --city, --state, --zip <text>");
    println!("    --equity <amount>           Owner equity, for return on equity");
    println!("  property list                 List properties");
    println!("  category list                 List categories");
    println!("  category add <name> --type <income|expense|transfer>");
    println!("    --tax-bucket <line>         Explicit Schedule E line");
    println!("    --parent <category>         Parent category");
    println!("  category delete <category>    Delete an unused category");
    println!("  txn add --date <YYYY-MM-DD> --category <c> --amount <amount>");
    println!("    --memo <text>               Memo");
    println!("    --statement-month <YYYY-MM> Billing period, for accrual reports");
    println!("  txn list [--month <YYYY-MM>] [--deleted]");
    println!("  txn delete <id>               Soft-delete a transaction");
    println!("  txn restore <id>              Restore a soft-deleted transaction");
    println!("  annual set --year <YYYY> --category <c> --amount <amount>");
    println!("    --owner <name>              Ownership share label");
    println!("    --note <text>               Note");
    println!("  annual list [--year <YYYY>]");
    println!();
    println!("Recurring charges:");
    println!("  rule add --category <c> --amount <amount> --day <1-28> --start <YYYY-MM>");
    println!("    --end <YYYY-MM>             Last month (default: open-ended)");
    println!("    --memo <text>               Memo for posted entries");
    println!("    --inactive                  Create paused");
    println!("  rule update <id> [same flags as add]");
    println!("  rule toggle <id>              Pause or resume a rule");
    println!("  rule delete <id>              Delete a rule (posted entries stay)");
    println!("  rule list                     List rules");
    println!("  schedule [--month <YYYY-MM>] [--all]");
    println!("                                Show rules due in a month");
    println!("  post [--month <YYYY-MM>]      Post due rules for a month (default: current)");
    println!("  catch-up [--through <YYYY-MM>]");
    println!("                                Post every missed month through a month");
    println!();
    println!("Reports:");
    println!("  report <pnl|net|cash-accrual|schedule-e|rental|leaderboard|trend>");
    println!("    --from <YYYY-MM-DD> --to <YYYY-MM-DD>, or --year <YYYY>");
    println!("    --include-transfers         Count transfer categories");
    println!("    --csv <path>                Also write the report as CSV");
    println!();
    println!("Other:");
    println!("  migrate                       Apply pending schema migrations");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
    println!();
    println!("Most commands take --property <id|nickname>; it may be omitted when");
    println!("there is only one property. Reports cover all properties without it.");
}
