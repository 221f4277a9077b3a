mod cli;
mod ledger;
mod recurring;
mod reports;

use anyhow::Result;

use crate::db::Database;
use crate::models::{Category, Month};
use crate::recurring::RecurringOutcome;

pub(crate) use cli::{as_cli, print_usage};

/// Flags that take no value.
const SWITCHES: &[&str] = &["--all", "--deleted", "--inactive", "--include-transfers"];

// ── Argument helpers ─────────────────────────────────────────

pub(crate) fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

/// `args` without `name` and its value.
pub(crate) fn strip_flag(args: &[String], name: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == name {
            iter.next();
        } else {
            out.push(arg.clone());
        }
    }
    out
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn required_flag<'a>(args: &'a [String], name: &str, usage: &str) -> Result<&'a str> {
    flag_value(args, name).ok_or_else(|| anyhow::anyhow!("Missing {name}\nUsage: {usage}"))
}

/// Arguments that are neither flags nor flag values.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            if !SWITCHES.contains(&arg.as_str()) {
                iter.next();
            }
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn parse_id(raw: &str, what: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid {what} id: {raw}"))
}

fn parse_month(raw: &str) -> Result<Month> {
    Ok(raw.parse::<Month>()?)
}

fn month_flag(args: &[String], name: &str) -> Result<Month> {
    flag_value(args, name).map_or_else(|| Ok(Month::current()), parse_month)
}

// ── Lookups ──────────────────────────────────────────────────

/// Resolve `--property <id|nickname>`. Without the flag a lone property is
/// used automatically.
fn property_id(db: &Database, args: &[String]) -> Result<i64> {
    let properties = db.get_properties()?;
    if let Some(key) = flag_value(args, "--property") {
        return properties
            .iter()
            .find(|p| {
                p.id.is_some_and(|id| id.to_string() == key)
                    || p.nickname.to_lowercase() == key.to_lowercase()
            })
            .and_then(|p| p.id)
            .ok_or_else(|| anyhow::anyhow!("Property '{key}' not found"));
    }

    match properties.as_slice() {
        [] => anyhow::bail!("No properties found. Create one with: propledger property add <nickname>"),
        [only] => only.id.ok_or_else(|| anyhow::anyhow!("Property has no ID")),
        many => {
            let names: Vec<String> = many
                .iter()
                .map(|p| format!("  --property \"{}\"", p.nickname))
                .collect();
            anyhow::bail!(
                "Multiple properties found. Use --property <id|nickname> to specify:\n{}",
                names.join("\n")
            );
        }
    }
}

fn optional_property_id(db: &Database, args: &[String]) -> Result<Option<i64>> {
    if flag_value(args, "--property").is_some() {
        property_id(db, args).map(Some)
    } else {
        Ok(None)
    }
}

/// Resolve a category by id or case-insensitive name.
fn find_category(db: &Database, key: &str) -> Result<Category> {
    let categories = db.get_categories()?;
    key.parse::<i64>()
        .ok()
        .and_then(|id| Category::find_by_id(&categories, id))
        .or_else(|| Category::find_by_name(&categories, key))
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Category '{key}' not found"))
}

/// Turn an expected recurring outcome into a printable error.
fn expect_done<T>(outcome: RecurringOutcome<T>) -> Result<T> {
    match outcome {
        RecurringOutcome::Done(value) => Ok(value),
        RecurringOutcome::Invalid(e) => anyhow::bail!("Invalid {e}"),
        RecurringOutcome::Unavailable => anyhow::bail!(
            "Recurring rules are not available on this database. Run: propledger migrate"
        ),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::models::Property;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_skips_flag_values_and_switches() {
        let a = args(&["Maple", "--city", "Austin", "--all", "extra"]);
        assert_eq!(positional(&a), vec!["Maple", "extra"]);
        assert_eq!(flag_value(&a, "--city"), Some("Austin"));
        assert!(has_flag(&a, "--all"));
    }

    #[test]
    fn test_strip_flag_removes_value() {
        let a = args(&["propledger", "--db", "/tmp/x.db", "property", "list"]);
        assert_eq!(strip_flag(&a, "--db"), args(&["propledger", "property", "list"]));
    }

    #[test]
    fn test_property_lookup_by_id_or_nickname() {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert_property(&Property::new("Maple Duplex".into())).unwrap();

        // Lone property needs no flag
        assert_eq!(property_id(&db, &[]).unwrap(), a);

        let b = db.insert_property(&Property::new("Oak Street".into())).unwrap();
        assert!(property_id(&db, &[]).is_err());
        assert_eq!(property_id(&db, &args(&["--property", "oak street"])).unwrap(), b);
        assert_eq!(property_id(&db, &args(&["--property", &a.to_string()])).unwrap(), a);
        assert!(property_id(&db, &args(&["--property", "Elm"])).is_err());
    }

    #[test]
    fn test_find_category_by_name_or_id() {
        let db = Database::open_in_memory().unwrap();
        let hoa = find_category(&db, "hoa").unwrap();
        let id = hoa.id.unwrap();
        assert_eq!(find_category(&db, &id.to_string()).unwrap().name, "HOA");
        assert!(find_category(&db, "Pool Boy").is_err());
    }

    #[test]
    fn test_expect_done_maps_outcomes() {
        assert_eq!(expect_done(RecurringOutcome::Done(3)).unwrap(), 3);
        let err = expect_done::<()>(RecurringOutcome::Unavailable).unwrap_err();
        assert!(err.to_string().contains("migrate"));
    }
}
