use anyhow::Result;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::{collect_buckets, Cell, Lookup, ReportQuery, ReportTable};
use crate::db::Database;
use crate::models::{Category, CategoryType, TaxBucket};
use crate::money::Flow;

/// Keyword patterns over lowercased category names, first match wins.
/// `\b` is an ASCII word boundary.
const KEYWORDS: &[(&str, TaxBucket)] = &[
    (r"\bmortgage\b.*\binterest\b", TaxBucket::MortgageInterest),
    (r"\binterest\b", TaxBucket::OtherInterest),
    (r"\binsurance\b|\bpremiums?\b", TaxBucket::Insurance),
    (
        r"\blegal\b|\battorney|\blawyer|\baccounting\b|\bcpa\b|\bprofessional\b|\bbookkeep|\btax prep",
        TaxBucket::LegalAndProfessionalFees,
    ),
    (r"\btax(es)?\b", TaxBucket::Taxes),
    (r"\bmanagement\b|\bproperty manager", TaxBucket::ManagementFees),
    (r"\bcommissions?\b|\bleasing fees?\b|\bbroker", TaxBucket::Commissions),
    (r"\badvertis|\bmarketing\b|\blisting", TaxBucket::Advertising),
    (
        r"\bclean|\bmaintenance\b|\blandscap|\blawn\b|\bpest\b|\bsnow\b",
        TaxBucket::CleaningAndMaintenance,
    ),
    (r"\brepairs?\b|\bplumb|\bhvac\b|\bhandyman\b", TaxBucket::Repairs),
    (
        r"\butilit|\belectric|\bwater\b|\bsewer\b|\btrash\b|\bgas\b|\binternet\b",
        TaxBucket::Utilities,
    ),
    (r"\bsuppl", TaxBucket::Supplies),
    (r"\btravel|\bmileage\b|\bauto\b|\bvehicles?\b|\bfuel\b", TaxBucket::AutoAndTravel),
    (r"\bdepreciat|\bamortiz", TaxBucket::Depreciation),
];

/// Maps categories onto Schedule E lines.
pub(crate) struct TaxClassifier {
    rules: Vec<(Regex, TaxBucket)>,
}

impl TaxClassifier {
    pub(crate) fn new() -> Self {
        let rules = KEYWORDS
            .iter()
            .filter_map(|(pattern, bucket)| {
                // Built without Unicode word classes
                Regex::new(&pattern.replace(r"\b", r"(?-u:\b)"))
                    .ok()
                    .map(|re| (re, *bucket))
            })
            .collect();
        Self { rules }
    }

    /// An explicit override on the category always wins. Transfers without
    /// one are owner money movements and have no line. Income goes to rents
    /// received; unmatched expenses go to other.
    pub(crate) fn classify(&self, category: &Category, flow: Flow) -> Option<TaxBucket> {
        if let Some(bucket) = category.tax_bucket {
            return Some(bucket);
        }
        if category.category_type == CategoryType::Transfer {
            return None;
        }
        if flow == Flow::Income {
            return Some(TaxBucket::RentsReceived);
        }
        let name = category.name.to_lowercase();
        Some(
            self.rules
                .iter()
                .find(|(re, _)| re.is_match(&name))
                .map_or(TaxBucket::OtherExpenses, |(_, bucket)| *bucket),
        )
    }
}

impl Default for TaxClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScheduleEColumn {
    pub(crate) property_id: i64,
    pub(crate) nickname: String,
    /// Signed: income positive, expenses negative.
    pub(crate) lines: BTreeMap<TaxBucket, Decimal>,
}

impl ScheduleEColumn {
    pub(crate) fn amount(&self, bucket: TaxBucket) -> Decimal {
        self.lines.get(&bucket).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ScheduleE {
    pub(crate) query: ReportQuery,
    pub(crate) columns: Vec<ScheduleEColumn>,
    pub(crate) totals: BTreeMap<TaxBucket, Decimal>,
}

impl ScheduleE {
    pub(crate) fn total(&self, bucket: TaxBucket) -> Decimal {
        self.totals.get(&bucket).copied().unwrap_or_default()
    }

    pub(crate) fn to_table(&self) -> ReportTable {
        let mut headers: Vec<&str> = vec!["Line", "Item"];
        headers.extend(self.columns.iter().map(|c| c.nickname.as_str()));
        headers.push("Total");
        let mut table = ReportTable::new(format!("Schedule E, {}", self.query.range), &headers);

        for bucket in TaxBucket::all() {
            let mut row = vec![
                Cell::Text(bucket.line().to_string()),
                Cell::text(bucket.label()),
            ];
            row.extend(self.columns.iter().map(|c| Cell::Money(c.amount(*bucket))));
            row.push(Cell::Money(self.total(*bucket)));
            table.push(row);
        }
        table
    }
}

/// One column per property in the query, every line present.
pub(crate) fn schedule_e(db: &Database, query: &ReportQuery) -> Result<ScheduleE> {
    let lookup = Lookup::load(db, query.property_id)?;
    let classifier = TaxClassifier::new();

    let mut columns: BTreeMap<i64, BTreeMap<TaxBucket, Decimal>> = lookup
        .properties
        .iter()
        .filter_map(|p| p.id)
        .map(|id| (id, BTreeMap::new()))
        .collect();
    let mut totals: BTreeMap<TaxBucket, Decimal> = BTreeMap::new();

    for bucket in collect_buckets(db, &lookup, query)? {
        let Some(line) = classifier.classify(&bucket.category, bucket.flow) else {
            continue;
        };
        *columns
            .entry(bucket.property_id)
            .or_default()
            .entry(line)
            .or_default() += bucket.amount;
        *totals.entry(line).or_default() += bucket.amount;
    }

    Ok(ScheduleE {
        query: *query,
        columns: columns
            .into_iter()
            .map(|(property_id, lines)| ScheduleEColumn {
                property_id,
                nickname: lookup.nickname(property_id),
                lines,
            })
            .collect(),
        totals,
    })
}
