//! Read-side aggregation shared by every report.
//!
//! A report's figures come from two places: ledger entries dated inside the
//! window, and annual category amounts prorated into it by day count. Both are
//! sign-normalized by category type before they are summed, and nothing is
//! rounded until the figures are displayed or exported.

mod cash_accrual;
mod pnl;
mod portfolio;
mod rental_income;
mod schedule_e;
mod table;
mod trend;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::db::{Database, LedgerRow};
use crate::models::{Category, CategoryType, Month, Property};
use crate::money::{self, Flow};
use crate::proration;

pub(crate) use cash_accrual::cash_vs_accrual;
pub(crate) use pnl::{net_profit, profit_and_loss};
pub(crate) use portfolio::portfolio_leaderboard;
pub(crate) use rental_income::rental_income;
pub(crate) use schedule_e::schedule_e;
pub(crate) use table::{Cell, ReportTable};
pub(crate) use trend::income_expense_trend;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum DateRangeError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("start {start} is after end {end}")]
    Reversed { start: NaiveDate, end: NaiveDate },
}

/// A closed date window, `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub(crate) fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    pub(crate) fn parse(start: &str, end: &str) -> Result<Self, DateRangeError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub(crate) fn year(year: i32) -> Option<Self> {
        let (start, end) = proration::year_bounds(year)?;
        Some(Self { start, end })
    }

    pub(crate) fn start(&self) -> NaiveDate {
        self.start
    }

    pub(crate) fn end(&self) -> NaiveDate {
        self.end
    }

    /// The day after `end`, for half-open `[start, end + 1)` queries.
    pub(crate) fn end_exclusive(&self) -> NaiveDate {
        self.end.succ_opt().unwrap_or(self.end)
    }

    pub(crate) fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub(crate) fn first_month(&self) -> Month {
        Month::of(self.start)
    }

    pub(crate) fn last_month(&self) -> Month {
        Month::of(self.end)
    }

    pub(crate) fn months(&self) -> impl Iterator<Item = Month> {
        self.first_month().through(self.last_month())
    }

    /// The part of `month` inside this range.
    pub(crate) fn clip(&self, month: Month) -> Option<DateRange> {
        let start = self.start.max(month.first_day());
        let end = self.end.min(month.last_day());
        (start <= end).then_some(DateRange { start, end })
    }

    pub(crate) fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| DateRangeError::InvalidDate(s.trim().to_string()))
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ReportQuery {
    pub(crate) property_id: Option<i64>,
    pub(crate) range: DateRange,
    pub(crate) include_transfers: bool,
}

impl ReportQuery {
    pub(crate) fn new(range: DateRange) -> Self {
        Self {
            property_id: None,
            range,
            include_transfers: false,
        }
    }

    pub(crate) fn for_property(mut self, property_id: i64) -> Self {
        self.property_id = Some(property_id);
        self
    }

    pub(crate) fn with_transfers(mut self, include: bool) -> Self {
        self.include_transfers = include;
        self
    }

    fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }
}

/// Income and expense sums. Expenses are negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FlowTotals {
    pub(crate) income: Decimal,
    pub(crate) expenses: Decimal,
}

impl FlowTotals {
    pub(crate) fn add(&mut self, flow: Flow, amount: Decimal) {
        match flow {
            Flow::Income => self.income += amount,
            Flow::Expense => self.expenses += amount,
        }
    }

    pub(crate) fn merge(&mut self, other: &FlowTotals) {
        self.income += other.income;
        self.expenses += other.expenses;
    }

    pub(crate) fn net(&self) -> Decimal {
        self.income + self.expenses
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Source {
    Ledger,
    Annual,
}

/// One sign-normalized contribution to a report.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) property_id: i64,
    pub(crate) category_id: i64,
    pub(crate) flow: Flow,
    pub(crate) amount: Decimal,
    pub(crate) source: Source,
}

/// Summed entries for one (property, category, flow).
#[derive(Debug, Clone)]
pub(crate) struct Bucket {
    pub(crate) property_id: i64,
    pub(crate) category: Category,
    pub(crate) flow: Flow,
    /// `ledger + annual`
    pub(crate) amount: Decimal,
    pub(crate) ledger: Decimal,
    pub(crate) annual: Decimal,
}

impl Bucket {
    pub(crate) fn category_id(&self) -> i64 {
        self.category.id.unwrap_or_default()
    }
}

/// Categories keyed by id, plus the properties a query covers.
pub(crate) struct Lookup {
    pub(crate) categories: HashMap<i64, Category>,
    pub(crate) properties: Vec<Property>,
}

impl Lookup {
    pub(crate) fn load(db: &Database, property_id: Option<i64>) -> Result<Self> {
        let categories = db
            .get_categories()?
            .into_iter()
            .filter_map(|c| c.id.map(|id| (id, c)))
            .collect();
        let properties = db
            .get_properties()?
            .into_iter()
            .filter(|p| property_id.map_or(true, |pid| p.id == Some(pid)))
            .collect();
        Ok(Self {
            categories,
            properties,
        })
    }

    pub(crate) fn nickname(&self, property_id: i64) -> String {
        self.properties
            .iter()
            .find(|p| p.id == Some(property_id))
            .map(|p| p.nickname.clone())
            .unwrap_or_else(|| format!("#{property_id}"))
    }
}

/// Sign and classify one amount. `None` when the category is unknown or is a
/// transfer the query leaves out.
fn classify(
    lookup: &Lookup,
    query: &ReportQuery,
    category_id: i64,
    amount: i64,
) -> Option<(i64, Flow)> {
    let category_type = lookup.categories.get(&category_id)?.category_type;
    if category_type == CategoryType::Transfer && !query.include_transfers {
        return None;
    }
    let normalized = money::normalize(amount, category_type);
    Some((normalized, money::effective_type(normalized, category_type)))
}

pub(crate) fn ledger_entry(
    lookup: &Lookup,
    query: &ReportQuery,
    row: &LedgerRow,
) -> Option<Entry> {
    let (amount, flow) = classify(lookup, query, row.category_id, row.amount)?;
    Some(Entry {
        property_id: row.property_id,
        category_id: row.category_id,
        flow,
        amount: Decimal::from(amount),
        source: Source::Ledger,
    })
}

/// Ledger entries dated inside the query window.
pub(crate) fn ledger_entries(
    db: &Database,
    lookup: &Lookup,
    query: &ReportQuery,
) -> Result<Vec<Entry>> {
    let rows = db.ledger_rows(
        query.property_id,
        query.range.start(),
        query.range.end_exclusive(),
    )?;
    Ok(rows
        .iter()
        .filter_map(|row| ledger_entry(lookup, query, row))
        .collect())
}

/// Annual amounts for every year the window touches, prorated into it.
pub(crate) fn annual_entries(
    db: &Database,
    lookup: &Lookup,
    query: &ReportQuery,
) -> Result<Vec<Entry>> {
    let range = query.range;
    let annual = db.get_annual_amounts(query.property_id, range.start().year()..=range.end().year())?;

    Ok(annual
        .iter()
        .filter_map(|a| {
            let (amount, flow) = classify(lookup, query, a.category_id, a.amount)?;
            let share =
                proration::prorate_annual_for_range(a.year, amount, range.start(), range.end());
            (!share.is_zero()).then_some(Entry {
                property_id: a.property_id,
                category_id: a.category_id,
                flow,
                amount: share,
                source: Source::Annual,
            })
        })
        .collect())
}

/// Ledger plus prorated annual entries, summed per (property, category, flow).
pub(crate) fn collect_buckets(
    db: &Database,
    lookup: &Lookup,
    query: &ReportQuery,
) -> Result<Vec<Bucket>> {
    let mut sums: BTreeMap<(i64, i64, Flow), (Decimal, Decimal)> = BTreeMap::new();
    let entries = ledger_entries(db, lookup, query)?
        .into_iter()
        .chain(annual_entries(db, lookup, query)?);
    for entry in entries {
        let (ledger, annual) = sums
            .entry((entry.property_id, entry.category_id, entry.flow))
            .or_default();
        match entry.source {
            Source::Ledger => *ledger += entry.amount,
            Source::Annual => *annual += entry.amount,
        }
    }

    Ok(sums
        .into_iter()
        .filter_map(|((property_id, category_id, flow), (ledger, annual))| {
            Some(Bucket {
                property_id,
                category: lookup.categories.get(&category_id)?.clone(),
                flow,
                amount: ledger + annual,
                ledger,
                annual,
            })
        })
        .collect())
}

/// Income/expense totals for one window.
pub(crate) fn flow_totals(db: &Database, lookup: &Lookup, query: &ReportQuery) -> Result<FlowTotals> {
    let mut totals = FlowTotals::default();
    for bucket in collect_buckets(db, lookup, query)? {
        totals.add(bucket.flow, bucket.amount);
    }
    Ok(totals)
}
