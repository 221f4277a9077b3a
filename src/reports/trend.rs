use anyhow::Result;

use super::{flow_totals, Cell, FlowTotals, Lookup, ReportQuery, ReportTable};
use crate::db::Database;
use crate::models::Month;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrendPoint {
    pub(crate) month: Month,
    pub(crate) totals: FlowTotals,
}

#[derive(Debug, Clone)]
pub(crate) struct Trend {
    pub(crate) query: ReportQuery,
    pub(crate) points: Vec<TrendPoint>,
}

impl Trend {
    pub(crate) fn to_table(&self) -> ReportTable {
        let mut table = ReportTable::new(
            format!("Income and expense trend, {}", self.query.range),
            &["Month", "Income", "Expenses", "Net"],
        );
        for p in &self.points {
            table.push(vec![
                Cell::Text(p.month.to_string()),
                Cell::Money(p.totals.income),
                Cell::Money(p.totals.expenses),
                Cell::Money(p.totals.net()),
            ]);
        }
        table
    }
}

/// Monthly totals; the first and last months are clipped to the range, so
/// annual amounts are prorated by the days actually covered.
pub(crate) fn income_expense_trend(db: &Database, query: &ReportQuery) -> Result<Trend> {
    let lookup = Lookup::load(db, query.property_id)?;
    let mut points = Vec::new();
    for month in query.range.months() {
        let Some(window) = query.range.clip(month) else {
            continue;
        };
        points.push(TrendPoint {
            month,
            totals: flow_totals(db, &lookup, &query.with_range(window))?,
        });
    }
    Ok(Trend {
        query: *query,
        points,
    })
}
