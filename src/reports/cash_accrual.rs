use anyhow::Result;
use std::collections::BTreeMap;

use super::{annual_entries, ledger_entry, Cell, FlowTotals, Lookup, ReportQuery, ReportTable};
use crate::db::Database;
use crate::models::Month;

/// Which basis the accrual column actually reflects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccrualMode {
    /// At least one row in range carries a statement month.
    StatementMonth,
    /// No statement months in range; accrual equals cash.
    Fallback,
}

impl AccrualMode {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::StatementMonth => "statement_month",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonthBasis {
    pub(crate) month: Month,
    pub(crate) cash: FlowTotals,
    pub(crate) accrual: FlowTotals,
}

#[derive(Debug, Clone)]
pub(crate) struct CashVsAccrual {
    pub(crate) query: ReportQuery,
    pub(crate) accrual_mode: AccrualMode,
    pub(crate) months: Vec<MonthBasis>,
    /// Prorated annual amounts, identical on both bases.
    pub(crate) annual: FlowTotals,
    pub(crate) cash_total: FlowTotals,
    pub(crate) accrual_total: FlowTotals,
}

impl CashVsAccrual {
    pub(crate) fn to_table(&self) -> ReportTable {
        let mut table = ReportTable::new(
            format!(
                "Cash vs accrual, {} (accrual mode: {})",
                self.query.range,
                self.accrual_mode.as_str()
            ),
            &[
                "Month",
                "Cash income",
                "Cash expenses",
                "Cash net",
                "Accrual income",
                "Accrual expenses",
                "Accrual net",
            ],
        );
        let mut push = |label: String, cash: &FlowTotals, accrual: &FlowTotals| {
            table.push(vec![
                Cell::Text(label),
                Cell::Money(cash.income),
                Cell::Money(cash.expenses),
                Cell::Money(cash.net()),
                Cell::Money(accrual.income),
                Cell::Money(accrual.expenses),
                Cell::Money(accrual.net()),
            ]);
        };
        for m in &self.months {
            push(m.month.to_string(), &m.cash, &m.accrual);
        }
        push("Annual (prorated)".to_string(), &self.annual, &self.annual);
        push("Total".to_string(), &self.cash_total, &self.accrual_total);

        if self.accrual_mode == AccrualMode::Fallback {
            table.note("no statement months in range; accrual shown on cash basis");
        }
        table
    }
}

/// Cash buckets ledger rows by transaction date; accrual by statement month,
/// falling back to the date's month for rows without one.
pub(crate) fn cash_vs_accrual(db: &Database, query: &ReportQuery) -> Result<CashVsAccrual> {
    let lookup = Lookup::load(db, query.property_id)?;
    let range = query.range;
    let (first, last) = (range.first_month(), range.last_month());

    let rows = db.ledger_rows_with_statements(
        query.property_id,
        range.start(),
        range.end_exclusive(),
        first..=last,
    )?;

    let mut months: BTreeMap<Month, MonthBasis> = range
        .months()
        .map(|month| {
            (
                month,
                MonthBasis {
                    month,
                    cash: FlowTotals::default(),
                    accrual: FlowTotals::default(),
                },
            )
        })
        .collect();

    let mut has_statement_month = false;
    for row in &rows {
        let Some(entry) = ledger_entry(&lookup, query, row) else {
            continue;
        };

        if range.contains(row.date) {
            if let Some(basis) = months.get_mut(&Month::of(row.date)) {
                basis.cash.add(entry.flow, entry.amount);
            }
        }

        let accrual_month = match row.statement_month {
            Some(m) => {
                has_statement_month = true;
                m
            }
            None if range.contains(row.date) => Month::of(row.date),
            None => continue,
        };
        if let Some(basis) = months.get_mut(&accrual_month) {
            basis.accrual.add(entry.flow, entry.amount);
        }
    }

    let mut annual = FlowTotals::default();
    for entry in annual_entries(db, &lookup, query)? {
        annual.add(entry.flow, entry.amount);
    }

    let accrual_mode = if has_statement_month {
        AccrualMode::StatementMonth
    } else {
        AccrualMode::Fallback
    };
    if accrual_mode == AccrualMode::Fallback && !rows.is_empty() {
        tracing::debug!(range = %range, "no statement months in range, accrual falls back to cash");
    }

    let months: Vec<MonthBasis> = months.into_values().collect();
    let mut cash_total = annual;
    let mut accrual_total = annual;
    for m in &months {
        cash_total.merge(&m.cash);
        accrual_total.merge(&m.accrual);
    }

    Ok(CashVsAccrual {
        query: *query,
        accrual_mode,
        months,
        annual,
        cash_total,
        accrual_total,
    })
}
