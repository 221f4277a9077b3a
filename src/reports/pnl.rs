use anyhow::Result;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::{collect_buckets, Cell, FlowTotals, Lookup, ReportQuery, ReportTable};
use crate::db::Database;
use crate::money::Flow;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryLine {
    pub(crate) category_id: i64,
    pub(crate) name: String,
    pub(crate) ledger: Decimal,
    pub(crate) annual: Decimal,
    pub(crate) total: Decimal,
}

#[derive(Debug, Clone)]
pub(crate) struct ProfitAndLoss {
    pub(crate) query: ReportQuery,
    pub(crate) income: Vec<CategoryLine>,
    pub(crate) expenses: Vec<CategoryLine>,
    pub(crate) totals: FlowTotals,
}

impl ProfitAndLoss {
    pub(crate) fn net(&self) -> Decimal {
        self.totals.net()
    }

    #[cfg(test)]
    pub(crate) fn line(&self, category_id: i64) -> Option<&CategoryLine> {
        self.income
            .iter()
            .chain(&self.expenses)
            .find(|l| l.category_id == category_id)
    }

    pub(crate) fn to_table(&self) -> ReportTable {
        let mut table = ReportTable::new(
            format!("Profit & Loss, {}", self.query.range),
            &["Section", "Category", "Ledger", "Annual", "Total"],
        );
        for (section, lines) in [("Income", &self.income), ("Expenses", &self.expenses)] {
            for line in lines {
                table.push(vec![
                    Cell::text(section),
                    Cell::text(&line.name),
                    Cell::Money(line.ledger),
                    Cell::Money(line.annual),
                    Cell::Money(line.total),
                ]);
            }
        }
        for (label, amount) in [
            ("Total income", self.totals.income),
            ("Total expenses", self.totals.expenses),
            ("Net", self.net()),
        ] {
            table.push(vec![
                Cell::text("Totals"),
                Cell::text(label),
                Cell::text(""),
                Cell::text(""),
                Cell::Money(amount),
            ]);
        }
        table
    }
}

/// Category rows across every property the query covers.
pub(crate) fn profit_and_loss(db: &Database, query: &ReportQuery) -> Result<ProfitAndLoss> {
    let lookup = Lookup::load(db, query.property_id)?;
    let mut by_category: BTreeMap<(Flow, String, i64), CategoryLine> = BTreeMap::new();
    let mut totals = FlowTotals::default();

    for bucket in collect_buckets(db, &lookup, query)? {
        totals.add(bucket.flow, bucket.amount);
        let category_id = bucket.category_id();
        let line = by_category
            .entry((bucket.flow, bucket.category.name.to_lowercase(), category_id))
            .or_insert_with(|| CategoryLine {
                category_id,
                name: bucket.category.name.clone(),
                ledger: Decimal::ZERO,
                annual: Decimal::ZERO,
                total: Decimal::ZERO,
            });
        line.ledger += bucket.ledger;
        line.annual += bucket.annual;
        line.total += bucket.amount;
    }

    let (mut income, mut expenses) = (Vec::new(), Vec::new());
    for ((flow, _, _), line) in by_category {
        match flow {
            Flow::Income => income.push(line),
            Flow::Expense => expenses.push(line),
        }
    }

    Ok(ProfitAndLoss {
        query: *query,
        income,
        expenses,
        totals,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PropertyNet {
    pub(crate) property_id: i64,
    pub(crate) nickname: String,
    pub(crate) totals: FlowTotals,
}

#[derive(Debug, Clone)]
pub(crate) struct NetProfit {
    pub(crate) query: ReportQuery,
    pub(crate) rows: Vec<PropertyNet>,
    pub(crate) totals: FlowTotals,
}

impl NetProfit {
    pub(crate) fn to_table(&self) -> ReportTable {
        let mut table = ReportTable::new(
            format!("Net profit, {}", self.query.range),
            &["Property", "Income", "Expenses", "Net"],
        );
        for row in &self.rows {
            table.push(vec![
                Cell::text(&row.nickname),
                Cell::Money(row.totals.income),
                Cell::Money(row.totals.expenses),
                Cell::Money(row.totals.net()),
            ]);
        }
        table.push(vec![
            Cell::text("Total"),
            Cell::Money(self.totals.income),
            Cell::Money(self.totals.expenses),
            Cell::Money(self.totals.net()),
        ]);
        table
    }
}

/// One row per property, including properties with no activity.
pub(crate) fn net_profit(db: &Database, query: &ReportQuery) -> Result<NetProfit> {
    let lookup = Lookup::load(db, query.property_id)?;
    let mut per_property: BTreeMap<i64, FlowTotals> = lookup
        .properties
        .iter()
        .filter_map(|p| p.id)
        .map(|id| (id, FlowTotals::default()))
        .collect();

    for bucket in collect_buckets(db, &lookup, query)? {
        per_property
            .entry(bucket.property_id)
            .or_default()
            .add(bucket.flow, bucket.amount);
    }

    let mut totals = FlowTotals::default();
    let rows = per_property
        .into_iter()
        .map(|(property_id, t)| {
            totals.merge(&t);
            PropertyNet {
                property_id,
                nickname: lookup.nickname(property_id),
                totals: t,
            }
        })
        .collect();

    Ok(NetProfit {
        query: *query,
        rows,
        totals,
    })
}
