use anyhow::Result;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::{collect_buckets, Cell, FlowTotals, Lookup, ReportQuery, ReportTable};
use crate::db::Database;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Standing {
    pub(crate) rank: usize,
    pub(crate) property_id: i64,
    pub(crate) nickname: String,
    pub(crate) totals: FlowTotals,
    /// Net over income; `None` without income.
    pub(crate) margin: Option<Decimal>,
    /// Net over equity; `None` when equity is unset or not positive.
    pub(crate) roe: Option<Decimal>,
}

impl Standing {
    pub(crate) fn net(&self) -> Decimal {
        self.totals.net()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Leaderboard {
    pub(crate) query: ReportQuery,
    pub(crate) standings: Vec<Standing>,
    pub(crate) totals: FlowTotals,
}

impl Leaderboard {
    pub(crate) fn to_table(&self) -> ReportTable {
        let mut table = ReportTable::new(
            format!("Portfolio leaderboard, {}", self.query.range),
            &["Rank", "Property", "Income", "Expenses", "Net", "Margin", "ROE"],
        );
        for s in &self.standings {
            table.push(vec![
                Cell::Text(s.rank.to_string()),
                Cell::text(&s.nickname),
                Cell::Money(s.totals.income),
                Cell::Money(s.totals.expenses),
                Cell::Money(s.net()),
                Cell::Percent(s.margin),
                Cell::Percent(s.roe),
            ]);
        }
        table.push(vec![
            Cell::text(""),
            Cell::text("Portfolio"),
            Cell::Money(self.totals.income),
            Cell::Money(self.totals.expenses),
            Cell::Money(self.totals.net()),
            Cell::Percent(ratio(self.totals.net(), self.totals.income)),
            Cell::Percent(None),
        ]);
        table
    }
}

fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    (denominator > Decimal::ZERO).then(|| numerator / denominator)
}

/// Every property in the query, best net first. Ties keep id order.
pub(crate) fn portfolio_leaderboard(db: &Database, query: &ReportQuery) -> Result<Leaderboard> {
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
    let mut standings: Vec<Standing> = per_property
        .into_iter()
        .map(|(property_id, t)| {
            totals.merge(&t);
            let equity = lookup
                .properties
                .iter()
                .find(|p| p.id == Some(property_id))
                .and_then(|p| p.equity)
                .map(Decimal::from)
                .unwrap_or_default();
            Standing {
                rank: 0,
                property_id,
                nickname: lookup.nickname(property_id),
                totals: t,
                margin: ratio(t.net(), t.income),
                roe: ratio(t.net(), equity),
            }
        })
        .collect();

    standings.sort_by(|a, b| {
        b.net()
            .cmp(&a.net())
            .then(a.property_id.cmp(&b.property_id))
    });
    for (i, s) in standings.iter_mut().enumerate() {
        s.rank = i + 1;
    }

    Ok(Leaderboard {
        query: *query,
        standings,
        totals,
    })
}
