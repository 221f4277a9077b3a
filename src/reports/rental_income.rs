use anyhow::Result;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::{collect_buckets, Cell, Lookup, ReportQuery, ReportTable};
use crate::db::Database;
use crate::money::Flow;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IncomeLine {
    pub(crate) category_id: i64,
    pub(crate) name: String,
    pub(crate) amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PropertyIncome {
    pub(crate) property_id: i64,
    pub(crate) nickname: String,
    pub(crate) lines: Vec<IncomeLine>,
    pub(crate) total: Decimal,
}

#[derive(Debug, Clone)]
pub(crate) struct RentalIncome {
    pub(crate) query: ReportQuery,
    pub(crate) properties: Vec<PropertyIncome>,
    pub(crate) total: Decimal,
}

impl RentalIncome {
    pub(crate) fn to_table(&self) -> ReportTable {
        let mut table = ReportTable::new(
            format!("Rental income, {}", self.query.range),
            &["Property", "Category", "Amount"],
        );
        for p in &self.properties {
            for line in &p.lines {
                table.push(vec![
                    Cell::text(&p.nickname),
                    Cell::text(&line.name),
                    Cell::Money(line.amount),
                ]);
            }
            table.push(vec![
                Cell::text(&p.nickname),
                Cell::text("Subtotal"),
                Cell::Money(p.total),
            ]);
        }
        table.push(vec![
            Cell::text("Total"),
            Cell::text(""),
            Cell::Money(self.total),
        ]);
        table
    }
}

/// Income buckets only, grouped by property then category name.
pub(crate) fn rental_income(db: &Database, query: &ReportQuery) -> Result<RentalIncome> {
    let lookup = Lookup::load(db, query.property_id)?;
    let mut grouped: BTreeMap<i64, Vec<IncomeLine>> = BTreeMap::new();

    for bucket in collect_buckets(db, &lookup, query)? {
        if bucket.flow != Flow::Income {
            continue;
        }
        grouped.entry(bucket.property_id).or_default().push(IncomeLine {
            category_id: bucket.category_id(),
            name: bucket.category.name.clone(),
            amount: bucket.amount,
        });
    }

    let mut total = Decimal::ZERO;
    let properties = grouped
        .into_iter()
        .map(|(property_id, mut lines)| {
            lines.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then(a.category_id.cmp(&b.category_id))
            });
            let subtotal: Decimal = lines.iter().map(|l| l.amount).sum();
            total += subtotal;
            PropertyIncome {
                property_id,
                nickname: lookup.nickname(property_id),
                lines,
                total: subtotal,
            }
        })
        .collect();

    Ok(RentalIncome {
        query: *query,
        properties,
        total,
    })
}
