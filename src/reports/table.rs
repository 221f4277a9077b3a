use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;

use crate::money;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cell {
    Text(String),
    /// Unrounded cents.
    Money(Decimal),
    /// A ratio; blank when undefined.
    Percent(Option<Decimal>),
}

impl Cell {
    pub(crate) fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Money(cents) => money::format_amount(*cents),
            Self::Percent(Some(ratio)) => money::format_percent(*ratio),
            Self::Percent(None) => "—".to_string(),
        }
    }

    /// Plain values for spreadsheets: dollars with two decimals, no symbols.
    fn csv(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Money(cents) => {
                let rounded = Decimal::from(money::round_cents(*cents)) / Decimal::ONE_HUNDRED;
                format!("{rounded:.2}")
            }
            Self::Percent(Some(ratio)) => format!(
                "{:.4}",
                ratio.round_dp_with_strategy(4, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
            ),
            Self::Percent(None) => String::new(),
        }
    }

    fn is_numeric(&self) -> bool {
        !matches!(self, Self::Text(_))
    }
}

/// A report flattened to rows, for the terminal or a CSV file.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReportTable {
    pub(crate) title: String,
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<Vec<Cell>>,
    pub(crate) notes: Vec<String>,
}

impl ReportTable {
    pub(crate) fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub(crate) fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Fixed-width text, numbers right-aligned.
    pub(crate) fn render(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(Cell::display).collect())
            .collect();

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        let header_line: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, &w)| format!("{h:<w$}"))
            .collect();
        out.push_str(header_line.join("  ").trim_end());
        out.push('\n');
        let total_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        out.push_str(&"─".repeat(total_width));
        out.push('\n');

        for (row, rendered) in self.rows.iter().zip(&cells) {
            let line: Vec<String> = rendered
                .iter()
                .zip(row)
                .zip(&widths)
                .map(|((text, cell), &w)| {
                    if cell.is_numeric() {
                        format!("{text:>w$}")
                    } else {
                        format!("{text:<w$}")
                    }
                })
                .collect();
            out.push_str(line.join("  ").trim_end());
            out.push('\n');
        }

        for note in &self.notes {
            out.push_str(&format!("* {note}\n"));
        }
        out
    }

    /// Write headers and rows to `path`. Returns the number of data rows.
    pub(crate) fn write_csv(&self, path: &Path) -> Result<usize> {
        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(Cell::csv))?;
        }
        wtr.flush()
            .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        Ok(self.rows.len())
    }
}
