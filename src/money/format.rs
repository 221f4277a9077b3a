use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Round an unrounded cent amount to whole cents, half away from zero.
pub fn round_cents(cents: Decimal) -> i64 {
    cents
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(if cents.is_sign_negative() { i64::MIN } else { i64::MAX })
}

/// Parse a user-entered dollar amount ("$1,234.50", "-12") into cents.
/// More than two decimal places is rejected rather than rounded.
pub fn parse_dollars(input: &str) -> Result<i64> {
    let cleaned = input.trim().replace(['$', ','], "");
    let value = Decimal::from_str(cleaned.trim())
        .with_context(|| format!("Invalid amount: {input}"))?;
    if value.normalize().scale() > 2 {
        anyhow::bail!("Amount has more than two decimal places: {input}");
    }
    (value * Decimal::ONE_HUNDRED)
        .to_i64()
        .with_context(|| format!("Amount out of range: {input}"))
}

/// Format cents with thousand separators and 2 decimal places.
/// e.g. `123456789` → `"$1,234,567.89"`
pub fn format_cents(cents: i64) -> String {
    let abs = cents.unsigned_abs();
    let int_part = (abs / 100).to_string();
    let dec_part = abs % 100;

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if cents < 0 {
        format!("-${with_commas}.{dec_part:02}")
    } else {
        format!("${with_commas}.{dec_part:02}")
    }
}

/// Round once, then format.
pub fn format_amount(cents: Decimal) -> String {
    format_cents(round_cents(cents))
}

/// Format a ratio as a percentage with one decimal place.
pub fn format_percent(ratio: Decimal) -> String {
    let pct = (ratio * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{pct:.1}%")
}

/// Truncate a string to `max` visible characters, appending "…" if truncated.
pub fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}
