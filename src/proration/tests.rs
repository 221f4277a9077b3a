#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::models::Month;
use crate::money::round_cents;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ── days_in_year ──────────────────────────────────────────────

#[test]
fn test_days_in_year() {
    assert_eq!(days_in_year(2023), 365);
    assert_eq!(days_in_year(2024), 366);
    assert_eq!(days_in_year(1900), 365);
    assert_eq!(days_in_year(2000), 366);
}

// ── overlap_days_inclusive ────────────────────────────────────

#[test]
fn test_overlap_single_day() {
    let d = ymd(2024, 3, 1);
    assert_eq!(overlap_days_inclusive(d, d, d, d), 1);
}

#[test]
fn test_overlap_partial() {
    let n = overlap_days_inclusive(ymd(2024, 1, 1), ymd(2024, 1, 31), ymd(2024, 1, 20), ymd(2024, 2, 10));
    assert_eq!(n, 12);
}

#[test]
fn test_overlap_disjoint_is_zero() {
    let n = overlap_days_inclusive(ymd(2024, 1, 1), ymd(2024, 1, 31), ymd(2024, 2, 1), ymd(2024, 2, 29));
    assert_eq!(n, 0);
}

#[test]
fn test_overlap_reversed_range_is_zero() {
    let n = overlap_days_inclusive(ymd(2024, 2, 1), ymd(2024, 1, 1), ymd(2024, 1, 1), ymd(2024, 12, 31));
    assert_eq!(n, 0);
}

#[test]
fn test_overlap_is_symmetric() {
    let ranges = [
        (ymd(2024, 1, 1), ymd(2024, 6, 30)),
        (ymd(2024, 3, 15), ymd(2025, 2, 1)),
        (ymd(2023, 1, 1), ymd(2023, 12, 31)),
        (ymd(2024, 6, 30), ymd(2024, 6, 30)),
    ];
    for (a_start, a_end) in ranges {
        for (b_start, b_end) in ranges {
            assert_eq!(
                overlap_days_inclusive(a_start, a_end, b_start, b_end),
                overlap_days_inclusive(b_start, b_end, a_start, a_end),
            );
        }
    }
}

// ── prorate_annual_for_range ──────────────────────────────────

#[test]
fn test_prorate_full_year_is_exact() {
    let share = prorate_annual_for_range(2023, -120000, ymd(2023, 1, 1), ymd(2023, 12, 31));
    assert_eq!(share, dec!(-120000));
}

#[test]
fn test_prorate_range_wider_than_year_caps_at_amount() {
    let share = prorate_annual_for_range(2024, 36600, ymd(2022, 6, 1), ymd(2026, 1, 1));
    assert_eq!(share, dec!(36600));
}

#[test]
fn test_prorate_half_leap_year() {
    // Jan 1 – Jul 1 2024 is 183 of 366 days.
    let share = prorate_annual_for_range(2024, -120000, ymd(2024, 1, 1), ymd(2024, 7, 1));
    assert_eq!(share, dec!(-60000));
}

#[test]
fn test_prorate_single_day() {
    let share = prorate_annual_for_range(2023, 36500, ymd(2023, 8, 9), ymd(2023, 8, 9));
    assert_eq!(share, dec!(100));
}

#[test]
fn test_prorate_outside_year_is_zero() {
    assert_eq!(
        prorate_annual_for_range(2024, 100000, ymd(2023, 1, 1), ymd(2023, 12, 31)),
        Decimal::ZERO
    );
    assert_eq!(
        prorate_annual_for_range(2024, 100000, ymd(2025, 1, 1), ymd(2025, 3, 1)),
        Decimal::ZERO
    );
}

#[test]
fn test_prorate_touching_year_edge() {
    let share = prorate_annual_for_range(2023, 36500, ymd(2022, 12, 1), ymd(2023, 1, 1));
    assert_eq!(share, dec!(100));
}

#[test]
fn test_prorate_monthly_partition_sums_to_amount() {
    for (year, amount) in [(2023, 100_000_i64), (2024, 100_000), (2024, -123_457), (2023, 1)] {
        let months: Vec<Month> = Month::new(year, 1)
            .unwrap()
            .through(Month::new(year, 12).unwrap())
            .collect();

        let shares: Vec<Decimal> = months
            .iter()
            .map(|m| prorate_annual_for_range(year, amount, m.first_day(), m.last_day()))
            .collect();

        let exact: Decimal = shares.iter().sum();
        assert_eq!(round_cents(exact), amount);

        let rounded_each: i64 = shares.iter().map(|s| round_cents(*s)).sum();
        assert!(
            (rounded_each - amount).abs() <= months.len() as i64,
            "year {year}: {rounded_each} vs {amount}"
        );
    }
}

#[test]
fn test_prorate_uneven_partition_sums_to_amount() {
    let cuts = [
        (ymd(2024, 1, 1), ymd(2024, 1, 1)),
        (ymd(2024, 1, 2), ymd(2024, 2, 28)),
        (ymd(2024, 2, 29), ymd(2024, 7, 13)),
        (ymd(2024, 7, 14), ymd(2024, 12, 30)),
        (ymd(2024, 12, 31), ymd(2024, 12, 31)),
    ];
    let total: Decimal = cuts
        .iter()
        .map(|(s, e)| prorate_annual_for_range(2024, 98_765, *s, *e))
        .sum();
    assert_eq!(round_cents(total), 98_765);
}
