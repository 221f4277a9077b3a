#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::*;
use crate::models::CategoryType;

// ── normalize ─────────────────────────────────────────────────

#[test]
fn test_normalize_expense_is_negative() {
    assert_eq!(normalize(100, CategoryType::Expense), -100);
    assert_eq!(normalize(-100, CategoryType::Expense), -100);
}

#[test]
fn test_normalize_income_is_positive() {
    assert_eq!(normalize(-50, CategoryType::Income), 50);
    assert_eq!(normalize(50, CategoryType::Income), 50);
}

#[test]
fn test_normalize_transfer_keeps_sign() {
    assert_eq!(normalize(-75, CategoryType::Transfer), -75);
    assert_eq!(normalize(75, CategoryType::Transfer), 75);
}

#[test]
fn test_normalize_zero() {
    for t in CategoryType::all() {
        assert_eq!(normalize(0, *t), 0);
    }
}

#[test]
fn test_normalize_does_not_overflow() {
    assert_eq!(normalize(i64::MIN, CategoryType::Income), i64::MAX);
    assert_eq!(normalize(i64::MIN, CategoryType::Expense), -i64::MAX);
}

// ── effective_type ────────────────────────────────────────────

#[test]
fn test_effective_type_identity_for_income_and_expense() {
    assert_eq!(effective_type(-10, CategoryType::Income), Flow::Income);
    assert_eq!(effective_type(10, CategoryType::Expense), Flow::Expense);
}

#[test]
fn test_effective_type_transfer_by_sign() {
    assert_eq!(effective_type(10, CategoryType::Transfer), Flow::Income);
    assert_eq!(effective_type(0, CategoryType::Transfer), Flow::Income);
    assert_eq!(effective_type(-1, CategoryType::Transfer), Flow::Expense);
}

// ── round_cents ───────────────────────────────────────────────

#[test]
fn test_round_cents_half_away_from_zero() {
    assert_eq!(round_cents(dec!(10.5)), 11);
    assert_eq!(round_cents(dec!(-10.5)), -11);
    assert_eq!(round_cents(dec!(10.49)), 10);
    assert_eq!(round_cents(dec!(-59835.616)), -59836);
}

// ── parse_dollars ─────────────────────────────────────────────

#[test]
fn test_parse_dollars() {
    assert_eq!(parse_dollars("200").unwrap(), 20000);
    assert_eq!(parse_dollars("$1,234.50").unwrap(), 123450);
    assert_eq!(parse_dollars(" 0.01 ").unwrap(), 1);
    assert_eq!(parse_dollars("-12").unwrap(), -1200);
}

#[test]
fn test_parse_dollars_rejects_garbage() {
    assert!(parse_dollars("").is_err());
    assert!(parse_dollars("twelve").is_err());
    assert!(parse_dollars("1.005").is_err());
}

// ── format ────────────────────────────────────────────────────

#[test]
fn test_format_cents() {
    assert_eq!(format_cents(0), "$0.00");
    assert_eq!(format_cents(5), "$0.05");
    assert_eq!(format_cents(123456789), "$1,234,567.89");
    assert_eq!(format_cents(-20000), "-$200.00");
}

#[test]
fn test_format_amount_rounds_once() {
    assert_eq!(format_amount(dec!(99.5)), "$1.00");
    assert_eq!(format_amount(dec!(-120000)), "-$1,200.00");
}

#[test]
fn test_format_percent() {
    assert_eq!(format_percent(dec!(0.125)), "12.5%");
    assert_eq!(format_percent(dec!(-0.5)), "-50.0%");
}

// ── truncate ──────────────────────────────────────────────────

#[test]
fn test_truncate() {
    assert_eq!(truncate("hello", 10), "hello");
    assert_eq!(truncate("hello world", 5), "hell…");
    assert_eq!(truncate("hello", 0), "");
    assert_eq!(truncate("日本語テスト", 4), "日本語…");
}
