//! Calendar math for spreading once-a-year amounts across arbitrary windows.
//!
//! Nothing here rounds. Callers sum the unrounded shares and round once, at
//! display or export time.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Number of days in `year`, from the distance between consecutive New Year's
/// days.
pub(crate) fn days_in_year(year: i32) -> i64 {
    match (year_start(year), year_start(year + 1)) {
        (Some(start), Some(next)) => (next - start).num_days(),
        _ => 365,
    }
}

/// Days shared by the closed ranges `[a_start, a_end]` and `[b_start, b_end]`.
/// Zero when they do not meet or either range is reversed.
pub(crate) fn overlap_days_inclusive(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> i64 {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    if end < start {
        return 0;
    }
    (end - start).num_days() + 1
}

/// Share of `amount` (covering all of `year`) that falls in
/// `[range_start, range_end]`, by day count.
pub(crate) fn prorate_annual_for_range(
    year: i32,
    amount: i64,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Decimal {
    let Some((year_first, year_last)) = year_bounds(year) else {
        return Decimal::ZERO;
    };
    let overlap = overlap_days_inclusive(range_start, range_end, year_first, year_last);
    if overlap == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(amount) * Decimal::from(overlap) / Decimal::from(days_in_year(year))
}

/// January 1st and December 31st of `year`.
pub(crate) fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((year_start(year)?, NaiveDate::from_ymd_opt(year, 12, 31)?))
}

fn year_start(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}

#[cfg(test)]
mod tests;
