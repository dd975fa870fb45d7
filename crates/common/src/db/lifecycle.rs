//! Date-range rules shared by loans and supervisions
//!
//! A loan or supervision is open while its closing date is null. Durations
//! are counted in 30-day months, rounded up.

use chrono::NaiveDate;
use serde::Serialize;

/// Days per month used by the duration approximation
pub const DAYS_PER_MONTH: i64 = 30;

/// Derived state of an equipment loan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Returned,
}

impl LoanStatus {
    pub fn of(return_date: Option<NaiveDate>) -> Self {
        match return_date {
            None => LoanStatus::Active,
            Some(_) => LoanStatus::Returned,
        }
    }
}

/// Derived state of a supervision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisionStatus {
    Ongoing,
    Ended,
}

impl SupervisionStatus {
    pub fn of(end_date: Option<NaiveDate>) -> Self {
        match end_date {
            None => SupervisionStatus::Ongoing,
            Some(_) => SupervisionStatus::Ended,
        }
    }
}

/// Whole days between `start` and `end` (or `today` while open), never negative
pub fn elapsed_days(start: NaiveDate, end: Option<NaiveDate>, today: NaiveDate) -> i64 {
    let until = end.unwrap_or(today);
    (until - start).num_days().max(0)
}

/// `ceil(days / 30)`
pub fn duration_months(start: NaiveDate, end: Option<NaiveDate>, today: NaiveDate) -> i64 {
    let days = elapsed_days(start, end, today);
    (days + DAYS_PER_MONTH - 1) / DAYS_PER_MONTH
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_closed_duration_rounds_up() {
        let start = date(2024, 1, 1);
        assert_eq!(duration_months(start, Some(date(2024, 1, 31)), date(2030, 1, 1)), 1);
        assert_eq!(duration_months(start, Some(date(2024, 2, 1)), date(2030, 1, 1)), 2);
        assert_eq!(duration_months(start, Some(start), date(2030, 1, 1)), 0);
    }

    #[test]
    fn test_open_duration_counts_to_today() {
        let start = date(2024, 1, 1);
        let today = date(2024, 4, 1);
        // 91 days -> 4 months of 30 days
        assert_eq!(duration_months(start, None, today), 4);
    }

    #[test]
    fn test_reversed_range_is_zero() {
        assert_eq!(duration_months(date(2024, 5, 1), Some(date(2024, 1, 1)), date(2024, 6, 1)), 0);
    }

    #[test]
    fn test_status_derivation() {
        assert_eq!(LoanStatus::of(None), LoanStatus::Active);
        assert_eq!(LoanStatus::of(Some(date(2024, 1, 1))), LoanStatus::Returned);
        assert_eq!(SupervisionStatus::of(None), SupervisionStatus::Ongoing);
    }
}
