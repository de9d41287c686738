//! Accounting period value type.
//!
//! Voucher numbering is scoped to (tenant, period); the period is the fiscal
//! year the posting date falls into.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// An accounting period (fiscal year).
///
/// Value object: immutable, compared by value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(i32);

impl Period {
    pub fn new(year: i32) -> Self {
        Self(year)
    }

    /// Period a posting date belongs to.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.year())
    }

    pub fn year(&self) -> i32 {
        self.0
    }
}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_derives_from_posting_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(Period::from_date(date), Period::new(2026));
    }

    #[test]
    fn periods_order_by_year() {
        assert!(Period::new(2025) < Period::new(2026));
    }
}
