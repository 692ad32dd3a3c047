//! Partial genealogical dates.
//!
//! Recorded dates are frequently incomplete ("1890", "May 1890") or purely
//! textual ("before the war"). A `GenDate` keeps whatever precision the
//! source offered and exposes a sortable integer so table views can order
//! rows without parsing display strings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A possibly partial calendar date. A zero component means "not recorded".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenDate {
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub day: u32,
    /// Verbatim text when the date could not be parsed into components.
    #[serde(default)]
    pub text: String,
}

impl GenDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            text: String::new(),
        }
    }

    pub fn from_year(year: i32) -> Self {
        Self::from_ymd(year, 0, 0)
    }

    /// A date that carries only free text.
    pub fn textual(text: impl Into<String>) -> Self {
        Self {
            year: 0,
            month: 0,
            day: 0,
            text: text.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.year == 0 && self.text.is_empty()
    }

    /// Integer that orders dates chronologically; unknown trailing
    /// components sort before any recorded value of that component.
    pub fn sort_value(&self) -> i64 {
        i64::from(self.year) * 10_000 + i64::from(self.month) * 100 + i64::from(self.day)
    }

    /// Whether the recorded components form a real calendar date.
    /// Text-only dates are never valid; partial dates are valid as long as
    /// the recorded components are in range.
    pub fn is_valid(&self) -> bool {
        if self.year == 0 {
            return false;
        }
        match (self.month, self.day) {
            (0, 0) => true,
            (0, _) => false,
            (m, 0) => m <= 12,
            (m, d) => NaiveDate::from_ymd_opt(self.year, m, d).is_some(),
        }
    }

    pub fn display(&self) -> String {
        if !self.text.is_empty() {
            return self.text.clone();
        }
        match (self.year, self.month, self.day) {
            (0, _, _) => String::new(),
            (y, 0, _) => format!("{y}"),
            (y, m, 0) => format!("{y}-{m:02}"),
            (y, m, d) => format!("{y}-{m:02}-{d:02}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_value_orders_partial_dates() {
        let year_only = GenDate::from_year(1890);
        let with_month = GenDate::from_ymd(1890, 5, 0);
        let full = GenDate::from_ymd(1890, 5, 12);
        assert!(year_only.sort_value() < with_month.sort_value());
        assert!(with_month.sort_value() < full.sort_value());
    }

    #[test]
    fn impossible_dates_are_invalid() {
        assert!(GenDate::from_ymd(1890, 5, 12).is_valid());
        assert!(!GenDate::from_ymd(1890, 2, 30).is_valid());
        assert!(!GenDate::from_ymd(1890, 13, 0).is_valid());
        assert!(!GenDate::textual("before the war").is_valid());
        assert!(GenDate::from_year(1890).is_valid());
    }

    #[test]
    fn display_matches_precision() {
        assert_eq!(GenDate::from_ymd(1890, 5, 12).display(), "1890-05-12");
        assert_eq!(GenDate::from_ymd(1890, 5, 0).display(), "1890-05");
        assert_eq!(GenDate::from_year(1890).display(), "1890");
        assert_eq!(GenDate::textual("circa 1900").display(), "circa 1900");
        assert_eq!(GenDate::default().display(), "");
    }
}
