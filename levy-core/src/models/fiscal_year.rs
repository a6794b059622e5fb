use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A labeled period that one slab table applies to, e.g. `2026-2027`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear {
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl FiscalYear {
    /// Builds the July-to-June year named by a `YYYY-YYYY` label.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use levy_core::FiscalYear;
    ///
    /// let year = FiscalYear::from_label("2026-2027").unwrap();
    /// assert_eq!(year.start_date, NaiveDate::from_ymd_opt(2026, 7, 1).unwrap());
    /// assert_eq!(year.end_date, NaiveDate::from_ymd_opt(2027, 6, 30).unwrap());
    ///
    /// assert!(FiscalYear::from_label("2026-2028").is_none());
    /// ```
    pub fn from_label(label: &str) -> Option<Self> {
        let (first, second) = label.trim().split_once('-')?;
        if first.len() != 4 || second.len() != 4 {
            return None;
        }
        let first: i32 = first.parse().ok()?;
        let second: i32 = second.parse().ok()?;
        if second != first + 1 {
            return None;
        }

        Some(Self {
            label: format!("{first}-{second}"),
            start_date: NaiveDate::from_ymd_opt(first, 7, 1)?,
            end_date: NaiveDate::from_ymd_opt(second, 6, 30)?,
        })
    }

    pub fn contains(
        &self,
        date: NaiveDate,
    ) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_label_rejects_malformed_labels() {
        assert!(FiscalYear::from_label("2026").is_none());
        assert!(FiscalYear::from_label("26-27").is_none());
        assert!(FiscalYear::from_label("abcd-efgh").is_none());
        assert!(FiscalYear::from_label("2027-2026").is_none());
    }

    #[test]
    fn contains_covers_both_ends() {
        let year = FiscalYear::from_label("2025-2026").unwrap();

        assert!(year.contains(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()));
        assert!(year.contains(NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()));
        assert!(!year.contains(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()));
    }
}
