use chrono::{Days, NaiveDate};

use crate::row::AnalyticalRow;

/// The date range a row must fall in to be inserted. Both bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow {
    pub start_date: NaiveDate,
    pub since_date: NaiveDate,
}

impl RetentionWindow {
    /// Window whose rolling bound lies `retention_days` before `today`.
    #[must_use]
    pub fn ending_on(today: NaiveDate, start_date: NaiveDate, retention_days: u32) -> Self {
        let since_date = today
            .checked_sub_days(Days::new(u64::from(retention_days)))
            .unwrap_or(NaiveDate::MIN);
        Self {
            start_date,
            since_date,
        }
    }

    /// True iff `date` is strictly after both bounds.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date > self.start_date && date > self.since_date
    }

    #[must_use]
    pub fn keeps(&self, row: &AnalyticalRow) -> bool {
        self.contains(row.date)
    }
}
