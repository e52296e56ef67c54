use chrono::{Duration, NaiveDate};
use std::fmt;

/// Inclusive calendar-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    Fetch(DateRange),
    UpToDate,
}

/// Where a series without stored history begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPolicy {
    Lookback { days: i64 },
    HistoryStart(NaiveDate),
}

impl StartPolicy {
    /// A fixed start wins over a lookback window.
    pub fn from_config(lookback_days: i64, history_start: Option<NaiveDate>) -> Self {
        match history_start {
            Some(date) => StartPolicy::HistoryStart(date),
            None => StartPolicy::Lookback { days: lookback_days },
        }
    }

    fn initial_start(self, today: NaiveDate) -> NaiveDate {
        match self {
            StartPolicy::Lookback { days } => today - Duration::days(days),
            StartPolicy::HistoryStart(date) => date,
        }
    }
}

/// Computes the window still missing for one series.
///
/// With a stored cursor the window starts the day after it; otherwise the
/// policy decides. A start that is not strictly before `today` means there
/// is nothing to fetch.
pub fn plan(cursor: Option<NaiveDate>, today: NaiveDate, policy: StartPolicy) -> FetchPlan {
    let start = match cursor {
        Some(last) => last + Duration::days(1),
        None => policy.initial_start(today),
    };

    if start >= today {
        FetchPlan::UpToDate
    } else {
        FetchPlan::Fetch(DateRange { start, end: today })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn resumes_the_day_after_the_cursor() {
        let today = d(2024, 3, 10);
        let policy = StartPolicy::Lookback { days: 365 };

        assert_eq!(
            plan(Some(d(2024, 3, 1)), today, policy),
            FetchPlan::Fetch(DateRange {
                start: d(2024, 3, 2),
                end: today
            })
        );
    }

    #[test]
    fn never_requests_dates_at_or_before_the_cursor() {
        let today = d(2024, 6, 30);
        let policy = StartPolicy::Lookback { days: 3650 };
        let mut cursor = d(2023, 1, 1);

        while cursor < today {
            if let FetchPlan::Fetch(range) = plan(Some(cursor), today, policy) {
                assert!(range.start > cursor);
                assert_eq!(range.end, today);
            }
            cursor += Duration::days(7);
        }
    }

    #[test]
    fn up_to_date_when_cursor_is_yesterday_or_later() {
        let today = d(2024, 3, 10);
        let policy = StartPolicy::Lookback { days: 365 };

        assert_eq!(plan(Some(d(2024, 3, 9)), today, policy), FetchPlan::UpToDate);
        assert_eq!(plan(Some(today), today, policy), FetchPlan::UpToDate);
        assert_eq!(plan(Some(d(2024, 3, 12)), today, policy), FetchPlan::UpToDate);
    }

    #[test]
    fn empty_history_uses_lookback_or_fixed_start() {
        let today = d(2024, 3, 10);

        assert_eq!(
            plan(None, today, StartPolicy::Lookback { days: 365 }),
            FetchPlan::Fetch(DateRange {
                start: d(2023, 3, 11),
                end: today
            })
        );
        assert_eq!(
            plan(None, today, StartPolicy::HistoryStart(d(2020, 1, 1))),
            FetchPlan::Fetch(DateRange {
                start: d(2020, 1, 1),
                end: today
            })
        );
        assert_eq!(
            plan(None, today, StartPolicy::Lookback { days: 0 }),
            FetchPlan::UpToDate
        );
    }

    #[test]
    fn fixed_start_overrides_lookback() {
        assert_eq!(
            StartPolicy::from_config(365, Some(d(2020, 1, 1))),
            StartPolicy::HistoryStart(d(2020, 1, 1))
        );
        assert_eq!(
            StartPolicy::from_config(30, None),
            StartPolicy::Lookback { days: 30 }
        );
    }
}
