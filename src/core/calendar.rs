//! Instants and limit-window boundaries.
//!
//! A limit window is the half-open interval `[cutoff, now)`. Effect snapshots
//! are inclusive at their instant, so "everything before the cutoff" is the
//! snapshot taken one [`quantum`] earlier.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest step between two representable instants.
pub fn quantum() -> Duration {
    Duration::nanoseconds(1)
}

/// The last instant strictly before `cutoff`.
///
/// At the lower bound of the representable range there is no earlier
/// instant; `cutoff` itself is returned.
pub fn just_before(cutoff: DateTime<Utc>) -> DateTime<Utc> {
    cutoff.checked_sub_signed(quantum()).unwrap_or(cutoff)
}

/// Calendar period a transaction limit is measured over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitWindow {
    #[default]
    Daily,
    Monthly,
}

impl LimitWindow {
    /// Start of the window containing `now`, in the account's local calendar.
    ///
    /// `offset` is the account's fixed UTC offset; the returned instant is the
    /// local midnight (of the current day, or of the first of the current
    /// month) converted back to UTC.
    ///
    /// ```
    /// use posting_limits::core::calendar::LimitWindow;
    /// use chrono::{FixedOffset, TimeZone, Utc};
    ///
    /// let now = Utc.with_ymd_and_hms(2024, 5, 17, 15, 30, 0).unwrap();
    /// let utc = FixedOffset::east_opt(0).unwrap();
    /// assert_eq!(
    ///     LimitWindow::Daily.cutoff(now, utc),
    ///     Utc.with_ymd_and_hms(2024, 5, 17, 0, 0, 0).unwrap(),
    /// );
    /// assert_eq!(
    ///     LimitWindow::Monthly.cutoff(now, utc),
    ///     Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
    /// );
    /// ```
    pub fn cutoff(self, now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
        let today = now.with_timezone(&offset).date_naive();
        let first_day = match self {
            LimitWindow::Daily => today,
            LimitWindow::Monthly => first_of_month(today),
        };
        let local_midnight = first_day.and_time(NaiveTime::default());
        let utc_midnight = local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc_midnight)
    }
}

impl fmt::Display for LimitWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitWindow::Daily => write!(f, "daily"),
            LimitWindow::Monthly => write!(f, "monthly"),
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}
