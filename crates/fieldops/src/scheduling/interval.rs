use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Duration assumed for a job that has no recorded end.
pub const DEFAULT_JOB_DURATION_MINUTES: i64 = 60;

pub fn default_job_duration() -> Duration {
    Duration::minutes(DEFAULT_JOB_DURATION_MINUTES)
}

/// End of an interval whose end may be missing.
pub fn effective_end(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> DateTime<Utc> {
    end.unwrap_or_else(|| start + default_job_duration())
}

/// Half-open overlap test used for double-booking checks.
///
/// A missing `a_end` is read as `a_start + 60 minutes`. Intervals that only
/// touch at an endpoint do not overlap.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: Option<DateTime<Utc>>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    let a_end = effective_end(a_start, a_end);
    a_start < b_end && b_start < a_end
}

/// True when `[outer_start, outer_end)` contains all of `[inner_start, inner_end)`.
pub fn fully_covers(
    outer_start: DateTime<Utc>,
    outer_end: DateTime<Utc>,
    inner_start: DateTime<Utc>,
    inner_end: DateTime<Utc>,
) -> bool {
    outer_start <= inner_start && outer_end >= inner_end
}

/// Half-open instant range, also used as the range hint for data-access lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Range for an interval with an optional end, using the default duration.
    pub fn open_ended(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self::new(start, effective_end(start, end))
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        overlaps(self.start, Some(self.end), other.start, other.end)
    }

    pub fn covers(&self, other: &TimeRange) -> bool {
        fully_covers(self.start, self.end, other.start, other.end)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Local calendar day expressed as a half-open UTC range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CalendarDay {
    /// The day in `offset` local time that contains `instant`.
    pub fn containing(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        let date = instant.with_timezone(&offset).date_naive();
        Self::of(date, offset)
    }

    pub fn of(date: NaiveDate, offset: FixedOffset) -> Self {
        let start = local_to_utc(date, NaiveTime::MIN, offset);
        Self {
            date,
            start,
            end: start + Duration::days(1),
        }
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.range().contains(instant)
    }
}

/// Converts a local wall-clock time at a fixed offset into a UTC instant.
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(time);
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc)
}
