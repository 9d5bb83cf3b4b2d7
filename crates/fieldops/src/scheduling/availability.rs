use chrono::{Duration, FixedOffset, NaiveDate, NaiveTime};

use super::domain::{AvailabilityWindow, TechnicianId};
use super::interval::local_to_utc;

/// Daily working hours in local wall-clock time, rolled forward into
/// concrete UTC availability windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyAvailability {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for DailyAvailability {
    fn default() -> Self {
        Self::standard()
    }
}

impl DailyAvailability {
    /// 08:00 to 20:00 local time.
    pub fn standard() -> Self {
        Self {
            start: NaiveTime::MIN + Duration::hours(8),
            end: NaiveTime::MIN + Duration::hours(20),
        }
    }

    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn window_for(
        &self,
        technician: &TechnicianId,
        date: NaiveDate,
        offset: FixedOffset,
    ) -> Option<AvailabilityWindow> {
        if self.start >= self.end {
            return None;
        }

        Some(AvailabilityWindow {
            technician_id: technician.clone(),
            start: local_to_utc(date, self.start, offset),
            end: local_to_utc(date, self.end, offset),
        })
    }

    /// One window per technician per day for `days` days starting at `from`.
    pub fn windows_for_days(
        &self,
        technicians: &[TechnicianId],
        from: NaiveDate,
        days: u32,
        offset: FixedOffset,
    ) -> Vec<AvailabilityWindow> {
        from.iter_days()
            .take(days as usize)
            .flat_map(|date| {
                technicians
                    .iter()
                    .filter_map(move |technician| self.window_for(technician, date, offset))
            })
            .collect()
    }
}
