use chrono::{FixedOffset, Offset, Utc};

use super::policy::WindowPolicy;

/// Knobs for eligibility ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingConfig {
    pub window_policy: WindowPolicy,
    /// Offset defining local calendar days for same-day load.
    pub day_offset: FixedOffset,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            window_policy: WindowPolicy::default(),
            day_offset: Utc.fix(),
        }
    }
}

impl SchedulingConfig {
    pub fn with_policy(mut self, window_policy: WindowPolicy) -> Self {
        self.window_policy = window_policy;
        self
    }

    pub fn with_day_offset(mut self, day_offset: FixedOffset) -> Self {
        self.day_offset = day_offset;
        self
    }
}
