use serde::{Deserialize, Serialize};

use super::super::interval::TimeRange;

/// Rule deciding whether an availability window admits a job interval.
///
/// Stored dispatch data follows both readings; the ranker applies whichever
/// one is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPolicy {
    /// Any overlap between window and job is enough.
    #[default]
    Overlap,
    /// The window must contain the whole job.
    FullyCovers,
}

impl WindowPolicy {
    pub fn admits(self, window: &TimeRange, job: &TimeRange) -> bool {
        match self {
            WindowPolicy::Overlap => job.overlaps(window),
            WindowPolicy::FullyCovers => window.covers(job),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            WindowPolicy::Overlap => "overlap",
            WindowPolicy::FullyCovers => "fully_covers",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "overlap" | "any_overlap" => Some(WindowPolicy::Overlap),
            "fully_covers" | "covers" => Some(WindowPolicy::FullyCovers),
            _ => None,
        }
    }
}
