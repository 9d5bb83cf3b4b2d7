use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::geo::GeoPoint;
use super::interval::{effective_end, TimeRange};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechnicianId(pub String);

impl fmt::Display for TechnicianId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job lifecycle status as stored by the dispatch back office.
///
/// Statuses are free-form strings upstream; anything other than the two
/// finished states counts as active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Other(String),
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Self::Pending,
            "in progress" | "in_progress" | "in-progress" => Self::InProgress,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Other(normalized),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other(label) => label,
        }
    }

    /// Active jobs count toward conflict detection and same-day load.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<JobStatus> for String {
    fn from(value: JobStatus) -> Self {
        value.label().to_string()
    }
}

/// The scheduling-relevant subset of a job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub technician_id: Option<TechnicianId>,
    pub status: JobStatus,
}

impl Job {
    /// End used for overlap checks; the record itself keeps `end` as stored.
    pub fn effective_end(&self) -> DateTime<Utc> {
        effective_end(self.start, self.end)
    }

    pub fn interval(&self) -> TimeRange {
        TimeRange::open_ended(self.start, self.end)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technician {
    pub id: TechnicianId,
    pub name: String,
    #[serde(default)]
    pub home: Option<GeoPoint>,
    #[serde(default)]
    pub service_radius_km: Option<f64>,
    pub is_available: bool,
}

impl Technician {
    /// Radius usable for matching; zero, negative and non-finite values are
    /// treated as not configured.
    pub fn usable_radius_km(&self) -> Option<f64> {
        self.service_radius_km
            .filter(|radius| radius.is_finite() && *radius > 0.0)
    }
}

/// Interval during which a technician accepts work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub technician_id: TechnicianId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AvailabilityWindow {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }
}

/// A technician that survived every filter stage for a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTechnician {
    pub technician_id: TechnicianId,
    pub distance_km: f64,
    pub same_day_load: u32,
}
