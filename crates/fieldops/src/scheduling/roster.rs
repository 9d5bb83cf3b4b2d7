use serde::{Deserialize, Deserializer};
use std::fmt;
use std::io::Read;
use std::path::Path;

use super::domain::{Technician, TechnicianId};
use super::geo::GeoPoint;

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidFlag { technician: String, value: String },
}

impl fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read technician roster: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid technician roster CSV: {}", err),
            RosterImportError::InvalidFlag { technician, value } => write!(
                f,
                "technician {} has unrecognised is_available value '{}'",
                technician, value
            ),
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::InvalidFlag { .. } => None,
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads technician records from a geocoded roster export.
///
/// Expected headers: `id,name,latitude,longitude,service_radius_km,is_available`.
pub struct TechnicianRoster;

impl TechnicianRoster {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Technician>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Technician>, RosterImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut technicians = Vec::new();

        for record in csv_reader.deserialize::<RosterRow>() {
            let row = record?;
            technicians.push(row.into_technician()?);
        }

        Ok(technicians)
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    longitude: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    service_radius_km: Option<f64>,
    #[serde(default)]
    is_available: String,
}

impl RosterRow {
    fn into_technician(self) -> Result<Technician, RosterImportError> {
        let is_available = parse_flag(&self.is_available).ok_or_else(|| {
            RosterImportError::InvalidFlag {
                technician: self.id.clone(),
                value: self.is_available.clone(),
            }
        })?;

        let home = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint::new(latitude, longitude)),
            _ => None,
        };

        Ok(Technician {
            id: TechnicianId(self.id),
            name: self.name,
            home,
            service_radius_km: self.service_radius_km,
            is_available,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "yes" | "1" | "y" => Some(true),
        "false" | "no" | "0" | "n" => Some(false),
        _ => None,
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<f64>().map(Some).map_err(serde::de::Error::custom),
    }
}
