use serde::{Deserialize, Serialize};

/// NORAD catalog number (satellite unique identifier)
pub type NoradId = u32;

/// Schema richness of the loaded reference dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceMode {
    /// Country and purpose columns are both present
    #[serde(rename = "rich")]
    Rich,
    /// A table loaded but lacks the enrichment columns
    #[serde(rename = "minimal")]
    Minimal,
    /// No table could be loaded
    #[serde(rename = "absent")]
    Absent,
}

impl ReferenceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceMode::Rich => "rich",
            ReferenceMode::Minimal => "minimal",
            ReferenceMode::Absent => "absent",
        }
    }

    /// Display label shown next to the dataset summary
    pub fn status_label(&self) -> &'static str {
        match self {
            ReferenceMode::Rich => "Active",
            ReferenceMode::Minimal => "Lite",
            ReferenceMode::Absent => "Not found",
        }
    }

    pub fn is_rich(&self) -> bool {
        matches!(self, ReferenceMode::Rich)
    }
}

impl Default for ReferenceMode {
    fn default() -> Self {
        ReferenceMode::Absent
    }
}

impl std::fmt::Display for ReferenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReferenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rich" => Ok(ReferenceMode::Rich),
            "minimal" => Ok(ReferenceMode::Minimal),
            "absent" => Ok(ReferenceMode::Absent),
            _ => Err(format!("Unknown reference mode: {}", s)),
        }
    }
}

/// Read-only summary of the reference dataset for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStatus {
    /// "Active", "Lite" or "Not found"
    pub status: String,
    /// File modification time, `%Y-%m-%d %H:%M` (UTC)
    pub last_modified: Option<String>,
    /// Age of the file in days, one decimal
    pub age_days: Option<f64>,
    pub mode: ReferenceMode,
    pub records: usize,
}

/// Usage counter as shown to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub count: u64,
    /// `max(0, limit - count)`, informational only
    pub remaining: u64,
    pub limit: u64,
}

/// Live observation joined with reference metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub name: String,
    #[serde(rename = "norad")]
    pub norad_id: NoradId,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    /// Altitude in km
    #[serde(rename = "alt")]
    pub altitude: f64,
    pub country: String,
    pub purpose: String,
    pub user: String,
}

/// One element of the `satellites` list in a response.
///
/// A failed or empty feed is reported in-band as a single `error` / `info`
/// entry instead of a list of satellites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SatelliteListEntry {
    Satellite(EnrichedRecord),
    Error { error: String },
    Info { info: String },
}

/// Result of the `satellites(radius)` operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatellitesResponse {
    pub usage: UsageSnapshot,
    pub reference_status: ReferenceStatus,
    pub satellites: Vec<SatelliteListEntry>,
}

/// Result of the `refresh_reference()` operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub reference_status: ReferenceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_labels() {
        assert_eq!(ReferenceMode::Rich.status_label(), "Active");
        assert_eq!(ReferenceMode::Minimal.status_label(), "Lite");
        assert_eq!(ReferenceMode::Absent.status_label(), "Not found");
        assert_eq!("RICH".parse::<ReferenceMode>().unwrap(), ReferenceMode::Rich);
        assert!("bogus".parse::<ReferenceMode>().is_err());
    }

    #[test]
    fn test_entry_serialization() {
        let record = EnrichedRecord {
            name: "ISS (ZARYA)".to_string(),
            norad_id: 25544,
            latitude: 40.1,
            longitude: -3.7,
            altitude: 420.5,
            country: "Multinational".to_string(),
            purpose: "Space Science".to_string(),
            user: "N/A".to_string(),
        };
        let json = serde_json::to_value(SatelliteListEntry::Satellite(record)).unwrap();
        assert_eq!(json["norad"], 25544);
        assert_eq!(json["alt"], 420.5);
        assert_eq!(json["country"], "Multinational");

        let json = serde_json::to_value(SatelliteListEntry::Error {
            error: "timeout".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "error": "timeout" }));
    }
}
