///! N2YO "above" response types

use serde::{Deserialize, Serialize};
use skywatch_common::NoradId;

/// One satellite currently above the observer. Lives for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub name: String,
    pub norad_id: NoradId,
    pub latitude: f64,
    pub longitude: f64,
    /// km
    pub altitude: f64,
}

/// Raw item of the `above` list
#[derive(Debug, Clone, Deserialize)]
pub struct RawSatellite {
    pub satid: NoradId,
    pub satname: String,
    #[allow(dead_code)]
    #[serde(rename = "intDesignator", default)]
    pub int_designator: Option<String>,
    #[allow(dead_code)]
    #[serde(rename = "launchDate", default)]
    pub launch_date: Option<String>,
    pub satlat: f64,
    pub satlng: f64,
    pub satalt: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedInfo {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(rename = "transactionscount", default)]
    pub transactions_count: Option<u64>,
    #[serde(rename = "satcount", default)]
    pub sat_count: Option<u64>,
}

/// Wrapper for the JSON response
#[derive(Debug, Clone, Deserialize)]
pub struct AboveResponse {
    #[serde(default)]
    pub info: Option<FeedInfo>,
    #[serde(default)]
    pub above: Option<Vec<RawSatellite>>,
    /// Set instead of `above` when the API rejects the call
    #[serde(default)]
    pub error: Option<String>,
}

impl From<RawSatellite> for Observation {
    fn from(raw: RawSatellite) -> Self {
        Self {
            name: raw.satname,
            norad_id: raw.satid,
            latitude: raw.satlat,
            longitude: raw.satlng,
            altitude: raw.satalt,
        }
    }
}
