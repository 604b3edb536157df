///! N2YO client for satellites currently above the observer
use async_trait::async_trait;
use std::time::Duration;

use super::types::{AboveResponse, Observation};
use crate::config::{FeedConfig, LocationConfig};
use crate::error::FeedError;

/// "All categories" in the N2YO API
const ANY_CATEGORY: u32 = 0;

/// Source of live observations
#[async_trait]
pub trait SatelliteFeed: Send + Sync {
    /// Satellites within `radius` degrees of the zenith
    async fn above(&self, radius: u32) -> Result<Vec<Observation>, FeedError>;
}

pub struct N2yoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    location: LocationConfig,
}

impl N2yoClient {
    pub fn new(feed: &FeedConfig, location: &LocationConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(feed.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: feed.base_url.trim_end_matches('/').to_string(),
            api_key: feed.api_key.clone(),
            location: location.clone(),
        })
    }

    fn above_url(&self, radius: u32) -> String {
        format!(
            "{}/satellite/above/{}/{}/{}/{}/{}/&apiKey={}",
            self.base_url,
            self.location.latitude,
            self.location.longitude,
            self.location.altitude,
            radius,
            ANY_CATEGORY,
            self.api_key
        )
    }
}

#[async_trait]
impl SatelliteFeed for N2yoClient {
    async fn above(&self, radius: u32) -> Result<Vec<Observation>, FeedError> {
        tracing::debug!("Querying satellites above observer (radius {})", radius);

        let response = self.client.get(self.above_url(radius)).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status()));
        }

        let body = response.text().await?;
        parse_above_response(&body)
    }
}

/// Parse an `above` response body.
pub fn parse_above_response(json: &str) -> Result<Vec<Observation>, FeedError> {
    let response: AboveResponse = serde_json::from_str(json)?;

    if let Some(error) = response.error {
        return Err(FeedError::Api(error));
    }
    if let Some(info) = &response.info {
        tracing::debug!(
            "Feed reported {:?} satellites, {:?} transactions in the last hour",
            info.sat_count,
            info.transactions_count
        );
    }

    Ok(response
        .above
        .unwrap_or_default()
        .into_iter()
        .map(Observation::from)
        .collect())
}
