use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use skywatch_common::{RefreshResponse, SatelliteListEntry, SatellitesResponse};

use crate::config::BackendConfig;
use crate::module::enrich::Enricher;
use crate::module::feed::{N2yoClient, SatelliteFeed};
use crate::module::reference::{Acquire, FreshnessPolicy, ReferenceStore, ViewerAcquisition};
use crate::module::usage::{JsonUsageStore, UsageLedger, UsageStore};

pub const NO_SATELLITES: &str = "No satellites detected above your location.";

/// Everything a request needs, shared by all handlers
pub struct SkywatchService {
    reference: ReferenceStore,
    freshness: FreshnessPolicy,
    feed: Arc<dyn SatelliteFeed>,
    enricher: Enricher,
    usage: UsageLedger,
    default_radius: u32,
}

impl SkywatchService {
    /// Build the service with the real network and file collaborators.
    pub async fn from_config(config: &BackendConfig) -> Result<Self> {
        let acquirer: Arc<dyn Acquire> = Arc::new(ViewerAcquisition::new(&config.reference)?);
        let feed: Arc<dyn SatelliteFeed> = Arc::new(N2yoClient::new(&config.feed, &config.location)?);
        let usage_store: Arc<dyn UsageStore> = Arc::new(JsonUsageStore::new(config.usage_path()));

        Ok(Self::with_parts(config, acquirer, feed, usage_store).await)
    }

    /// Build the service around the given collaborators.
    pub async fn with_parts(
        config: &BackendConfig,
        acquirer: Arc<dyn Acquire>,
        feed: Arc<dyn SatelliteFeed>,
        usage_store: Arc<dyn UsageStore>,
    ) -> Self {
        let reference_path = config.reference_path();

        Self {
            freshness: FreshnessPolicy::new(&reference_path, &config.reference, acquirer),
            reference: ReferenceStore::new(reference_path),
            feed,
            enricher: Enricher::from_config(&config.enrichment),
            usage: UsageLedger::open(usage_store, &config.usage).await,
            default_radius: config.feed.default_radius,
        }
    }

    /// Make sure a usable reference table is loaded before serving.
    pub async fn startup(&self) {
        if !self.freshness.ensure_fresh(false).await {
            warn!("Reference table could not be acquired, continuing with what is on disk");
        }

        let snapshot = self.reference.reload().await;
        info!(
            "Reference table ready: mode {}, {} records",
            snapshot.mode,
            snapshot.record_count()
        );
    }

    /// Satellites above the observer, lowest first, with reference metadata.
    ///
    /// Every call counts against the usage ledger, including failed ones.
    pub async fn satellites(&self, radius: Option<u32>) -> SatellitesResponse {
        let radius = radius.unwrap_or(self.default_radius);

        let satellites = match self.feed.above(radius).await {
            Ok(observations) if observations.is_empty() => {
                debug!("Feed returned no satellites for radius {}", radius);
                vec![SatelliteListEntry::Info {
                    info: NO_SATELLITES.to_string(),
                }]
            }
            Ok(observations) => {
                let snapshot = self.reference.current().await;
                self.enricher
                    .enrich(&observations, &snapshot)
                    .into_iter()
                    .map(SatelliteListEntry::Satellite)
                    .collect()
            }
            Err(e) => {
                warn!("Satellite feed failed: {}", e);
                vec![SatelliteListEntry::Error {
                    error: e.to_string(),
                }]
            }
        };

        let state = self.usage.record_call().await;

        SatellitesResponse {
            usage: self.usage.to_snapshot(&state),
            reference_status: self.reference.status().await,
            satellites,
        }
    }

    /// Force a new acquisition and publish whatever is on disk afterwards.
    pub async fn refresh_reference(&self) -> RefreshResponse {
        let success = self.freshness.ensure_fresh(true).await;
        self.reference.reload().await;

        RefreshResponse {
            success,
            reference_status: self.reference.status().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::module::feed::Observation;
    use crate::module::reference::store::parse_csv;
    use crate::module::reference::acquisition::write_table;
    use async_trait::async_trait;
    use skywatch_common::ReferenceMode;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const REFERENCE_CSV: &str = "NORAD Number,Country of Owner,Purpose,Users\n\
                                 200,usa,comms,commercial\n";

    enum StubFeed {
        Observations(Vec<Observation>),
        Failing,
    }

    #[async_trait]
    impl SatelliteFeed for StubFeed {
        async fn above(&self, _radius: u32) -> Result<Vec<Observation>, FeedError> {
            match self {
                StubFeed::Observations(obs) => Ok(obs.clone()),
                StubFeed::Failing => Err(FeedError::Api("Invalid API Key!".to_string())),
            }
        }
    }

    /// Writes `REFERENCE_CSV` when `succeed` is set
    struct StubAcquirer {
        succeed: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Acquire for StubAcquirer {
        async fn acquire(&self, dest: &Path) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.succeed {
                return false;
            }
            let table = parse_csv(REFERENCE_CSV).unwrap();
            write_table(dest, &table).await.is_ok()
        }
    }

    fn obs(norad_id: u32, altitude: f64) -> Observation {
        Observation {
            name: format!("SAT-{}", norad_id),
            norad_id,
            latitude: 40.0,
            longitude: -3.0,
            altitude,
        }
    }

    fn config(dir: &TempDir) -> BackendConfig {
        let mut config = BackendConfig::from_toml(
            "[location]\nlatitude = 40.4\nlongitude = -3.7\n\n[feed]\napi_key = \"KEY\"\n",
        )
        .unwrap();
        config.data_dir = dir.path().to_path_buf();
        config
    }

    async fn service(dir: &TempDir, feed: StubFeed, acquirer: Arc<StubAcquirer>) -> SkywatchService {
        let config = config(dir);
        SkywatchService::with_parts(
            &config,
            acquirer,
            Arc::new(feed),
            Arc::new(JsonUsageStore::new(config.usage_path())),
        )
        .await
    }

    fn acquirer(succeed: bool) -> Arc<StubAcquirer> {
        Arc::new(StubAcquirer {
            succeed,
            calls: AtomicUsize::new(0),
        })
    }

    fn ids(response: &SatellitesResponse) -> Vec<u32> {
        response
            .satellites
            .iter()
            .filter_map(|entry| match entry {
                SatelliteListEntry::Satellite(record) => Some(record.norad_id),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_end_to_end_enrichment() {
        let dir = TempDir::new().unwrap();
        let feed = StubFeed::Observations(vec![obs(100, 500.0), obs(200, 300.0), obs(300, 700.0)]);
        let service = service(&dir, feed, acquirer(true)).await;
        service.startup().await;

        let response = service.satellites(None).await;
        assert_eq!(ids(&response), vec![200, 100, 300]);

        let SatelliteListEntry::Satellite(first) = &response.satellites[0] else {
            panic!("expected a satellite entry");
        };
        assert_eq!(first.country, "United States");
        assert_eq!(first.purpose, "Comms");
        assert_eq!(first.user, "Commercial");

        let SatelliteListEntry::Satellite(second) = &response.satellites[1] else {
            panic!("expected a satellite entry");
        };
        assert_eq!(second.country, "Unknown");
        assert_eq!(second.purpose, "N/A");

        assert_eq!(response.reference_status.mode, ReferenceMode::Rich);
        assert_eq!(response.reference_status.status, "Active");
        assert_eq!(response.usage.count, 1);
        assert_eq!(response.usage.remaining, 999);
    }

    #[tokio::test]
    async fn test_feed_error_still_counts() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, StubFeed::Failing, acquirer(false)).await;
        service.startup().await;

        let response = service.satellites(Some(10)).await;
        assert_eq!(response.satellites.len(), 1);
        assert!(matches!(
            &response.satellites[0],
            SatelliteListEntry::Error { error } if error.contains("Invalid API Key!")
        ));
        assert_eq!(response.usage.count, 1);
        assert_eq!(response.reference_status.status, "Not found");
    }

    #[tokio::test]
    async fn test_empty_feed_reports_info() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, StubFeed::Observations(Vec::new()), acquirer(false)).await;

        let response = service.satellites(None).await;
        assert!(matches!(
            &response.satellites[..],
            [SatelliteListEntry::Info { info }] if info == NO_SATELLITES
        ));
    }

    #[tokio::test]
    async fn test_refresh_forces_acquisition() {
        let dir = TempDir::new().unwrap();
        let stub = acquirer(true);
        let service = service(&dir, StubFeed::Observations(Vec::new()), stub.clone()).await;

        service.startup().await;
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);

        // The written table is tiny, so a non-forced check would renew it too;
        // a forced refresh must acquire regardless.
        let response = service.refresh_reference().await;
        assert!(response.success);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
        assert_eq!(response.reference_status.mode, ReferenceMode::Rich);
        assert_eq!(response.reference_status.records, 1);
        assert!(response.reference_status.last_modified.is_some());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_table() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let table = parse_csv(REFERENCE_CSV).unwrap();
        write_table(&config.reference_path(), &table).await.unwrap();

        let service = service(&dir, StubFeed::Observations(Vec::new()), acquirer(false)).await;
        service.startup().await;

        let response = service.refresh_reference().await;
        assert!(!response.success);
        assert_eq!(response.reference_status.mode, ReferenceMode::Rich);
    }

    #[tokio::test]
    async fn test_usage_persists_between_services() {
        let dir = TempDir::new().unwrap();
        let first = service(&dir, StubFeed::Failing, acquirer(false)).await;
        first.satellites(None).await;
        first.satellites(None).await;
        drop(first);

        let second = service(&dir, StubFeed::Failing, acquirer(false)).await;
        assert_eq!(second.satellites(None).await.usage.count, 3);
    }
}
