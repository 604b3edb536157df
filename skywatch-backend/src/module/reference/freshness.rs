///! Freshness policy - decides when the reference table must be re-acquired

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

use super::acquisition::Acquire;
use super::store::{FileInfo, file_info};
use crate::config::ReferenceConfig;

pub struct FreshnessPolicy {
    path: PathBuf,
    max_age_days: f64,
    /// Smaller files are assumed truncated
    min_size_bytes: u64,
    acquirer: Arc<dyn Acquire>,
}

impl FreshnessPolicy {
    pub fn new(path: impl Into<PathBuf>, config: &ReferenceConfig, acquirer: Arc<dyn Acquire>) -> Self {
        Self {
            path: path.into(),
            max_age_days: config.max_age_days as f64,
            min_size_bytes: config.min_size_bytes,
            acquirer,
        }
    }

    /// Acquire a new table unless the current one is recent and plausibly complete.
    ///
    /// Returns whether a usable table is in place afterwards.
    pub async fn ensure_fresh(&self, force: bool) -> bool {
        self.ensure_fresh_at(force, Utc::now()).await
    }

    pub async fn ensure_fresh_at(&self, force: bool, now: DateTime<Utc>) -> bool {
        if force {
            tracing::info!("Forced reference refresh requested");
            return self.acquirer.acquire(&self.path).await;
        }

        match file_info(&self.path).await {
            Some(info) if self.is_fresh(&info, now) => {
                tracing::info!(
                    "Reference table is current ({:.1} days old, {} bytes)",
                    info.age_days(now),
                    info.size
                );
                true
            }
            Some(info) => {
                tracing::info!(
                    "Reference table is stale or truncated ({:.1} days old, {} bytes), renewing",
                    info.age_days(now),
                    info.size
                );
                self.acquirer.acquire(&self.path).await
            }
            None => {
                tracing::info!("No reference table at {:?}, acquiring", self.path);
                self.acquirer.acquire(&self.path).await
            }
        }
    }

    fn is_fresh(&self, info: &FileInfo, now: DateTime<Utc>) -> bool {
        info.age_days(now) < self.max_age_days && info.size > self.min_size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingAcquirer {
        calls: AtomicUsize,
        outcome: bool,
    }

    impl CountingAcquirer {
        fn new(outcome: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                outcome,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Acquire for CountingAcquirer {
        async fn acquire(&self, _dest: &Path) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
        }
    }

    fn write_table(dir: &TempDir, size: usize, age_days: u64) -> PathBuf {
        let path = dir.path().join("reference.csv");
        std::fs::write(&path, vec![b'x'; size]).unwrap();
        let modified =
            std::time::SystemTime::now() - std::time::Duration::from_secs(age_days * 86_400);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
        path
    }

    fn policy(path: PathBuf, acquirer: Arc<CountingAcquirer>) -> FreshnessPolicy {
        FreshnessPolicy::new(path, &ReferenceConfig::default(), acquirer)
    }

    #[tokio::test]
    async fn test_recent_table_is_kept() {
        let dir = TempDir::new().unwrap();
        let path = write_table(&dir, 200_000, 29);
        let acquirer = CountingAcquirer::new(false);

        assert!(policy(path, acquirer.clone()).ensure_fresh(false).await);
        assert_eq!(acquirer.calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_table_is_renewed() {
        let dir = TempDir::new().unwrap();
        let path = write_table(&dir, 200_000, 31);
        let acquirer = CountingAcquirer::new(true);

        assert!(policy(path, acquirer.clone()).ensure_fresh(false).await);
        assert_eq!(acquirer.calls(), 1);
    }

    #[tokio::test]
    async fn test_small_table_is_renewed() {
        let dir = TempDir::new().unwrap();
        let path = write_table(&dir, 100_000, 1);
        let acquirer = CountingAcquirer::new(false);

        // Result is the acquisition outcome, even though a table exists
        assert!(!policy(path, acquirer.clone()).ensure_fresh(false).await);
        assert_eq!(acquirer.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_table_is_acquired() {
        let dir = TempDir::new().unwrap();
        let acquirer = CountingAcquirer::new(true);

        let policy = policy(dir.path().join("reference.csv"), acquirer.clone());
        assert!(policy.ensure_fresh(false).await);
        assert_eq!(acquirer.calls(), 1);
    }

    #[tokio::test]
    async fn test_force_always_acquires() {
        let dir = TempDir::new().unwrap();
        let path = write_table(&dir, 200_000, 0);
        let acquirer = CountingAcquirer::new(false);

        assert!(!policy(path, acquirer.clone()).ensure_fresh(true).await);
        assert_eq!(acquirer.calls(), 1);
    }

    #[tokio::test]
    async fn test_age_boundary() {
        let dir = TempDir::new().unwrap();
        let path = write_table(&dir, 200_000, 0);
        let acquirer = CountingAcquirer::new(true);
        let policy = policy(path, acquirer.clone());

        let now = Utc::now();
        policy.ensure_fresh_at(false, now + Duration::days(29)).await;
        assert_eq!(acquirer.calls(), 0);
        policy.ensure_fresh_at(false, now + Duration::days(30)).await;
        assert_eq!(acquirer.calls(), 1);
    }
}
