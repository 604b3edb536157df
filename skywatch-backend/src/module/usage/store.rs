///! Usage ledger persistence
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::UsageStoreError;

/// Persisted counter state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageState {
    pub count: u64,
    pub window_start: DateTime<Utc>,
}

impl UsageState {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }
}

/// Durable storage for [`UsageState`]
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet
    async fn load(&self) -> Result<Option<UsageState>, UsageStoreError>;

    async fn save(&self, state: &UsageState) -> Result<(), UsageStoreError>;
}

/// Single JSON file, replaced atomically on every save
pub struct JsonUsageStore {
    path: PathBuf,
}

impl JsonUsageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UsageStore for JsonUsageStore {
    async fn load(&self) -> Result<Option<UsageState>, UsageStoreError> {
        if !self.path.exists() {
            tracing::debug!("Usage file does not exist: {:?}", self.path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await?;
        let state: UsageState = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    async fn save(&self, state: &UsageState) -> Result<(), UsageStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
