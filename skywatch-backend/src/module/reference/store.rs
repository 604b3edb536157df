///! Reference store - persisted reference table and its in-memory snapshot

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use skywatch_common::{NoradId, ReferenceMode, ReferenceStatus};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::schema::{
    ReferenceSchema, ReferenceTable, build_index, classify, detect_schema, normalize_headers,
};

/// Loaded reference table with its detected schema and mode.
///
/// Snapshots are immutable; a reload publishes a new one.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSnapshot {
    pub table: ReferenceTable,
    pub schema: Option<ReferenceSchema>,
    pub mode: ReferenceMode,
    index: HashMap<NoradId, usize>,
}

impl ReferenceSnapshot {
    /// No table could be loaded
    pub fn absent() -> Self {
        Self::default()
    }

    /// Normalize labels, detect capabilities and index identifiers.
    pub fn from_table(mut table: ReferenceTable) -> Self {
        normalize_headers(&mut table.headers);
        let schema = detect_schema(&table.headers);
        let mode = classify(schema.as_ref());

        let index = match schema.and_then(|s| s.identifier) {
            Some(col) if mode.is_rich() => build_index(&table, col),
            _ => HashMap::new(),
        };

        Self {
            table,
            schema,
            mode,
            index,
        }
    }

    /// Row index of the first record carrying `id`
    pub fn find_row(&self, id: NoradId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn record_count(&self) -> usize {
        self.table.len()
    }
}

/// Size and modification time of the persisted file
#[derive(Debug, Clone, Copy)]
pub struct FileInfo {
    pub modified: DateTime<Utc>,
    pub size: u64,
}

impl FileInfo {
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        (now - self.modified).num_seconds() as f64 / 86_400.0
    }
}

/// Stat the file; `None` when it does not exist or cannot be read.
pub async fn file_info(path: &Path) -> Option<FileInfo> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    if !metadata.is_file() {
        return None;
    }
    let modified = metadata.modified().ok()?;
    Some(FileInfo {
        modified: modified.into(),
        size: metadata.len(),
    })
}

/// Parse CSV content into a table. Header row required.
pub fn parse_csv(content: &str) -> Result<ReferenceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        anyhow::bail!("CSV has no header row");
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV row {}", line + 1))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(ReferenceTable::new(headers, rows))
}

/// Load the persisted table. Never fails: problems degrade to `absent`.
pub async fn load(path: &Path) -> ReferenceSnapshot {
    if !path.exists() {
        tracing::warn!("Reference table not found: {:?}", path);
        return ReferenceSnapshot::absent();
    }

    let table = match tokio::fs::read_to_string(path)
        .await
        .context("Failed to read reference table")
        .and_then(|content| parse_csv(&content))
    {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!("Could not load reference table {:?}: {:#}", path, e);
            return ReferenceSnapshot::absent();
        }
    };

    let snapshot = ReferenceSnapshot::from_table(table);
    tracing::info!(
        "Loaded reference table {:?} with {} rows ({} mode)",
        path,
        snapshot.record_count(),
        snapshot.mode
    );
    if !snapshot.mode.is_rich() {
        tracing::warn!("Reference table lacks country/purpose columns, enrichment disabled");
    }
    snapshot
}

/// Owns the persisted reference file and the snapshot readers see.
pub struct ReferenceStore {
    path: PathBuf,
    current: RwLock<Arc<ReferenceSnapshot>>,
}

impl ReferenceStore {
    /// Create a store for `path`. Starts `absent` until [`reload`](Self::reload).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(Arc::new(ReferenceSnapshot::absent())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file and publish the result.
    pub async fn reload(&self) -> Arc<ReferenceSnapshot> {
        let snapshot = Arc::new(load(&self.path).await);
        *self.current.write().await = snapshot.clone();
        snapshot
    }

    /// Snapshot in use right now; unaffected by later reloads.
    pub async fn current(&self) -> Arc<ReferenceSnapshot> {
        self.current.read().await.clone()
    }

    pub async fn status(&self) -> ReferenceStatus {
        self.status_at(Utc::now()).await
    }

    pub async fn status_at(&self, now: DateTime<Utc>) -> ReferenceStatus {
        let snapshot = self.current().await;
        let info = file_info(&self.path).await;

        ReferenceStatus {
            status: snapshot.mode.status_label().to_string(),
            last_modified: info.map(|i| i.modified.format("%Y-%m-%d %H:%M").to_string()),
            age_days: info.map(|i| (i.age_days(now) * 10.0).round() / 10.0),
            mode: snapshot.mode,
            records: snapshot.record_count(),
        }
    }
}
