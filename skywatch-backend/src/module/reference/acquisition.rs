///! Reference acquisition - spreadsheet download through the document viewer
///!
///! The publisher only links the spreadsheet through an online viewer. The
///! viewer's final URL carries the real document location in its `src`
///! query parameter, percent-encoded.

use async_trait::async_trait;
use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use regex::Regex;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::schema::ReferenceTable;
use crate::config::ReferenceConfig;
use crate::error::AcquisitionError;

const USER_AGENT: &str = "Mozilla/5.0 skywatch/0.1";

/// Something that can replace the persisted reference table.
#[async_trait]
pub trait Acquire: Send + Sync {
    /// Write a fresh table to `dest`. On failure `dest` is left as it was.
    async fn acquire(&self, dest: &Path) -> bool;
}

/// Downloads the spreadsheet behind the configured viewer page.
pub struct ViewerAcquisition {
    client: reqwest::Client,
    viewer_url: String,
    expected_extension: String,
    viewer_timeout: Duration,
    download_timeout: Duration,
}

impl ViewerAcquisition {
    pub fn new(config: &ReferenceConfig) -> Result<Self, AcquisitionError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            viewer_url: config.viewer_url.clone(),
            expected_extension: config.expected_extension.clone(),
            viewer_timeout: Duration::from_secs(config.viewer_timeout_secs),
            download_timeout: Duration::from_secs(config.download_timeout_secs),
        })
    }

    /// Run the whole pipeline; errors are logged and reported as `false`.
    pub async fn fetch(&self, dest: &Path) -> bool {
        match self.run(dest).await {
            Ok(records) => {
                tracing::info!(
                    "Reference spreadsheet downloaded and stored as {:?} ({} records)",
                    dest,
                    records
                );
                true
            }
            Err(e) => {
                tracing::error!("Reference acquisition failed: {}", e);
                false
            }
        }
    }

    async fn run(&self, dest: &Path) -> Result<usize, AcquisitionError> {
        let document_url = self.resolve_document_url().await?;
        tracing::info!("Spreadsheet link resolved: {}", document_url);

        let bytes = self.download(&document_url).await?;
        let table = parse_spreadsheet(&bytes)?;
        write_table(dest, &table).await?;

        Ok(table.len())
    }

    /// Steps 1-4: request the viewer and pull the document URL out of it.
    async fn resolve_document_url(&self) -> Result<String, AcquisitionError> {
        tracing::info!("Requesting document viewer {}", self.viewer_url);

        let response = self
            .client
            .get(&self.viewer_url)
            .timeout(self.viewer_timeout)
            .send()
            .await?;

        extract_source_url(response.url().as_str(), &self.expected_extension)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AcquisitionError> {
        let response = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AcquisitionError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl Acquire for ViewerAcquisition {
    async fn acquire(&self, dest: &Path) -> bool {
        self.fetch(dest).await
    }
}

/// Pull the percent-encoded `src` parameter out of a viewer URL and decode it.
pub fn extract_source_url(
    viewer_url: &str,
    expected_extension: &str,
) -> Result<String, AcquisitionError> {
    let pattern = Regex::new(r"src=(https?[^&]+)")?;
    let encoded = pattern
        .captures(viewer_url)
        .and_then(|c| c.get(1))
        .ok_or_else(|| AcquisitionError::MissingSource(viewer_url.to_string()))?;

    let decoded = urlencoding::decode(encoded.as_str())
        .map_err(|e| AcquisitionError::Decode(e.to_string()))?
        .into_owned();

    if !decoded.ends_with(expected_extension) {
        return Err(AcquisitionError::NotSpreadsheet(decoded));
    }
    Ok(decoded)
}

/// First worksheet as a table; the first row holds the headers.
pub fn parse_spreadsheet(bytes: &[u8]) -> Result<ReferenceTable, AcquisitionError> {
    let mut workbook = open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(bytes))
        .map_err(|e| AcquisitionError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AcquisitionError::Spreadsheet("workbook has no sheets".to_string()))?
        .map_err(|e| AcquisitionError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| AcquisitionError::Spreadsheet("first sheet is empty".to_string()))?
        .iter()
        .map(cell_to_string)
        .collect();

    let rows = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(ReferenceTable::new(headers, rows))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // Catalog numbers come back as floats
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Serialize `table` as CSV and move it over `dest` in one rename.
pub async fn write_table(dest: &Path, table: &ReferenceTable) -> Result<(), AcquisitionError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AcquisitionError::Io(e.into_error()))?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = temp_path(dest);
    if let Err(e) = publish(&tmp, dest, &bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

async fn publish(tmp: &Path, dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(tmp, bytes).await?;
    tokio::fs::rename(tmp, dest).await
}

/// Sibling of `dest` unique to this process and call
fn temp_path(dest: &Path) -> PathBuf {
    static SEQ: AtomicU64 = AtomicU64::new(0);

    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    dest.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), seq))
}
