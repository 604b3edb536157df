///! Reference table shape and column capability detection
///!
///! Column names in the upstream spreadsheet drift between releases, so
///! enrichment columns are discovered by substring rather than fixed names.

use skywatch_common::{NoradId, ReferenceMode};
use std::collections::HashMap;

/// In-memory reference table: one header row and string cells.
///
/// Empty cells are kept as empty strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReferenceTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `(row, col)`; `None` for short rows
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

/// Positions of the columns enrichment relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSchema {
    pub identifier: Option<usize>,
    pub country: usize,
    pub purpose: usize,
    pub user: Option<usize>,
}

/// Lowercase and trim every header label.
pub fn normalize_headers(headers: &mut [String]) {
    for header in headers.iter_mut() {
        *header = header.trim().to_lowercase();
    }
}

fn find_column(headers: &[String], needles: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| needles.iter().any(|needle| h.contains(needle)))
}

/// Map a set of (already normalized) labels to the enrichment columns.
///
/// Returns `None` unless both a country-like and a purpose column exist.
pub fn detect_schema(headers: &[String]) -> Option<ReferenceSchema> {
    let country = find_column(headers, &["country"])?;
    let purpose = find_column(headers, &["purpose"])?;

    Some(ReferenceSchema {
        identifier: find_column(headers, &["norad"]),
        country,
        purpose,
        user: find_column(headers, &["user", "operator"]),
    })
}

/// Mode of a table that parsed successfully.
pub fn classify(schema: Option<&ReferenceSchema>) -> ReferenceMode {
    match schema {
        Some(_) => ReferenceMode::Rich,
        None => ReferenceMode::Minimal,
    }
}

/// Parse an identifier cell. Spreadsheet exports often carry integral
/// floats (`"25544.0"`), which are accepted.
pub fn parse_norad_id(cell: &str) -> Option<NoradId> {
    let cell = cell.trim();
    if let Ok(id) = cell.parse::<NoradId>() {
        return Some(id);
    }

    let value = cell.parse::<f64>().ok()?;
    if value.fract() == 0.0 && value >= 0.0 && value <= NoradId::MAX as f64 {
        Some(value as NoradId)
    } else {
        None
    }
}

/// Identifier → first row carrying it.
pub fn build_index(table: &ReferenceTable, identifier: usize) -> HashMap<NoradId, usize> {
    let mut index = HashMap::new();
    for (row, cells) in table.rows.iter().enumerate() {
        if let Some(id) = cells.get(identifier).and_then(|c| parse_norad_id(c)) {
            index.entry(id).or_insert(row);
        }
    }
    index
}
