///! Reference dataset: persisted table, acquisition and freshness policy
///!
///! - `store`: loads the persisted CSV into an immutable snapshot
///! - `schema`: column capability detection (`rich` / `minimal`)
///! - `acquisition`: viewer page -> spreadsheet -> CSV
///! - `freshness`: decides whether acquisition must run

pub mod schema;
pub mod store;
pub mod acquisition;
pub mod freshness;

pub use schema::{ReferenceSchema, ReferenceTable, detect_schema};
pub use store::{ReferenceSnapshot, ReferenceStore};
pub use acquisition::{Acquire, ViewerAcquisition};
pub use freshness::FreshnessPolicy;
