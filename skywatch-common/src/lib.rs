//! Types shared between the skywatch core and the callers that render its results.

pub mod types;

pub use types::*;
