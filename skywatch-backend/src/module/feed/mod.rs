///! Live satellite feed (N2YO "what's up" endpoint)

pub mod types;
pub mod client;

pub use types::Observation;
pub use client::{N2yoClient, SatelliteFeed, parse_above_response};
