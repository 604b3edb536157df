///! Enrichment of live observations with reference metadata

pub mod normalize;
pub mod enricher;

pub use normalize::{TextNormalizer, normalize_text, title_case};
pub use enricher::Enricher;
