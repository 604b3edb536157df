pub mod reference;
pub mod enrich;
pub mod usage;
pub mod feed;
