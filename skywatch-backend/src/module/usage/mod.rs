///! Usage ledger: rolling call counter persisted across restarts

pub mod store;
pub mod ledger;

pub use store::{JsonUsageStore, UsageState, UsageStore};
pub use ledger::UsageLedger;
