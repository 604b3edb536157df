///! Usage ledger - rolling call counter
use chrono::{DateTime, Duration, Utc};
use skywatch_common::UsageSnapshot;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::store::{UsageState, UsageStore};
use crate::config::UsageConfig;

/// Counts tracked calls over a rolling window.
///
/// Purely informational: the ledger never refuses a call.
pub struct UsageLedger {
    store: Arc<dyn UsageStore>,
    /// Held across persistence so saves happen in increment order
    state: Mutex<UsageState>,
    limit: u64,
    window: Duration,
}

impl UsageLedger {
    /// Load persisted state; missing or unreadable state starts at zero.
    pub async fn open(store: Arc<dyn UsageStore>, config: &UsageConfig) -> Self {
        let now = Utc::now();
        let state = match store.load().await {
            Ok(Some(state)) => {
                tracing::info!(
                    "Loaded usage ledger: {} calls since {}",
                    state.count,
                    state.window_start
                );
                state
            }
            Ok(None) => UsageState::fresh(now),
            Err(e) => {
                tracing::warn!("Usage ledger unreadable ({}), starting fresh", e);
                UsageState::fresh(now)
            }
        };

        Self {
            store,
            state: Mutex::new(state),
            limit: config.limit,
            window: Duration::days(config.window_days),
        }
    }

    pub async fn record_call(&self) -> UsageState {
        self.record_call_at(Utc::now()).await
    }

    /// Count one call at `now` and persist the result.
    ///
    /// When the window has run out the counter restarts at 1 with the window
    /// starting at `now`; the increment just applied is discarded.
    pub async fn record_call_at(&self, now: DateTime<Utc>) -> UsageState {
        let mut state = self.state.lock().await;

        state.count += 1;
        if now - state.window_start > self.window {
            tracing::info!("Usage window expired after {} calls, resetting", state.count - 1);
            *state = UsageState {
                count: 1,
                window_start: now,
            };
        }

        if let Err(e) = self.store.save(&state).await {
            tracing::error!("Failed to persist usage ledger: {}", e);
        }
        *state
    }

    pub async fn state(&self) -> UsageState {
        *self.state.lock().await
    }

    pub async fn snapshot(&self) -> UsageSnapshot {
        let state = self.state().await;
        self.to_snapshot(&state)
    }

    pub fn to_snapshot(&self, state: &UsageState) -> UsageSnapshot {
        UsageSnapshot {
            count: state.count,
            remaining: self.limit.saturating_sub(state.count),
            limit: self.limit,
        }
    }
}
