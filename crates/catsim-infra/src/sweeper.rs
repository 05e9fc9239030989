//! Background expiry sweeper.
//!
//! Expired items are already hidden from reads; the sweeper deletes them so
//! the table does not grow without bound. It runs on a fixed interval until
//! its cancellation token fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use catsim_core::chat::repository::ConversationTable;
use catsim_core::chat::service::ChatService;
use catsim_core::llm::provider::ChatModel;

pub struct ExpirySweeper<T: ConversationTable, M: ChatModel> {
    service: Arc<ChatService<T, M>>,
    interval: Duration,
    cancel: CancellationToken,
}

impl<T, M> ExpirySweeper<T, M>
where
    T: ConversationTable + 'static,
    M: ChatModel + 'static,
{
    pub fn new(service: Arc<ChatService<T, M>>, interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            service,
            interval,
            cancel,
        }
    }

    /// Spawn the sweep loop onto the runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Sweep every interval until cancelled. The first sweep runs
    /// immediately. Failures are logged and retried on the next tick.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(interval_secs = self.interval.as_secs(), "Expiry sweeper started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.service.store().purge_expired().await {
                        tracing::warn!(error = %e, "Expiry sweep failed");
                    }
                }
            }
        }

        tracing::info!("Expiry sweeper stopped");
    }
}
