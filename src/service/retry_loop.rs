use crate::domain::payment::PaymentRecord;
use crate::service::queue::PaymentQueues;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Moves failed payments from the retry queue back onto the primary queue
/// after a cooldown.
#[derive(Clone)]
pub struct RetryReprocessor {
    pub queues: PaymentQueues,
    pub tick_interval: Duration,
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub single_delay: Duration,
}

impl RetryReprocessor {
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if !self.drain_batch(&cancel).await {
                        break;
                    }
                }
                next = self.queues.retry.dequeue() => {
                    let Some(record) = next else { break };
                    if !pause(&cancel, self.single_delay).await {
                        break;
                    }
                    self.reinject(record);
                }
            }
        }
        tracing::debug!("retry reprocessor stopped");
    }

    /// Returns `false` when cancelled mid-batch.
    async fn drain_batch(&self, cancel: &CancellationToken) -> bool {
        if self.queues.retry.is_empty() {
            return true;
        }
        // pushed-back records wait for the next tick
        let budget = self.batch_size.min(self.queues.retry.len());
        let mut moved = 0usize;
        while moved < budget {
            let Some(record) = self.queues.retry.try_dequeue().await else {
                break;
            };
            moved += 1;

            if !pause(cancel, self.batch_delay).await {
                return false;
            }

            if let Err(err) = self.queues.primary.try_enqueue(record.clone()) {
                tracing::warn!(
                    "failed to requeue payment {}: {}",
                    record.correlation_id,
                    err
                );
                if let Err(err) = self.queues.retry.try_enqueue(record.clone()) {
                    tracing::error!(
                        "dropping payment {} from retry: {}",
                        record.correlation_id,
                        err
                    );
                }
            }
        }

        if moved > 0 {
            tracing::info!("reprocessed {} payments from the retry queue", moved);
        }
        true
    }

    fn reinject(&self, record: PaymentRecord) {
        let id = record.correlation_id.clone();
        if let Err(err) = self.queues.primary.try_enqueue(record) {
            tracing::error!("dropping payment {} from retry: {}", id, err);
        }
    }
}

async fn pause(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
