use crate::service::queue::PaymentQueues;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub processed: u64,
    pub failed: u64,
}

/// Processed/failed tallies shared by every worker and the metrics loop.
#[derive(Clone, Default)]
pub struct WorkerCounters {
    inner: Arc<RwLock<CounterSnapshot>>,
}

impl WorkerCounters {
    pub async fn increment_processed(&self) {
        self.inner.write().await.processed += 1;
    }

    pub async fn increment_failed(&self) {
        self.inner.write().await.failed += 1;
    }

    pub async fn snapshot(&self) -> CounterSnapshot {
        *self.inner.read().await
    }
}

pub struct MetricsReporter {
    pub counters: WorkerCounters,
    pub queues: PaymentQueues,
    pub interval: Duration,
}

impl MetricsReporter {
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("metrics reporter stopped");
                    return;
                }
                _ = ticker.tick() => self.report().await,
            }
        }
    }

    pub async fn report(&self) {
        let snapshot = self.counters.snapshot().await;
        tracing::info!(
            processed = snapshot.processed,
            failed = snapshot.failed,
            queue_size = self.queues.primary.len(),
            error_queue_size = self.queues.retry.len(),
            "worker metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_from_many_tasks() {
        let counters = WorkerCounters::default();
        let mut handles = Vec::new();
        for i in 0..50 {
            let c = counters.clone();
            handles.push(tokio::spawn(async move {
                if i % 5 == 0 {
                    c.increment_failed().await;
                } else {
                    c.increment_processed().await;
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(
            counters.snapshot().await,
            CounterSnapshot {
                processed: 40,
                failed: 10
            }
        );
    }
}
