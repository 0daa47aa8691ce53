use crate::domain::health::{ProcessorHealth, ProcessorName};
use crate::error::{PaymentError, PaymentResult};
use crate::processors::ProcessorTable;
use crate::repo::store::PaymentStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Samples both processors on a fixed interval and stores the latest health.
#[derive(Clone)]
pub struct HealthMonitor {
    pub store: Arc<dyn PaymentStore>,
    pub processors: ProcessorTable,
    pub interval: Duration,
    pub probe_timeout: Duration,
}

impl HealthMonitor {
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("health monitor stopped");
                    return;
                }
                _ = ticker.tick() => {
                    let monitor = self.clone();
                    tokio::spawn(async move {
                        if let Err(err) = monitor.probe_all().await {
                            tracing::error!("health check error: {}", err);
                        }
                    });
                }
            }
        }
    }

    /// Probes both processors concurrently under one shared deadline.
    ///
    /// Each successful probe is stored on its own, so one slow or broken
    /// processor never hides the other's fresh health.
    pub async fn probe_all(&self) -> PaymentResult<()> {
        let deadline = Instant::now() + self.probe_timeout;
        let (default, fallback) = tokio::join!(
            self.probe(ProcessorName::Default, deadline),
            self.probe(ProcessorName::Fallback, deadline),
        );

        if default.is_err() && fallback.is_err() {
            return Err(PaymentError::AllHealthProbesFailed);
        }
        Ok(())
    }

    async fn probe(&self, name: ProcessorName, deadline: Instant) -> anyhow::Result<ProcessorHealth> {
        let health = match tokio::time::timeout_at(deadline, self.processors.get(name).health()).await {
            Ok(Ok(health)) => health,
            Ok(Err(e)) => {
                tracing::warn!("health probe for {} processor failed: {}", name, e);
                return Err(e);
            }
            Err(_) => {
                tracing::warn!("health probe for {} processor timed out", name);
                anyhow::bail!("health probe for {} timed out", name);
            }
        };

        if let Err(e) = self.store.save_processor_health(name, &health).await {
            tracing::error!("failed to store health of {} processor: {}", name, e);
            return Err(e);
        }

        tracing::debug!(
            "{} processor health: failing={} min_response_time={}ms",
            name,
            health.failing,
            health.min_response_time_ms
        );
        Ok(health)
    }
}
