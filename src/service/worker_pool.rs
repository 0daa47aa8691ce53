use crate::config::PipelineConfig;
use crate::domain::payment::PaymentRecord;
use crate::error::{PaymentError, PaymentResult};
use crate::metrics::counters::{MetricsReporter, WorkerCounters};
use crate::service::health_monitor::HealthMonitor;
use crate::service::payment_service::PaymentService;
use crate::service::queue::PaymentQueues;
use crate::service::retry_loop::RetryReprocessor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Fixed set of consumers draining the primary queue, plus the background
/// loops that feed it.
pub struct WorkerPool {
    service: PaymentService,
    config: PipelineConfig,
    counters: WorkerCounters,
    semaphore: Arc<Semaphore>,
    workers: Vec<JoinHandle<()>>,
    background: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(service: PaymentService, config: PipelineConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_in_flight()));
        Self {
            service,
            config,
            counters: WorkerCounters::default(),
            semaphore,
            workers: Vec::new(),
            background: Vec::new(),
        }
    }

    /// Starts the workers, the retry reprocessor, the metrics reporter and
    /// the health monitor.
    pub fn start(&mut self) {
        self.start_workers();

        let cancel = self.service.cancel.clone();
        let queues = self.service.queues.clone();

        let reprocessor = RetryReprocessor {
            queues: queues.clone(),
            tick_interval: self.config.retry_tick_interval,
            batch_size: self.config.retry_batch_size,
            batch_delay: self.config.retry_batch_delay,
            single_delay: self.config.retry_single_delay,
        };
        self.background.push(tokio::spawn(reprocessor.run(cancel.clone())));

        let reporter = MetricsReporter {
            counters: self.counters.clone(),
            queues,
            interval: self.config.metrics_interval,
        };
        self.background.push(tokio::spawn(reporter.run(cancel.clone())));

        let monitor = HealthMonitor {
            store: self.service.store.clone(),
            processors: self.service.processors.clone(),
            interval: self.config.health_check_interval,
            probe_timeout: self.config.health_check_timeout,
        };
        self.background.push(tokio::spawn(monitor.run(cancel)));
    }

    /// Starts only the queue consumers.
    pub fn start_workers(&mut self) {
        let worker_count = self.config.worker_count.max(1);
        for id in 0..worker_count {
            let worker = Worker {
                id,
                service: self.service.clone(),
                counters: self.counters.clone(),
                semaphore: self.semaphore.clone(),
            };
            self.workers.push(tokio::spawn(worker.run()));
        }
        tracing::info!("started {} payment workers", worker_count);
    }

    pub fn counters(&self) -> WorkerCounters {
        self.counters.clone()
    }

    pub fn queues(&self) -> &PaymentQueues {
        &self.service.queues
    }

    /// Closes both queues and waits for every worker to drain and exit.
    ///
    /// Workers still running when `timeout` elapses are left detached.
    pub async fn shutdown(&mut self, timeout: Duration) -> PaymentResult<()> {
        self.service.queues.close();

        let workers = std::mem::take(&mut self.workers);
        let drained = async {
            for handle in workers {
                if let Err(e) = handle.await {
                    tracing::error!("payment worker panicked: {}", e);
                }
            }
        };

        match tokio::time::timeout(timeout, drained).await {
            Ok(()) => {
                tracing::info!("payment workers stopped");
                Ok(())
            }
            Err(_) => {
                tracing::warn!("payment workers still busy after {:?}", timeout);
                Err(PaymentError::ShutdownTimeout(timeout))
            }
        }
    }

    /// Cancels the background loops and waits for them to exit.
    pub async fn stop_background(&mut self) {
        self.service.cancel.cancel();
        for handle in self.background.drain(..) {
            if let Err(e) = handle.await {
                tracing::error!("background task panicked: {}", e);
            }
        }
    }
}

#[derive(Clone)]
struct Worker {
    id: usize,
    service: PaymentService,
    counters: WorkerCounters,
    semaphore: Arc<Semaphore>,
}

impl Worker {
    async fn run(self) {
        let cancel = self.service.cancel.clone();
        loop {
            let record = tokio::select! {
                _ = cancel.cancelled() => break,
                next = self.service.queues.primary.dequeue() => match next {
                    Some(record) => record,
                    None => break,
                },
            };

            let Ok(_permit) = self.semaphore.clone().acquire_owned().await else {
                break;
            };
            self.handle(record).await;
        }
        tracing::debug!(worker = self.id, "payment worker stopped");
    }

    async fn handle(&self, record: PaymentRecord) {
        let err = match self.service.process_queued(record.clone()).await {
            Ok(_) => {
                self.counters.increment_processed().await;
                return;
            }
            Err(err) => err,
        };

        tracing::warn!(
            worker = self.id,
            "payment {} not processed: {}",
            record.correlation_id,
            err
        );

        if err.is_retryable() {
            let id = record.correlation_id.clone();
            if let Err(e) = self.service.queues.retry.try_enqueue(record) {
                tracing::error!("could not schedule retry for payment {}: {}", id, e);
            }
        }
        self.counters.increment_failed().await;
    }
}
