use crate::config::PipelineConfig;
use crate::domain::health::{ProcessorHealth, ProcessorName};
use crate::domain::money::MAX_PAYMENT_AMOUNT;
use crate::domain::payment::{CreatePaymentRequest, PaymentRecord, PaymentStatus};
use crate::domain::summary::{PaymentsSummary, SummaryRange};
use crate::error::{PaymentError, PaymentResult};
use crate::metrics::aggregator::summarize;
use crate::processors::{ProcessorRequest, ProcessorResponse, ProcessorTable};
use crate::repo::store::PaymentStore;
use crate::router::health_policy::{choose_processor, RouteDecision};
use crate::service::queue::PaymentQueues;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct PaymentService {
    pub store: Arc<dyn PaymentStore>,
    pub processors: ProcessorTable,
    pub queues: PaymentQueues,
    pub enqueue_attempts: u32,
    pub enqueue_backoff_step: Duration,
    pub attempt_timeout: Duration,
    pub cancel: CancellationToken,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        processors: ProcessorTable,
        queues: PaymentQueues,
        config: &PipelineConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            processors,
            queues,
            enqueue_attempts: config.enqueue_attempts,
            enqueue_backoff_step: config.enqueue_backoff_step,
            attempt_timeout: config.attempt_timeout,
            cancel,
        }
    }

    /// Persists a new pending payment and hands it to the worker pool.
    ///
    /// The caller always gets the pending record back once it is stored. When
    /// the queue keeps rejecting it, the stored record is downgraded to
    /// `failed` in the background.
    pub async fn accept_payment(&self, req: CreatePaymentRequest) -> PaymentResult<PaymentRecord> {
        validate_request(&req)?;

        if let Some(existing) = self
            .store
            .find_payment(&req.correlation_id)
            .await
            .map_err(PaymentError::storage)?
        {
            tracing::info!(
                "payment {} already accepted, returning stored record",
                existing.correlation_id
            );
            return Ok(existing);
        }

        let record = PaymentRecord::pending(req.correlation_id, req.amount, Utc::now());
        self.store
            .save_payment(&record)
            .await
            .map_err(PaymentError::storage)?;

        if !self.enqueue_with_retry(&record).await {
            tracing::error!(
                "failed to queue payment {} after {} attempts",
                record.correlation_id,
                self.enqueue_attempts
            );
            let store = self.store.clone();
            let mut failed = record.clone();
            failed.status = PaymentStatus::Failed;
            tokio::spawn(async move {
                if let Err(e) = store.save_payment(&failed).await {
                    tracing::error!(
                        "failed to mark payment {} as failed: {}",
                        failed.correlation_id,
                        e
                    );
                }
            });
        }

        Ok(record)
    }

    async fn enqueue_with_retry(&self, record: &PaymentRecord) -> bool {
        for attempt in 1..=self.enqueue_attempts {
            match self.queues.primary.try_enqueue(record.clone()) {
                Ok(()) => return true,
                Err(PaymentError::QueueClosed(_)) => return false,
                Err(_) => {}
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                _ = tokio::time::sleep(self.enqueue_backoff_step * attempt) => {}
            }
        }
        false
    }

    /// Routes a dequeued payment by stored health and delivers it.
    pub async fn process_queued(&self, record: PaymentRecord) -> PaymentResult<ProcessorName> {
        let default = self.lookup_health(ProcessorName::Default).await;
        let fallback = self.lookup_health(ProcessorName::Fallback).await;

        match choose_processor(default.as_ref(), fallback.as_ref()) {
            RouteDecision::AllDown => {
                tracing::warn!(
                    "no processor available for payment {}",
                    record.correlation_id
                );
                Err(PaymentError::AllProcessorsDown)
            }
            RouteDecision::Use(processor) => self.deliver(record, processor).await,
        }
    }

    async fn lookup_health(&self, name: ProcessorName) -> Option<ProcessorHealth> {
        match self.store.find_processor_health(name).await {
            Ok(Some(health)) => Some(health),
            Ok(None) => {
                tracing::debug!("no health snapshot stored for {} processor", name);
                None
            }
            Err(e) => {
                tracing::warn!("failed to read health of {} processor: {}", name, e);
                None
            }
        }
    }

    /// Calls `processor` once, bounded by `attempt_timeout`, and stores the
    /// outcome. A timed-out call is stored as `failed` like any other error.
    async fn deliver(&self, mut record: PaymentRecord, processor: ProcessorName) -> PaymentResult<ProcessorName> {
        let request = ProcessorRequest {
            correlation_id: record.correlation_id.clone(),
            amount: record.amount,
            requested_at: record.started_at,
        };

        let call = self.processors.get(processor).submit_payment(request);
        let outcome: PaymentResult<ProcessorResponse> =
            match tokio::time::timeout(self.attempt_timeout, call).await {
                Ok(Ok(resp)) => Ok(resp),
                Ok(Err(source)) => Err(PaymentError::Processor { processor, source }),
                Err(_) => Err(PaymentError::AttemptTimeout(self.attempt_timeout)),
            };
        record.processor = Some(processor);
        record.status = match &outcome {
            Ok(_) => PaymentStatus::Success,
            Err(_) => PaymentStatus::Failed,
        };

        self.store
            .save_payment(&record)
            .await
            .map_err(PaymentError::storage)?;

        match outcome {
            Ok(resp) => {
                tracing::info!(
                    "payment {} processed by {} processor: {}",
                    record.correlation_id,
                    processor,
                    resp.message
                );
                Ok(processor)
            }
            Err(err) => {
                tracing::error!(
                    "payment {} failed on {} processor: {}",
                    record.correlation_id,
                    processor,
                    err
                );
                Err(err)
            }
        }
    }

    /// Probes one processor now and stores the answer.
    pub async fn health_status(&self, name: ProcessorName) -> PaymentResult<ProcessorHealth> {
        let health = self
            .processors
            .get(name)
            .health()
            .await
            .map_err(|source| PaymentError::Processor {
                processor: name,
                source,
            })?;
        self.store
            .save_processor_health(name, &health)
            .await
            .map_err(PaymentError::storage)?;
        Ok(health)
    }

    pub async fn payments_summary(&self, range: Option<SummaryRange>) -> PaymentResult<PaymentsSummary> {
        let entries = self
            .store
            .ledger_entries(range)
            .await
            .map_err(PaymentError::storage)?;
        Ok(summarize(&entries))
    }

    pub async fn find_payment(&self, correlation_id: &str) -> PaymentResult<Option<PaymentRecord>> {
        self.store
            .find_payment(correlation_id)
            .await
            .map_err(PaymentError::storage)
    }
}

fn validate_request(req: &CreatePaymentRequest) -> PaymentResult<()> {
    if req.correlation_id.trim().is_empty() {
        return Err(PaymentError::Validation("correlationId is required".to_string()));
    }
    if !req.amount.is_finite() || req.amount <= 0.0 {
        return Err(PaymentError::Validation("amount must be > 0".to_string()));
    }
    if req.amount > MAX_PAYMENT_AMOUNT {
        return Err(PaymentError::Validation(format!(
            "amount must be <= {}",
            MAX_PAYMENT_AMOUNT
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_ids_and_bad_amounts() {
        let req = |id: &str, amount: f64| CreatePaymentRequest {
            correlation_id: id.to_string(),
            amount,
        };

        assert!(validate_request(&req("abc", 19.9)).is_ok());
        assert!(matches!(validate_request(&req(" ", 19.9)), Err(PaymentError::Validation(_))));
        assert!(matches!(validate_request(&req("abc", 0.0)), Err(PaymentError::Validation(_))));
        assert!(matches!(validate_request(&req("abc", -1.0)), Err(PaymentError::Validation(_))));
        assert!(matches!(
            validate_request(&req("abc", f64::NAN)),
            Err(PaymentError::Validation(_))
        ));
    }

    #[test]
    fn rejects_amounts_too_large_to_count_in_cents() {
        let req = |amount: f64| CreatePaymentRequest {
            correlation_id: "big".to_string(),
            amount,
        };

        assert!(validate_request(&req(MAX_PAYMENT_AMOUNT)).is_ok());
        assert!(matches!(validate_request(&req(5e16)), Err(PaymentError::Validation(_))));
        assert!(matches!(validate_request(&req(1e300)), Err(PaymentError::Validation(_))));
    }
}
