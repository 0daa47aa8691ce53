use crate::domain::health::ProcessorName;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("invalid payment: {0}")]
    Validation(String),

    #[error("all payment processors are down; try again later")]
    AllProcessorsDown,

    #[error("payment processor {processor} failed: {source}")]
    Processor {
        processor: ProcessorName,
        #[source]
        source: anyhow::Error,
    },

    #[error("payment attempt timed out after {0:?}")]
    AttemptTimeout(Duration),

    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),

    #[error("{0} queue is full")]
    QueueFull(&'static str),

    #[error("{0} queue is closed")]
    QueueClosed(&'static str),

    #[error("health probes failed for every processor")]
    AllHealthProbesFailed,

    #[error("worker shutdown timed out after {0:?}")]
    ShutdownTimeout(Duration),
}

impl PaymentError {
    pub fn storage(e: anyhow::Error) -> Self {
        PaymentError::Storage(e)
    }

    /// Failures the reprocessing loop may retry later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::Processor { .. }
                | PaymentError::AttemptTimeout(_)
                | PaymentError::AllProcessorsDown
        )
    }
}

pub type PaymentResult<T> = Result<T, PaymentError>;
