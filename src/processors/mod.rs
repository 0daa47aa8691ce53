use crate::domain::health::{ProcessorHealth, ProcessorName};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod http;
pub mod mock;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorRequest {
    pub correlation_id: String,
    pub amount: f64,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessorResponse {
    #[serde(default)]
    pub message: String,
}

#[async_trait::async_trait]
pub trait PaymentProcessor: Send + Sync {
    fn kind(&self) -> &'static str;

    async fn submit_payment(&self, request: ProcessorRequest) -> Result<ProcessorResponse>;

    async fn health(&self) -> Result<ProcessorHealth>;
}

/// Both upstream processors, addressed by name.
#[derive(Clone)]
pub struct ProcessorTable {
    slots: [Arc<dyn PaymentProcessor>; 2],
}

impl ProcessorTable {
    pub fn new(default: Arc<dyn PaymentProcessor>, fallback: Arc<dyn PaymentProcessor>) -> Self {
        Self {
            slots: [default, fallback],
        }
    }

    pub fn get(&self, name: ProcessorName) -> &Arc<dyn PaymentProcessor> {
        &self.slots[name.index()]
    }
}
