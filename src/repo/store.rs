use crate::domain::health::{ProcessorHealth, ProcessorName};
use crate::domain::payment::PaymentRecord;
use crate::domain::summary::SummaryRange;
use anyhow::Result;

/// Durable state shared by the request path, the workers and the health monitor.
///
/// Implementations guarantee per-key atomicity only.
#[async_trait::async_trait]
pub trait PaymentStore: Send + Sync {
    async fn find_payment(&self, correlation_id: &str) -> Result<Option<PaymentRecord>>;

    /// Writes the record under its correlation id and appends it to the ledger.
    async fn save_payment(&self, record: &PaymentRecord) -> Result<()>;

    async fn find_processor_health(&self, name: ProcessorName) -> Result<Option<ProcessorHealth>>;

    async fn save_processor_health(&self, name: ProcessorName, health: &ProcessorHealth) -> Result<()>;

    /// Raw ledger lines in score order, optionally bounded (both ends inclusive).
    async fn ledger_entries(&self, range: Option<SummaryRange>) -> Result<Vec<String>>;
}
