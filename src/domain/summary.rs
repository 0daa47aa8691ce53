use crate::domain::health::ProcessorName;
use crate::domain::payment::ledger_score;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorTotals {
    pub total_requests: u64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentsSummary {
    pub default: ProcessorTotals,
    pub fallback: ProcessorTotals,
}

impl PaymentsSummary {
    pub fn totals(&self, processor: ProcessorName) -> &ProcessorTotals {
        match processor {
            ProcessorName::Default => &self.default,
            ProcessorName::Fallback => &self.fallback,
        }
    }
}

/// Inclusive time window over the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl SummaryRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn scores(&self) -> (i64, i64) {
        (ledger_score(self.from), ledger_score(self.to))
    }
}
