use crate::domain::health::ProcessorName;
use crate::domain::money;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "success" => Ok(PaymentStatus::Success),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(anyhow::anyhow!("unknown payment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub correlation_id: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub correlation_id: String,
    pub amount: f64,
    pub processor: Option<ProcessorName>,
    pub status: PaymentStatus,
    pub started_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn pending(correlation_id: impl Into<String>, amount: f64, started_at: DateTime<Utc>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            amount,
            processor: None,
            status: PaymentStatus::Pending,
            started_at,
        }
    }

    pub fn amount_cents(&self) -> i64 {
        money::to_cents(self.amount)
    }

    /// Sorted-ledger score: acceptance time in nanoseconds since the epoch.
    pub fn ledger_score(&self) -> i64 {
        ledger_score(self.started_at)
    }

    pub fn to_ledger_entry(&self) -> Result<String> {
        let entry = LedgerEntry {
            correlation_id: self.correlation_id.clone(),
            amount: self.amount_cents(),
            processor: self.processor,
            status: self.status,
            started_at: self.started_at,
        };
        Ok(serde_json::to_string(&entry)?)
    }
}

/// Nanoseconds since the epoch, saturating at the ends of the `i64` range.
pub fn ledger_score(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_nanos_opt()
        .unwrap_or(if ts.timestamp() < 0 { i64::MIN } else { i64::MAX })
}

/// One ledger line. Amounts are kept in cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub correlation_id: String,
    pub amount: i64,
    pub processor: Option<ProcessorName>,
    pub status: PaymentStatus,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub message: String,
    pub error: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(message: &str, error: Option<String>) -> Self {
        Self {
            message: message.to_string(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn request_uses_camel_case() {
        let req: CreatePaymentRequest =
            serde_json::from_str(r#"{"correlationId":"abc","amount":19.9}"#).unwrap();
        assert_eq!(req.correlation_id, "abc");
        assert!((req.amount - 19.9).abs() < f64::EPSILON);
    }

    #[test]
    fn ledger_entry_stores_cents() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123).single().unwrap();
        let mut record = PaymentRecord::pending("p-1", 19.90, ts);
        record.status = PaymentStatus::Success;
        record.processor = Some(ProcessorName::Fallback);

        let raw = record.to_ledger_entry().unwrap();
        let entry: LedgerEntry = serde_json::from_str(&raw).unwrap();
        assert_eq!(entry.amount, 1_990);
        assert_eq!(entry.processor, Some(ProcessorName::Fallback));
        assert_eq!(entry.status, PaymentStatus::Success);
        assert_eq!(record.ledger_score(), 1_700_000_000_000_000_123);
    }

    #[test]
    fn ledger_score_saturates_outside_nanosecond_range() {
        let early = Utc.with_ymd_and_hms(1500, 1, 1, 0, 0, 0).single().unwrap();
        let late = Utc.with_ymd_and_hms(2500, 1, 1, 0, 0, 0).single().unwrap();
        assert_eq!(ledger_score(early), i64::MIN);
        assert_eq!(ledger_score(late), i64::MAX);
        assert_eq!(ledger_score(Utc.timestamp_opt(0, 0).single().unwrap()), 0);
    }
}
