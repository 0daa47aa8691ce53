use crate::domain::health::{ProcessorHealth, ProcessorName};
use crate::domain::payment::PaymentRecord;
use crate::domain::summary::SummaryRange;
use crate::repo::store::PaymentStore;
use anyhow::Result;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Ledger {
    // Same member under the same score is stored once, like a sorted set.
    entries: BTreeSet<(i64, String)>,
}

/// Process-local store with the same semantics as the Redis store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    payments: Arc<RwLock<HashMap<String, PaymentRecord>>>,
    health: Arc<RwLock<HashMap<ProcessorName, ProcessorHealth>>>,
    ledger: Arc<RwLock<Ledger>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ledger_len(&self) -> usize {
        self.ledger.read().await.entries.len()
    }
}

#[async_trait::async_trait]
impl PaymentStore for MemoryStore {
    async fn find_payment(&self, correlation_id: &str) -> Result<Option<PaymentRecord>> {
        Ok(self.payments.read().await.get(correlation_id).cloned())
    }

    async fn save_payment(&self, record: &PaymentRecord) -> Result<()> {
        let entry = record.to_ledger_entry()?;
        self.payments
            .write()
            .await
            .insert(record.correlation_id.clone(), record.clone());
        self.ledger
            .write()
            .await
            .entries
            .insert((record.ledger_score(), entry));
        Ok(())
    }

    async fn find_processor_health(&self, name: ProcessorName) -> Result<Option<ProcessorHealth>> {
        Ok(self.health.read().await.get(&name).copied())
    }

    async fn save_processor_health(&self, name: ProcessorName, health: &ProcessorHealth) -> Result<()> {
        self.health.write().await.insert(name, *health);
        Ok(())
    }

    async fn ledger_entries(&self, range: Option<SummaryRange>) -> Result<Vec<String>> {
        let ledger = self.ledger.read().await;
        let out = match range {
            Some(range) => {
                let (min, max) = range.scores();
                if min > max {
                    return Ok(Vec::new());
                }
                ledger
                    .entries
                    .range((min, String::new())..)
                    .take_while(|(score, _)| *score <= max)
                    .map(|(_, raw)| raw.clone())
                    .collect()
            }
            None => ledger.entries.iter().map(|(_, raw)| raw.clone()).collect(),
        };
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PaymentStatus;
    use chrono::{Duration, TimeZone, Utc};

    #[tokio::test]
    async fn overwrites_record_and_appends_ledger() {
        let store = MemoryStore::new();
        let ts = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        let mut record = PaymentRecord::pending("p-1", 10.0, ts);
        store.save_payment(&record).await.unwrap();

        record.status = PaymentStatus::Success;
        record.processor = Some(ProcessorName::Default);
        store.save_payment(&record).await.unwrap();

        let found = store.find_payment("p-1").await.unwrap().unwrap();
        assert_eq!(found.status, PaymentStatus::Success);
        assert_eq!(store.ledger_len().await, 2);
        assert!(store.find_payment("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn range_bounds_are_inclusive() {
        let store = MemoryStore::new();
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            let record = PaymentRecord::pending(*id, 1.0, t0 + Duration::seconds(i as i64));
            store.save_payment(&record).await.unwrap();
        }

        let range = SummaryRange::new(t0 + Duration::seconds(1), t0 + Duration::seconds(2));
        let lines = store.ledger_entries(Some(range)).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"b\""));
        assert!(lines[1].contains("\"c\""));

        assert_eq!(store.ledger_entries(None).await.unwrap().len(), 3);

        let inverted = SummaryRange::new(t0 + Duration::seconds(2), t0);
        assert!(store.ledger_entries(Some(inverted)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keeps_health_per_processor() {
        let store = MemoryStore::new();
        store
            .save_processor_health(ProcessorName::Fallback, &ProcessorHealth::healthy(30))
            .await
            .unwrap();

        assert!(store.find_processor_health(ProcessorName::Default).await.unwrap().is_none());
        assert_eq!(
            store.find_processor_health(ProcessorName::Fallback).await.unwrap(),
            Some(ProcessorHealth::healthy(30))
        );
    }
}
