use crate::domain::health::{ProcessorHealth, ProcessorName};
use crate::domain::money;
use crate::domain::payment::PaymentRecord;
use crate::domain::summary::SummaryRange;
use crate::repo::store::PaymentStore;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use redis::AsyncCommands;
use std::collections::HashMap;

const LEDGER_KEY: &str = "payments:ledger";

#[derive(Clone)]
pub struct RedisStore {
    pub client: redis::Client,
}

impl RedisStore {
    pub fn new(redis_url: &str) -> Result<Self> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
        })
    }

    fn payment_key(correlation_id: &str) -> String {
        format!("payment:{}", correlation_id)
    }

    fn health_key(name: ProcessorName) -> String {
        format!("processor:health:{}", name)
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

pub fn payment_fields(record: &PaymentRecord) -> Vec<(&'static str, String)> {
    vec![
        ("amount", record.amount_cents().to_string()),
        (
            "processor",
            record.processor.map(|p| p.as_str().to_string()).unwrap_or_default(),
        ),
        ("status", record.status.as_str().to_string()),
        (
            "startedAt",
            record.started_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
        ),
    ]
}

pub fn payment_from_fields(correlation_id: &str, fields: &HashMap<String, String>) -> Result<PaymentRecord> {
    let field = |name: &str| {
        fields
            .get(name)
            .ok_or_else(|| anyhow!("payment {} is missing field {}", correlation_id, name))
    };

    let processor = match field("processor")?.as_str() {
        "" => None,
        raw => Some(raw.parse::<ProcessorName>()?),
    };
    let started_at = DateTime::parse_from_rfc3339(field("startedAt")?)
        .with_context(|| format!("payment {} has an invalid startedAt", correlation_id))?
        .with_timezone(&Utc);

    Ok(PaymentRecord {
        correlation_id: correlation_id.to_string(),
        amount: money::float_from_str(field("amount")?)?,
        processor,
        status: field("status")?.parse()?,
        started_at,
    })
}

pub fn health_fields(health: &ProcessorHealth) -> Vec<(&'static str, String)> {
    vec![
        ("failing", health.failing.to_string()),
        ("minResponseTime", health.min_response_time_ms.to_string()),
    ]
}

pub fn health_from_fields(fields: &HashMap<String, String>) -> Result<ProcessorHealth> {
    let failing = fields
        .get("failing")
        .ok_or_else(|| anyhow!("health is missing field failing"))?
        .parse::<bool>()?;
    let min_response_time_ms = fields
        .get("minResponseTime")
        .ok_or_else(|| anyhow!("health is missing field minResponseTime"))?
        .parse::<u64>()?;
    Ok(ProcessorHealth {
        failing,
        min_response_time_ms,
    })
}

#[async_trait::async_trait]
impl PaymentStore for RedisStore {
    async fn find_payment(&self, correlation_id: &str) -> Result<Option<PaymentRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let fields: HashMap<String, String> = conn.hgetall(Self::payment_key(correlation_id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(payment_from_fields(correlation_id, &fields)?))
    }

    async fn save_payment(&self, record: &PaymentRecord) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let entry = record.to_ledger_entry()?;
        let fields = payment_fields(record);
        let _: () = conn
            .hset_multiple(Self::payment_key(&record.correlation_id), fields.as_slice())
            .await?;
        let _: usize = conn.zadd(LEDGER_KEY, entry, record.ledger_score()).await?;
        Ok(())
    }

    async fn find_processor_health(&self, name: ProcessorName) -> Result<Option<ProcessorHealth>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let fields: HashMap<String, String> = conn.hgetall(Self::health_key(name)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(health_from_fields(&fields)?))
    }

    async fn save_processor_health(&self, name: ProcessorName, health: &ProcessorHealth) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let fields = health_fields(health);
        let _: () = conn
            .hset_multiple(Self::health_key(name), fields.as_slice())
            .await?;
        Ok(())
    }

    async fn ledger_entries(&self, range: Option<SummaryRange>) -> Result<Vec<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let entries: Vec<String> = match range {
            Some(range) => {
                let (min, max) = range.scores();
                conn.zrangebyscore(LEDGER_KEY, min, max).await?
            }
            None => conn.zrange(LEDGER_KEY, 0, -1).await?,
        };
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PaymentStatus;
    use chrono::TimeZone;

    fn to_map(fields: Vec<(&'static str, String)>) -> HashMap<String, String> {
        fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn payment_fields_round_trip() {
        let ts = Utc.timestamp_opt(1_700_000_000, 987_654_321).single().unwrap();
        let mut record = PaymentRecord::pending("p-1", 1_000.00, ts);
        record.processor = Some(ProcessorName::Default);
        record.status = PaymentStatus::Success;

        let fields = to_map(payment_fields(&record));
        assert_eq!(fields["amount"], "100000");
        assert_eq!(fields["processor"], "default");

        let back = payment_from_fields("p-1", &fields).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn pending_payment_has_empty_processor() {
        let record = PaymentRecord::pending("p-2", 5.0, Utc::now());
        let fields = to_map(payment_fields(&record));
        assert_eq!(fields["processor"], "");
        assert!(payment_from_fields("p-2", &fields).unwrap().processor.is_none());
    }

    #[test]
    fn missing_or_bad_health_fields_fail() {
        let good = to_map(health_fields(&ProcessorHealth::healthy(15)));
        assert_eq!(health_from_fields(&good).unwrap(), ProcessorHealth::healthy(15));

        let mut bad = good.clone();
        bad.insert("failing".to_string(), "maybe".to_string());
        assert!(health_from_fields(&bad).is_err());

        bad.remove("failing");
        assert!(health_from_fields(&bad).is_err());
    }
}
