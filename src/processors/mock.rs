use crate::domain::health::{ProcessorHealth, ProcessorName};
use crate::processors::{PaymentProcessor, ProcessorRequest, ProcessorResponse};
use anyhow::{anyhow, bail, Result};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    AlwaysSuccess,
    AlwaysFailure,
    Delay(Duration),
}

impl FromStr for MockBehavior {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "success" => Ok(MockBehavior::AlwaysSuccess),
            "failure" => Ok(MockBehavior::AlwaysFailure),
            other => {
                let ms = other
                    .strip_prefix("delay-")
                    .and_then(|v| v.parse::<u64>().ok())
                    .ok_or_else(|| anyhow!("unknown mock behavior: {}", other))?;
                Ok(MockBehavior::Delay(Duration::from_millis(ms)))
            }
        }
    }
}

/// In-process processor with scripted answers, used for local runs and tests.
pub struct MockProcessor {
    pub name: ProcessorName,
    behavior: RwLock<MockBehavior>,
    health: RwLock<Option<ProcessorHealth>>,
    health_delay: RwLock<Option<Duration>>,
    calls: AtomicUsize,
    health_calls: AtomicUsize,
    received: Mutex<Vec<String>>,
}

impl MockProcessor {
    pub fn new(name: ProcessorName, behavior: MockBehavior) -> Self {
        Self {
            name,
            behavior: RwLock::new(behavior),
            health: RwLock::new(Some(ProcessorHealth::healthy(0))),
            health_delay: RwLock::new(None),
            calls: AtomicUsize::new(0),
            health_calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Builds a mock from a `mock://<behavior>` url.
    pub fn from_url(name: ProcessorName, url: &str) -> Result<Self> {
        let behavior = url
            .strip_prefix("mock://")
            .ok_or_else(|| anyhow!("not a mock url: {}", url))?;
        Ok(Self::new(name, behavior.trim_end_matches('/').parse()?))
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.write().unwrap_or_else(|e| e.into_inner()) = behavior;
    }

    /// `None` makes every health probe fail.
    pub fn set_health(&self, health: Option<ProcessorHealth>) {
        *self.health.write().unwrap_or_else(|e| e.into_inner()) = health;
    }

    /// Makes every health probe wait `delay` before answering.
    pub fn set_health_delay(&self, delay: Option<Duration>) {
        *self.health_delay.write().unwrap_or_else(|e| e.into_inner()) = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait::async_trait]
impl PaymentProcessor for MockProcessor {
    fn kind(&self) -> &'static str {
        "mock"
    }

    async fn submit_payment(&self, request: ProcessorRequest) -> Result<ProcessorResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.correlation_id.clone());

        let behavior = self.behavior.read().unwrap_or_else(|e| e.into_inner()).clone();
        match behavior {
            MockBehavior::AlwaysSuccess => {}
            MockBehavior::AlwaysFailure => bail!("mock {} processor declined payment", self.name),
            MockBehavior::Delay(d) => tokio::time::sleep(d).await,
        }

        Ok(ProcessorResponse {
            message: format!("mock_txn_{}", uuid::Uuid::new_v4()),
        })
    }

    async fn health(&self) -> Result<ProcessorHealth> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.health_delay.read().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let health = *self.health.read().unwrap_or_else(|e| e.into_inner());
        health.ok_or_else(|| anyhow!("mock {} health endpoint unavailable", self.name))
    }
}
