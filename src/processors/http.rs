use crate::domain::health::{ProcessorHealth, ProcessorName};
use crate::processors::{PaymentProcessor, ProcessorRequest, ProcessorResponse};
use anyhow::{bail, Result};
use std::time::Duration;

pub struct HttpProcessor {
    pub name: ProcessorName,
    pub base_url: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl HttpProcessor {
    pub fn new(name: ProcessorName, base_url: &str, timeout_ms: u64, client: reqwest::Client) -> Self {
        Self {
            name,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms,
            client,
        }
    }

    fn payments_url(&self) -> String {
        format!("{}/payments", self.base_url)
    }

    fn health_url(&self) -> String {
        format!("{}/payments/service-health", self.base_url)
    }
}

#[async_trait::async_trait]
impl PaymentProcessor for HttpProcessor {
    fn kind(&self) -> &'static str {
        "http"
    }

    async fn submit_payment(&self, request: ProcessorRequest) -> Result<ProcessorResponse> {
        tracing::debug!(
            "submitting payment {} to {} processor",
            request.correlation_id,
            self.name
        );

        let resp = self
            .client
            .post(self.payments_url())
            .json(&request)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "{} processor answered HTTP {}: {}",
                self.name,
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            );
        }

        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(ProcessorResponse::default());
        }
        Ok(serde_json::from_str::<ProcessorResponse>(&body)?)
    }

    async fn health(&self) -> Result<ProcessorHealth> {
        let resp = self
            .client
            .get(self.health_url())
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            bail!("{} health check answered HTTP {}", self.name, status.as_u16());
        }
        Ok(resp.json::<ProcessorHealth>().await?)
    }
}
