use crate::service::queue::{PRIMARY_QUEUE_CAPACITY, RETRY_QUEUE_CAPACITY};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub storage_backend: StorageBackend,
    pub redis_url: String,
    pub default_processor_url: String,
    pub fallback_processor_url: String,
    pub processor_timeout_ms: u64,
    pub log_format: String,
    pub shutdown_timeout: Duration,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let pipeline = PipelineConfig {
            worker_count: env_parse("PAYMENT_WORKERS").unwrap_or(20),
            health_check_interval: Duration::from_millis(
                env_parse("HEALTH_CHECK_INTERVAL_MS").unwrap_or(8_000),
            ),
            ..PipelineConfig::default()
        };

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| {
                format!(
                    "0.0.0.0:{}",
                    std::env::var("API_PORT").unwrap_or_else(|_| "9999".to_string())
                )
            }),
            storage_backend: match std::env::var("STORAGE_BACKEND").as_deref() {
                Ok("memory") => StorageBackend::Memory,
                _ => StorageBackend::Redis,
            },
            redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| redis_url_from_parts()),
            default_processor_url: std::env::var("EXTERNAL_SERVICE_DEFAULT_PAYMENT_PROCESSOR_URL")
                .unwrap_or_else(|_| "http://payment-processor-default:8080".to_string()),
            fallback_processor_url: std::env::var("EXTERNAL_SERVICE_FALLBACK_PAYMENT_PROCESSOR_URL")
                .unwrap_or_else(|_| "http://payment-processor-fallback:8080".to_string()),
            processor_timeout_ms: env_parse("PROCESSOR_TIMEOUT_MS").unwrap_or(60_000),
            log_format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            shutdown_timeout: Duration::from_secs(env_parse("SHUTDOWN_TIMEOUT_SECS").unwrap_or(30)),
            pipeline,
        }
    }
}

/// Tunables of the processing pipeline. Defaults are the production values.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub worker_count: usize,
    pub primary_queue_capacity: usize,
    pub retry_queue_capacity: usize,
    pub attempt_timeout: Duration,
    pub enqueue_attempts: u32,
    pub enqueue_backoff_step: Duration,
    pub health_check_interval: Duration,
    pub health_check_timeout: Duration,
    pub retry_tick_interval: Duration,
    pub retry_batch_size: usize,
    pub retry_batch_delay: Duration,
    pub retry_single_delay: Duration,
    pub metrics_interval: Duration,
}

impl PipelineConfig {
    /// Rate-limit permits: twice the worker count.
    pub fn max_in_flight(&self) -> usize {
        self.worker_count.max(1) * 2
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: 20,
            primary_queue_capacity: PRIMARY_QUEUE_CAPACITY,
            retry_queue_capacity: RETRY_QUEUE_CAPACITY,
            attempt_timeout: Duration::from_secs(30),
            enqueue_attempts: 3,
            enqueue_backoff_step: Duration::from_millis(100),
            health_check_interval: Duration::from_secs(8),
            health_check_timeout: Duration::from_secs(10),
            retry_tick_interval: Duration::from_secs(10),
            retry_batch_size: 100,
            retry_batch_delay: Duration::from_secs(1),
            retry_single_delay: Duration::from_secs(5),
            metrics_interval: Duration::from_secs(60),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse::<T>().ok())
}

fn redis_url_from_parts() -> String {
    let host = std::env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
    match std::env::var("REDIS_PASSWORD") {
        Ok(password) if !password.is_empty() => format!("redis://:{}@{}:{}/", password, host, port),
        _ => format!("redis://{}:{}/", host, port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_defaults_match_production_values() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.worker_count, 20);
        assert_eq!(cfg.max_in_flight(), 40);
        assert_eq!(cfg.primary_queue_capacity, 10_000);
        assert_eq!(cfg.retry_queue_capacity, 1_000);
        assert_eq!(cfg.retry_batch_size, 100);
        assert_eq!(cfg.attempt_timeout, Duration::from_secs(30));
    }
}
