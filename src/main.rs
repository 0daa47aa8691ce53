use payment_relay::config::{AppConfig, StorageBackend};
use payment_relay::domain::health::ProcessorName;
use payment_relay::http::routes::build_router;
use payment_relay::processors::http::HttpProcessor;
use payment_relay::processors::mock::MockProcessor;
use payment_relay::processors::{PaymentProcessor, ProcessorTable};
use payment_relay::repo::memory_store::MemoryStore;
use payment_relay::repo::redis_store::RedisStore;
use payment_relay::repo::store::PaymentStore;
use payment_relay::service::payment_service::PaymentService;
use payment_relay::service::queue::PaymentQueues;
use payment_relay::service::worker_pool::WorkerPool;
use payment_relay::AppState;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env();

    if cfg.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    }

    let store: Arc<dyn PaymentStore> = match cfg.storage_backend {
        StorageBackend::Redis => {
            let store = RedisStore::new(&cfg.redis_url)?;
            store.ping().await?;
            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, payments are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let client = reqwest::Client::new();
    let processors = ProcessorTable::new(
        build_processor(ProcessorName::Default, &cfg.default_processor_url, &cfg, &client)?,
        build_processor(ProcessorName::Fallback, &cfg.fallback_processor_url, &cfg, &client)?,
    );
    for name in ProcessorName::ALL {
        tracing::info!("{} processor uses the {} client", name, processors.get(name).kind());
    }

    let queues = PaymentQueues::new(
        cfg.pipeline.primary_queue_capacity,
        cfg.pipeline.retry_queue_capacity,
    );
    let cancel = CancellationToken::new();
    let payment_service = PaymentService::new(store, processors, queues, &cfg.pipeline, cancel);

    let mut pool = WorkerPool::new(payment_service.clone(), cfg.pipeline.clone());
    pool.start();

    let app = build_router(AppState { payment_service });

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("http server stopped, draining workers");
    if let Err(err) = pool.shutdown(cfg.shutdown_timeout).await {
        tracing::error!("shutdown error: {}", err);
    }
    pool.stop_background().await;
    tracing::info!("shutdown complete");
    Ok(())
}

fn build_processor(
    name: ProcessorName,
    url: &str,
    cfg: &AppConfig,
    client: &reqwest::Client,
) -> anyhow::Result<Arc<dyn PaymentProcessor>> {
    if url.starts_with("mock://") {
        tracing::warn!("{} processor is mocked ({})", name, url);
        return Ok(Arc::new(MockProcessor::from_url(name, url)?));
    }
    Ok(Arc::new(HttpProcessor::new(
        name,
        url,
        cfg.processor_timeout_ms,
        client.clone(),
    )))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
