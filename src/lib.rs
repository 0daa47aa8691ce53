pub mod config;
pub mod error;
pub mod domain {
    pub mod health;
    pub mod money;
    pub mod payment;
    pub mod summary;
}
pub mod http {
    pub mod errors;
    pub mod routes;
    pub mod handlers {
        pub mod external_health;
        pub mod payments;
        pub mod summary;
    }
    pub mod middleware {
        pub mod request_log;
    }
}
pub mod metrics {
    pub mod aggregator;
    pub mod counters;
}
pub mod processors;
pub mod repo {
    pub mod memory_store;
    pub mod redis_store;
    pub mod store;
}
pub mod router {
    pub mod health_policy;
}
pub mod service {
    pub mod health_monitor;
    pub mod payment_service;
    pub mod queue;
    pub mod retry_loop;
    pub mod worker_pool;
}

#[derive(Clone)]
pub struct AppState {
    pub payment_service: service::payment_service::PaymentService,
}
