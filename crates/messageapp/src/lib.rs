pub mod api;
pub mod config;
pub mod params;
pub mod seed;
pub mod shutdown;

use std::sync::atomic::AtomicBool;

use messages::ErrorKind;
use messages::MessagesService;

/// Metrics for prometheus
pub struct Metrics {
    pub registry: prometheus::Registry,
    pub messages_created: prometheus::IntCounter,
    pub messages_updated: prometheus::IntCounter,
    pub messages_deleted: prometheus::IntCounter,
    pub error_responses: prometheus::IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = prometheus::Registry::new();

        let messages_created =
            prometheus::IntCounter::new("messageapp_messages_created_total", "Messages created")?;
        let messages_updated =
            prometheus::IntCounter::new("messageapp_messages_updated_total", "Messages updated")?;
        let messages_deleted =
            prometheus::IntCounter::new("messageapp_messages_deleted_total", "Messages deleted")?;
        let error_responses = prometheus::IntCounterVec::new(
            prometheus::Opts::new("messageapp_error_responses_total", "Error responses by kind"),
            &["kind"],
        )?;

        registry.register(Box::new(messages_created.clone()))?;
        registry.register(Box::new(messages_updated.clone()))?;
        registry.register(Box::new(messages_deleted.clone()))?;
        registry.register(Box::new(error_responses.clone()))?;

        Ok(Self {
            registry,
            messages_created,
            messages_updated,
            messages_deleted,
            error_responses,
        })
    }

    pub fn record_error(&self, kind: ErrorKind) {
        let kind = kind.to_string();
        self.error_responses.with_label_values(&[kind.as_str()]).inc();
    }
}

/// Shared application state
pub struct AppState {
    pub service: MessagesService,
    pub shutting_down: AtomicBool,
    pub metrics: Metrics,
    pub log_requests: bool,
}

impl AppState {
    pub fn new(service: MessagesService, log_requests: bool) -> Result<Self, prometheus::Error> {
        Ok(Self {
            service,
            shutting_down: AtomicBool::new(false),
            metrics: Metrics::new()?,
            log_requests,
        })
    }
}
