use prometheus::{Encoder, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{Once, OnceLock};

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static PROFILE_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static ADDRESS_VERIFICATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

fn counter(name: &str, help: &str, labels: &[&str]) -> Result<IntCounterVec, prometheus::Error> {
    IntCounterVec::new(Opts::new(name, help), labels)
}

static INIT: Once = Once::new();

/// Build and register every collector. Only the first call has any effect.
pub fn init_metrics() {
    INIT.call_once(install);
}

fn install() {
    let registry = Registry::new();

    let collectors = (|| -> Result<_, prometheus::Error> {
        let requests_total = counter(
            "http_requests_total",
            "Total number of HTTP requests",
            &["method", "path", "status"],
        )?;
        let request_duration = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "path", "status"],
        )?;
        let profile_operations = counter(
            "profile_operations_total",
            "Profile and study-preference operations by outcome",
            &["operation", "outcome"],
        )?;
        let address_verifications = counter(
            "address_verifications_total",
            "Address verification attempts by outcome",
            &["outcome"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(profile_operations.clone()))?;
        registry.register(Box::new(address_verifications.clone()))?;

        Ok((
            requests_total,
            request_duration,
            profile_operations,
            address_verifications,
        ))
    })();

    match collectors {
        Ok((requests_total, request_duration, profile_operations, address_verifications)) => {
            let _ = REGISTRY.set(registry);
            let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
            let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
            let _ = PROFILE_OPERATIONS_TOTAL.set(profile_operations);
            let _ = ADDRESS_VERIFICATIONS_TOTAL.set(address_verifications);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize metrics");
        }
    }
}

pub fn record_operation(operation: &str, outcome: &str) {
    if let Some(counter) = PROFILE_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[operation, outcome]).inc();
    }
}

pub fn record_address_verification(outcome: &str) {
    if let Some(counter) = ADDRESS_VERIFICATIONS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to convert metrics to UTF-8: {}", e);
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}
