use profile_service::{
    build_router,
    config::ProfileConfig,
    db,
    services::{GoogleGeocoder, PgStore},
    AppState,
};
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = ProfileConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    profile_service::services::metrics::init_metrics();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting profile service"
    );

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;
    let store = Arc::new(PgStore::new(pool));

    let geocoder = GoogleGeocoder::new(&config.geocoding)?;
    tracing::info!(base_url = %config.geocoding.base_url, "Address verifier initialized");

    let state = AppState::new(config.clone(), store, Arc::new(geocoder));
    let app = build_router(state);

    let addr = config.common.socket_addr();

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
