pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use service_core::axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::from_fn,
    routing::get,
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::ProfileConfig;
use crate::handlers::{PROFILE_PATH, STUDY_PREFERENCES_PATH};
use crate::services::{
    AddressVerifier, ProfileCoordinator, ProfileStore, StudyPreferencesCoordinator, TokenService,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::profile::get_profile,
        handlers::profile::create_profile,
        handlers::profile::update_profile,
        handlers::profile::delete_profile,
        handlers::study_preferences::get_study_preferences,
        handlers::study_preferences::create_study_preferences,
        handlers::study_preferences::update_study_preferences,
        handlers::study_preferences::delete_study_preferences,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::profile::ProfileRequest,
            dtos::study_preferences::StudyPreferencesRequest,
            models::UserProfile,
            models::StudyPreferences,
            models::StudyMode,
            models::Capability,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Profile", description = "Student profile capture and maintenance"),
        (name = "Study Preferences", description = "Study preferences unlocked by a completed profile"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    middleware::TOKEN_COOKIE,
                ))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: ProfileConfig,
    pub store: Arc<dyn ProfileStore>,
    pub tokens: TokenService,
    pub profiles: ProfileCoordinator,
    pub study_preferences: StudyPreferencesCoordinator,
}

impl AppState {
    pub fn new(
        config: ProfileConfig,
        store: Arc<dyn ProfileStore>,
        address_verifier: Arc<dyn AddressVerifier>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt);
        let profiles = ProfileCoordinator::new(store.clone(), address_verifier, tokens.clone());
        let study_preferences = StudyPreferencesCoordinator::new(store.clone());

        Self {
            config,
            store,
            tokens,
            profiles,
            study_preferences,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let allowed_origins: Vec<HeaderValue> = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter(|o| {
            if o.as_str() == "*" {
                tracing::warn!("Wildcard CORS origin ignored; credentials require explicit origins");
            }
            o.as_str() != "*"
        })
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    let api = Router::new()
        .route(
            PROFILE_PATH,
            get(handlers::get_profile)
                .post(handlers::create_profile)
                .patch(handlers::update_profile)
                .delete(handlers::delete_profile),
        )
        .route(
            STUDY_PREFERENCES_PATH,
            get(handlers::get_study_preferences)
                .post(handlers::create_study_preferences)
                .patch(handlers::update_study_preferences)
                .delete(handlers::delete_study_preferences),
        )
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route_layer(from_fn(middleware::metrics_middleware));

    api.with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_credentials(true)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Database is unreachable", body = ErrorResponse)
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        AppError::DatabaseError(anyhow::Error::new(e))
    })?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": state.config.service_name,
            "version": state.config.service_version,
            "environment": format!("{:?}", state.config.environment),
            "checks": {
                "database": "up"
            }
        })),
    ))
}
