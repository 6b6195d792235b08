//! Test helpers for profile-service integration tests.
//!
//! Builds the full router over the in-memory store and a scripted address
//! verifier, and drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use profile_service::{
    build_router,
    config::{
        DatabaseConfig, Environment, GeocodingConfig, JwtConfig, ProfileConfig, SecurityConfig,
        DEFAULT_TOKEN_TTL_MINUTES,
    },
    models::PROFILE_ACCESS,
    services::{metrics, InMemoryStore, MockAddressVerifier, TokenService},
    AppState,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const PROFILE_URI: &str = "/studyhub/user-profile/user-information/";
pub const STUDY_PREFERENCES_URI: &str = "/studyhub/user-profile/study-preferences/";

/// Capability a registered account already holds that this service knows
/// nothing about; it must survive credential re-issue.
pub const FOREIGN_CAPABILITY: &str = "can_view_messages";

pub fn test_config() -> ProfileConfig {
    ProfileConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "profile-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: SecretString::new("postgres://localhost/studyhub_test".to_string()),
            max_connections: 5,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: SecretString::new(TEST_JWT_SECRET.to_string()),
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
        },
        geocoding: GeocodingConfig {
            api_key: SecretString::new("test-key".to_string()),
            base_url: "http://localhost:0/geocode/json".to_string(),
            timeout_seconds: 1,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            cookie_secure: false,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: InMemoryStore,
    pub verifier: Arc<MockAddressVerifier>,
    pub tokens: TokenService,
    pub user_id: Uuid,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// Value of the `token` cookie set by the response, if any.
    pub fn token_cookie(&self) -> Option<String> {
        self.set_cookie_header()
            .and_then(|c| c.split(';').next())
            .and_then(|pair| pair.strip_prefix("token="))
            .map(|v| v.to_string())
    }

    pub fn set_cookie_header(&self) -> Option<&str> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("token="))
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_verifier(MockAddressVerifier::accepting())
    }

    pub fn with_verifier(verifier: MockAddressVerifier) -> Self {
        metrics::init_metrics();

        let config = test_config();
        let store = InMemoryStore::new();
        let verifier = Arc::new(verifier);
        let state = AppState::new(config, Arc::new(store.clone()), verifier.clone());
        let tokens = state.tokens.clone();

        Self {
            router: build_router(state),
            store,
            verifier,
            tokens,
            user_id: Uuid::new_v4(),
        }
    }

    /// Credential as handed out at sign-in: the profile capabilities plus an
    /// unrelated one.
    pub fn sign_in_token(&self) -> String {
        let mut permissions: Vec<&str> = PROFILE_ACCESS.iter().map(|c| c.as_str()).collect();
        permissions.push(FOREIGN_CAPABILITY);
        self.token_with(&permissions)
    }

    pub fn token_with(&self, permissions: &[&str]) -> String {
        self.tokens
            .issue_default(self.user_id, permissions.iter().copied(), None)
            .expect("Failed to issue test token")
            .token
    }

    /// Credential in the shape the account subsystem mints at sign-in: the
    /// subject under `id` and no `iat` or `jti`.
    pub fn account_token(&self) -> String {
        let permissions: Vec<&str> = PROFILE_ACCESS.iter().map(|c| c.as_str()).collect();
        let claims = json!({
            "id": self.user_id.to_string(),
            "permissions": permissions,
            "exp": chrono::Utc::now().timestamp() + 600,
        });
        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .expect("Failed to encode account token")
    }

    pub fn expired_token(&self) -> String {
        let permissions: Vec<&str> = PROFILE_ACCESS.iter().map(|c| c.as_str()).collect();
        self.tokens
            .issue(self.user_id, permissions, None, Duration::minutes(-5))
            .expect("Failed to issue test token")
            .token
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a request carrying `token` in the `token` cookie.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("token={}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).expect("Failed to build request"))
            .await
    }

    pub async fn create_profile(&self, token: &str) -> TestResponse {
        self.request(
            Method::POST,
            PROFILE_URI,
            Some(token),
            Some(valid_profile_body()),
        )
        .await
    }
}

pub fn valid_profile_body() -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "age": 21,
        "date_of_birth": "2003-05-14",
        "address_line_1": "100 Queen St W",
        "city": "Toronto",
        "province": "ON",
        "country": "Canada",
        "postal_code": "M5H 2N2",
        "gender": "female",
        "user_bio": "Maths and machines",
        "education_institutions": "University of Toronto",
        "education_majors": "Mathematics",
        "education_degrees": "BSc",
        "graduation_date": "2026-06-01",
        "identification_option": "student_card",
        "identification_material": "c3R1ZGVudC1jYXJk"
    })
}

pub fn valid_study_preferences_body() -> Value {
    json!({
        "preferred_subjects": "linear algebra, statistics",
        "study_mode": "hybrid",
        "group_size": 4,
        "availability": "weekday evenings"
    })
}
