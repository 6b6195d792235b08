pub mod auth;
pub mod metrics;

pub use auth::{authorize, credential_cookie, presented_token, TOKEN_COOKIE};
pub use metrics::metrics_middleware;
