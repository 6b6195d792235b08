use service_core::error::AppError;
use thiserror::Error;

use super::jwt::TokenError;
use super::store::StoreError;
use crate::models::Capability;
use crate::utils::ErrorSet;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Authentication failed: {0}")]
    Unauthenticated(TokenError),

    #[error("Missing permission: {0}")]
    Unauthorized(Capability),

    #[error("Validation failed")]
    Invalid(ErrorSet),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<TokenError> for ProfileError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MissingCapability(cap) => ProfileError::Unauthorized(cap),
            TokenError::Signing(e) => {
                ProfileError::Internal(anyhow::anyhow!("Failed to sign credential: {}", e))
            }
            other => ProfileError::Unauthenticated(other),
        }
    }
}

impl ProfileError {
    /// Label used for the operations metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            ProfileError::Unauthenticated(_) => "unauthenticated",
            ProfileError::Unauthorized(_) => "unauthorized",
            ProfileError::Invalid(_) => "invalid",
            ProfileError::Conflict(_) => "conflict",
            ProfileError::NotFound(_) => "not_found",
            ProfileError::Store(_) | ProfileError::Internal(_) => "error",
        }
    }
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Unauthenticated(e) => {
                tracing::debug!(error = %e, "Rejected credential");
                AppError::Unauthenticated(anyhow::anyhow!(
                    "Authentication credentials were not provided or are invalid"
                ))
            }
            ProfileError::Unauthorized(cap) => AppError::Forbidden(anyhow::anyhow!(
                "You do not have permission to perform this action ({})",
                cap
            )),
            ProfileError::Invalid(errors) => AppError::ValidationError(errors.into_inner()),
            ProfileError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            ProfileError::NotFound(msg) => AppError::NotFound(anyhow::anyhow!(msg)),
            ProfileError::Store(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ProfileError::Internal(e) => AppError::InternalError(e),
        }
    }
}
