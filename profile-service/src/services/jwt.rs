use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::Capability;

/// Signs and verifies the bearer credential. Verification is stateless: a
/// credential is valid iff its signature checks out and it has not expired.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

/// Claims carried by every credential. The permission snapshot is frozen at
/// issue time; a grant only becomes visible once a new credential is issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID). Credentials minted at sign-in carry it as `id`.
    #[serde(alias = "id")]
    pub sub: String,
    /// Capability tags held when the credential was minted.
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    #[serde(default)]
    pub jti: String,
}

impl AccessClaims {
    pub fn has(&self, capability: Capability) -> bool {
        self.permissions.iter().any(|p| p == capability.as_str())
    }
}

/// A freshly minted credential, ready to be placed in a cookie.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
    pub claims: AccessClaims,
    pub expires_at: DateTime<Utc>,
}

/// Caller identity established by a successful verification.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub claims: AccessClaims,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("credential is missing")]
    Missing,

    #[error("credential has expired")]
    Expired,

    #[error("credential is invalid: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("credential subject is not a valid identity")]
    MalformedSubject,

    #[error("missing capability: {0}")]
    MissingCapability(Capability),

    #[error("failed to sign credential: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        tracing::info!(
            ttl_minutes = config.token_ttl_minutes,
            "Token service initialized with HS256"
        );
        Self::from_secret(
            config.secret.expose_secret().as_bytes(),
            Duration::minutes(config.token_ttl_minutes),
        )
    }

    pub fn from_secret(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a credential for `user_id` holding `permissions`, valid for `ttl`
    /// from now. Duplicate tags are collapsed.
    pub fn issue<I, S>(
        &self,
        user_id: Uuid,
        permissions: I,
        profile_id: Option<Uuid>,
        ttl: Duration,
    ) -> Result<Credential, TokenError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now = Utc::now();
        let exp = now + ttl;
        let permissions: BTreeSet<String> = permissions.into_iter().map(Into::into).collect();

        let claims = AccessClaims {
            sub: user_id.to_string(),
            permissions: permissions.into_iter().collect(),
            profile_id: profile_id.map(|id| id.to_string()),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)?;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or(exp);

        Ok(Credential {
            token,
            claims,
            expires_at,
        })
    }

    /// Mint a credential with the configured lifetime.
    pub fn issue_default<I, S>(
        &self,
        user_id: Uuid,
        permissions: I,
        profile_id: Option<Uuid>,
    ) -> Result<Credential, TokenError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.issue(user_id, permissions, profile_id, self.ttl)
    }

    /// Decode a credential and check that it carries every `required`
    /// capability.
    pub fn verify(
        &self,
        token: Option<&str>,
        required: &[Capability],
    ) -> Result<Principal, TokenError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(TokenError::Missing)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e),
            })?
            .claims;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::MalformedSubject)?;

        if let Some(missing) = required.iter().find(|cap| !claims.has(**cap)) {
            return Err(TokenError::MissingCapability(*missing));
        }

        Ok(Principal { user_id, claims })
    }
}
