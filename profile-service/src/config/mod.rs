use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Lifetime of every credential minted by this service.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub geocoding: GeocodingConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: SecretString,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub cookie_secure: bool,
}

impl ProfileConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = ProfileConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("profile-service"), false)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), false)?,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: SecretString::new(get_env("DATABASE_URL", None, is_prod)?),
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "10", is_prod)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", "1", is_prod)?,
            },
            jwt: JwtConfig {
                secret: SecretString::new(get_env("JWT_SECRET", None, is_prod)?),
                token_ttl_minutes: parse_env(
                    "JWT_TOKEN_TTL_MINUTES",
                    &DEFAULT_TOKEN_TTL_MINUTES.to_string(),
                    false,
                )?,
            },
            geocoding: GeocodingConfig {
                api_key: SecretString::new(get_env("GEOCODING_API_KEY", None, is_prod)?),
                base_url: get_env(
                    "GEOCODING_BASE_URL",
                    Some("https://maps.googleapis.com/maps/api/geocode/json"),
                    false,
                )?,
                timeout_seconds: parse_env("GEOCODING_TIMEOUT_SECONDS", "5", false)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
                cookie_secure: parse_env("COOKIE_SECURE", if is_prod { "true" } else { "false" }, false)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.token_ttl_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_TOKEN_TTL_MINUTES must be positive"
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS cannot exceed DATABASE_MAX_CONNECTIONS"
            )));
        }

        if self.environment == Environment::Prod {
            if self.jwt.secret.expose_secret().len() < 32 {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "JWT_SECRET must be at least 32 bytes in production"
                )));
            }

            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if !self.security.cookie_secure {
                tracing::warn!("COOKIE_SECURE is disabled in production");
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{} is invalid: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProfileConfig {
        ProfileConfig {
            common: core_config::Config::default(),
            environment: Environment::Dev,
            service_name: "profile-service".to_string(),
            service_version: "test".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            database: DatabaseConfig {
                url: SecretString::new("postgres://localhost/studyhub".to_string()),
                max_connections: 5,
                min_connections: 1,
            },
            jwt: JwtConfig {
                secret: SecretString::new("short".to_string()),
                token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            },
            geocoding: GeocodingConfig {
                api_key: SecretString::new("key".to_string()),
                base_url: "http://localhost".to_string(),
                timeout_seconds: 5,
            },
            security: SecurityConfig {
                allowed_origins: vec!["*".to_string()],
                cookie_secure: false,
            },
        }
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Prod));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_dev_config_is_lenient() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_prod_rejects_short_secret_and_wildcard_origin() {
        let mut config = sample();
        config.environment = Environment::Prod;
        assert!(config.validate().is_err());

        config.jwt.secret = SecretString::new("x".repeat(48));
        assert!(config.validate().is_err());

        config.security.allowed_origins = vec!["https://studyhub.example".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let mut config = sample();
        config.jwt.token_ttl_minutes = 0;
        assert!(config.validate().is_err());
    }
}
