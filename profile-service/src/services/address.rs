//! Postal address verification against an external geocoding service.
//!
//! Verification fails closed: transport errors, error statuses, ambiguous
//! results and partial matches all count as an invalid address.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::metrics;
use crate::config::GeocodingConfig;
use crate::models::PostalAddress;
use crate::utils::ErrorSet;

pub const ADDRESS_ERROR_FIELD: &str = "address";
pub const ADDRESS_ERROR_MESSAGE: &str =
    "Address could not be verified. Please check the address fields and try again";

/// What the geocoder made of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressVerdict {
    /// Exactly one full match.
    Resolved,
    NoMatch,
    Ambiguous,
    PartialMatch,
}

impl AddressVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressVerdict::Resolved => "resolved",
            AddressVerdict::NoMatch => "no_match",
            AddressVerdict::Ambiguous => "ambiguous",
            AddressVerdict::PartialMatch => "partial_match",
        }
    }
}

#[async_trait]
pub trait AddressVerifier: Send + Sync {
    async fn verify(&self, address: &PostalAddress) -> Result<AddressVerdict, anyhow::Error>;
}

/// Check `address` and record a failure under the `address` field of
/// `errors`. Returns whether the address resolved.
pub async fn is_valid_address(
    verifier: &dyn AddressVerifier,
    address: &PostalAddress,
    errors: &mut ErrorSet,
) -> bool {
    let result = verifier.verify(address).await;
    let outcome = match &result {
        Ok(verdict) => verdict.as_str(),
        Err(_) => "error",
    };
    metrics::record_address_verification(outcome);

    match result {
        Ok(AddressVerdict::Resolved) => return true,
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Address verification failed"),
    }

    tracing::info!(outcome, city = %address.city, country = %address.country, "Address rejected");
    errors.add(ADDRESS_ERROR_FIELD, ADDRESS_ERROR_MESSAGE);
    false
}

/// Google Geocoding API client.
#[derive(Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    partial_match: bool,
}

impl GoogleGeocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build geocoding client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

fn interpret(response: GeocodeResponse) -> Result<AddressVerdict, anyhow::Error> {
    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(AddressVerdict::NoMatch),
        status => {
            return Err(anyhow::anyhow!(
                "Geocoding service returned {}: {}",
                status,
                response.error_message.unwrap_or_default()
            ))
        }
    }

    match response.results.as_slice() {
        [] => Ok(AddressVerdict::NoMatch),
        [only] if only.partial_match => Ok(AddressVerdict::PartialMatch),
        [_] => Ok(AddressVerdict::Resolved),
        _ => Ok(AddressVerdict::Ambiguous),
    }
}

#[async_trait]
impl AddressVerifier for GoogleGeocoder {
    async fn verify(&self, address: &PostalAddress) -> Result<AddressVerdict, anyhow::Error> {
        let query = address.one_line();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("address", query.as_str()), ("key", self.api_key.expose_secret().as_str())])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Geocoding request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Geocoding service responded with HTTP {}",
                response.status()
            ));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse geocoding response: {}", e))?;

        interpret(body)
    }
}

/// Scripted verifier for tests and local development. Records every address
/// it is asked about.
pub struct MockAddressVerifier {
    verdict: Mutex<Option<AddressVerdict>>,
    seen: Mutex<Vec<PostalAddress>>,
}

impl Default for MockAddressVerifier {
    fn default() -> Self {
        Self::accepting()
    }
}

impl MockAddressVerifier {
    pub fn accepting() -> Self {
        Self::with_verdict(Some(AddressVerdict::Resolved))
    }

    pub fn rejecting() -> Self {
        Self::with_verdict(Some(AddressVerdict::NoMatch))
    }

    /// Every call fails as if the geocoder were unreachable.
    pub fn unavailable() -> Self {
        Self::with_verdict(None)
    }

    fn with_verdict(verdict: Option<AddressVerdict>) -> Self {
        Self {
            verdict: Mutex::new(verdict),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn set_verdict(&self, verdict: Option<AddressVerdict>) {
        if let Ok(mut slot) = self.verdict.lock() {
            *slot = verdict;
        }
    }

    pub fn seen(&self) -> Vec<PostalAddress> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AddressVerifier for MockAddressVerifier {
    async fn verify(&self, address: &PostalAddress) -> Result<AddressVerdict, anyhow::Error> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(address.clone());
        }
        let verdict = *self
            .verdict
            .lock()
            .map_err(|_| anyhow::anyhow!("mock verifier lock poisoned"))?;
        verdict.ok_or_else(|| anyhow::anyhow!("geocoding service unavailable"))
    }
}
