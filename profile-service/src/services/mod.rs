//! Services layer for profile-service.
//!
//! Business logic for credentials, the permission ledger, address
//! verification and the profile / study-preference coordinators.

pub mod address;
pub mod error;
mod jwt;
pub mod ledger;
pub mod metrics;
mod profile;
pub mod store;
mod study_preferences;

pub use address::{AddressVerdict, AddressVerifier, GoogleGeocoder, MockAddressVerifier};
pub use error::ProfileError;
pub use jwt::{AccessClaims, Credential, Principal, TokenError, TokenService};
pub use profile::{ProfileCoordinator, ProfileCreated, PROFILE_EXISTS, PROFILE_NOT_FOUND};
pub use store::{InMemoryStore, PgStore, ProfileStore, StoreError, StoreTx};
pub use study_preferences::{StudyPreferencesCoordinator, PREFERENCES_EXIST, PREFERENCES_NOT_FOUND};
