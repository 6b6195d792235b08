//! HTTP handlers for profile-service.

pub mod metrics;
pub mod profile;
pub mod study_preferences;

pub use profile::*;
pub use study_preferences::*;
