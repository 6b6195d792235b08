pub mod capability;
pub mod permission;
pub mod profile;
pub mod study_preferences;

pub use capability::{Capability, PROFILE_ACCESS, PROFILE_COMPLETION_GRANTS};
pub use permission::PermissionGrant;
pub use profile::{AddressChanges, PostalAddress, ProfileChanges, UserProfile};
pub use study_preferences::{StudyMode, StudyPreferenceChanges, StudyPreferences};
