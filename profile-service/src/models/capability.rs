//! Capability tags carried in credentials and recorded in the permission ledger.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Grantable right controlling access to an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    CanViewDashboard,
    CanViewProfile,
    CanChangeProfile,
    CanViewStudyPreferences,
    CanChangeStudyPreferences,
    CanViewAvailabilitySchedule,
    CanChangeAvailabilitySchedule,
}

/// Capabilities required by every profile endpoint.
pub const PROFILE_ACCESS: [Capability; 3] = [
    Capability::CanViewDashboard,
    Capability::CanViewProfile,
    Capability::CanChangeProfile,
];

/// Capabilities granted once a profile has been completed.
pub const PROFILE_COMPLETION_GRANTS: [Capability; 4] = [
    Capability::CanViewStudyPreferences,
    Capability::CanChangeStudyPreferences,
    Capability::CanViewAvailabilitySchedule,
    Capability::CanChangeAvailabilitySchedule,
];

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::CanViewDashboard,
        Capability::CanViewProfile,
        Capability::CanChangeProfile,
        Capability::CanViewStudyPreferences,
        Capability::CanChangeStudyPreferences,
        Capability::CanViewAvailabilitySchedule,
        Capability::CanChangeAvailabilitySchedule,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::CanViewDashboard => "can_view_dashboard",
            Capability::CanViewProfile => "can_view_profile",
            Capability::CanChangeProfile => "can_change_profile",
            Capability::CanViewStudyPreferences => "can_view_study_preferences",
            Capability::CanChangeStudyPreferences => "can_change_study_preferences",
            Capability::CanViewAvailabilitySchedule => "can_view_availability_schedule",
            Capability::CanChangeAvailabilitySchedule => "can_change_availability_schedule",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matches_as_str() {
        for cap in Capability::ALL {
            assert_eq!(Capability::parse(cap.as_str()), Some(cap));
        }
        assert_eq!(Capability::parse("can_fly"), None);
    }

    #[test]
    fn test_serde_uses_snake_case_tags() {
        let json = serde_json::to_string(&Capability::CanChangeStudyPreferences).unwrap();
        assert_eq!(json, "\"can_change_study_preferences\"");
    }

    #[test]
    fn test_completion_grants_are_disjoint_from_access_set() {
        for cap in PROFILE_COMPLETION_GRANTS {
            assert!(!PROFILE_ACCESS.contains(&cap));
        }
    }
}
