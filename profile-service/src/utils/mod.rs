pub mod json;
pub mod validation;

pub use json::parse_json;
pub use validation::{
    check_graduation_after_birth, validate_profile, validate_study_preferences, ErrorSet,
    ValidationMode,
};
