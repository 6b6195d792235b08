use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Identification material a student may submit to prove enrolment.
pub const IDENTIFICATION_OPTIONS: [&str; 4] = [
    "student_card",
    "enrollment_letter",
    "transcript",
    "school_email",
];

/// Profile body for both create (all mandatory fields present) and partial
/// update. Dates are `YYYY-MM-DD` strings so that a malformed date is reported
/// per field instead of rejecting the whole body.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProfileRequest {
    #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters"))]
    #[schema(example = "Ada")]
    pub first_name: Option<String>,

    #[serde(alias = "mid_name")]
    #[validate(length(max = 50, message = "Middle name must be at most 50 characters"))]
    pub middle_name: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters"))]
    #[schema(example = "Lovelace")]
    pub last_name: Option<String>,

    #[validate(range(min = 18, max = 120, message = "Age must be at least 18 and at most 120"))]
    #[schema(example = 21)]
    pub age: Option<i32>,

    #[serde(alias = "birth_day")]
    #[schema(example = "2003-05-14")]
    pub date_of_birth: Option<String>,

    #[validate(length(min = 1, max = 100, message = "First address must be between 1 and 100 characters"))]
    pub address_line_1: Option<String>,

    #[validate(length(max = 100, message = "Second address must be at most 100 characters"))]
    pub address_line_2: Option<String>,

    #[validate(length(min = 1, max = 100, message = "City must be between 1 and 100 characters"))]
    pub city: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Province must be between 1 and 100 characters"))]
    pub province: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Country must be between 1 and 100 characters"))]
    pub country: Option<String>,

    #[validate(length(min = 1, max = 10, message = "Postal Code must be a maximum of 10 characters long"))]
    pub postal_code: Option<String>,

    #[validate(length(min = 1, max = 30, message = "Gender must be between 1 and 30 characters"))]
    pub gender: Option<String>,

    #[validate(length(max = 50, message = "Religion must be at most 50 characters"))]
    pub religion: Option<String>,

    #[validate(length(min = 1, message = "Profile image cannot be empty"))]
    pub profile_image: Option<String>,

    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub user_bio: Option<String>,

    #[serde(alias = "user_interest")]
    #[validate(length(max = 255, message = "Interests must be at most 255 characters"))]
    pub interests: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Education institutions must be between 1 and 100 characters"))]
    pub education_institutions: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Majors must be between 1 and 100 characters"))]
    pub education_majors: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Degrees must be between 1 and 100 characters"))]
    pub education_degrees: Option<String>,

    #[schema(example = "2026-06-01")]
    pub graduation_date: Option<String>,

    #[validate(custom(function = "validate_identification_option"))]
    #[schema(example = "student_card")]
    pub identification_option: Option<String>,

    #[validate(length(min = 1, message = "Identification material cannot be empty"))]
    pub identification_material: Option<String>,
}

fn validate_identification_option(value: &str) -> Result<(), ValidationError> {
    if IDENTIFICATION_OPTIONS.contains(&value) {
        return Ok(());
    }
    Err(ValidationError::new("identification_option").with_message(
        format!(
            "Identification option must be one of: {}",
            IDENTIFICATION_OPTIONS.join(", ")
        )
        .into(),
    ))
}
