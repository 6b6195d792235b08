//! Field-level validation for profile and study-preference bodies.
//!
//! Validation never short-circuits: every failing field is reported in one
//! [`ErrorSet`] so the client can correct everything in a single round trip.

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use validator::{Validate, ValidationErrors};

use crate::dtos::profile::ProfileRequest;
use crate::dtos::study_preferences::StudyPreferencesRequest;
use crate::models::{AddressChanges, ProfileChanges, StudyMode, StudyPreferenceChanges};

/// Youngest age accepted on a profile.
pub const MIN_AGE: i32 = 18;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const EARLIEST_GRADUATION: (i32, u32, u32) = (1950, 1, 1);
const GRADUATION_HORIZON_MONTHS: u32 = 12 * 10;

/// Accumulated field-level failures for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSet(BTreeMap<String, String>);

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. The first reason reported for a field wins.
    pub fn add(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| reason.into());
    }

    pub fn extend_from_validator(&mut self, errors: &ValidationErrors) {
        for (field, field_errors) in errors.field_errors() {
            if let Some(first) = field_errors.first() {
                let reason = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                self.add(field.to_string(), reason);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(|s| s.as_str())
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// Create requests must carry every mandatory field; updates may carry any
/// subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Update,
}

/// Validate a profile body and convert it into typed changes.
pub fn validate_profile(
    req: &ProfileRequest,
    mode: ValidationMode,
    today: NaiveDate,
) -> Result<ProfileChanges, ErrorSet> {
    let mut errors = ErrorSet::new();

    let text_fields: [(&str, &Option<String>, &str); 15] = [
        ("first_name", &req.first_name, "First name is required"),
        ("last_name", &req.last_name, "Last name is required"),
        ("date_of_birth", &req.date_of_birth, "Birthday is required and the format must be YYYY-MM-DD"),
        ("address_line_1", &req.address_line_1, "First address is required"),
        ("city", &req.city, "City is required"),
        ("province", &req.province, "Province is required"),
        ("country", &req.country, "Country is required"),
        ("postal_code", &req.postal_code, "Postal Code is required and maximum of 10 characters long"),
        ("gender", &req.gender, "Gender is required"),
        ("education_institutions", &req.education_institutions, "University is required"),
        ("education_majors", &req.education_majors, "Majors are required"),
        ("education_degrees", &req.education_degrees, "Degrees are required"),
        ("graduation_date", &req.graduation_date, "Graduation Day is required"),
        ("identification_option", &req.identification_option, "Identification option is required"),
        ("identification_material", &req.identification_material, "Identification material is required"),
    ];

    for (field, value, required_message) in text_fields {
        match value.as_deref() {
            None if mode == ValidationMode::Create => errors.add(field, required_message),
            Some(v) if v.trim().is_empty() => errors.add(field, required_message),
            _ => {}
        }
    }

    if mode == ValidationMode::Create && req.age.is_none() {
        errors.add("age", format!("Age is required and must be at least {}", MIN_AGE));
    }

    if let Err(e) = req.validate() {
        errors.extend_from_validator(&e);
    }

    let date_of_birth = parse_date(&mut errors, "date_of_birth", req.date_of_birth.as_deref());
    if let Some(dob) = date_of_birth {
        if dob > today {
            errors.add("date_of_birth", "Birthday cannot be in the future");
        }
    }

    let graduation_date = parse_date(&mut errors, "graduation_date", req.graduation_date.as_deref());
    if let Some(graduation) = graduation_date {
        let earliest = NaiveDate::from_ymd_opt(
            EARLIEST_GRADUATION.0,
            EARLIEST_GRADUATION.1,
            EARLIEST_GRADUATION.2,
        )
        .unwrap_or(NaiveDate::MIN);
        let latest = today
            .checked_add_months(Months::new(GRADUATION_HORIZON_MONTHS))
            .unwrap_or(NaiveDate::MAX);

        if graduation < earliest || graduation > latest {
            errors.add(
                "graduation_date",
                format!(
                    "Graduation date must be between {} and {}",
                    earliest.format(DATE_FORMAT),
                    latest.format(DATE_FORMAT)
                ),
            );
        } else if let Some(dob) = date_of_birth {
            check_graduation_after_birth(dob, graduation, &mut errors);
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ProfileChanges {
        first_name: req.first_name.clone(),
        middle_name: req.middle_name.clone(),
        last_name: req.last_name.clone(),
        age: req.age,
        date_of_birth,
        address: AddressChanges {
            address_line_1: req.address_line_1.clone(),
            address_line_2: req.address_line_2.clone(),
            city: req.city.clone(),
            province: req.province.clone(),
            country: req.country.clone(),
            postal_code: req.postal_code.clone(),
        },
        gender: req.gender.clone(),
        religion: req.religion.clone(),
        profile_image: req.profile_image.clone(),
        user_bio: req.user_bio.clone(),
        interests: req.interests.clone(),
        education_institutions: req.education_institutions.clone(),
        education_majors: req.education_majors.clone(),
        education_degrees: req.education_degrees.clone(),
        graduation_date,
        identification_option: req.identification_option.clone(),
        identification_material: req.identification_material.clone(),
    })
}

/// Graduation must fall strictly after the birth date. Called again on update
/// once the stored record fills in whichever date the request omitted.
pub fn check_graduation_after_birth(
    date_of_birth: NaiveDate,
    graduation_date: NaiveDate,
    errors: &mut ErrorSet,
) {
    if graduation_date <= date_of_birth {
        errors.add("graduation_date", "Graduation date must be after the birth date");
    }
}

/// Validate a study-preferences body and convert it into typed changes.
pub fn validate_study_preferences(
    req: &StudyPreferencesRequest,
    mode: ValidationMode,
) -> Result<StudyPreferenceChanges, ErrorSet> {
    let mut errors = ErrorSet::new();

    if mode == ValidationMode::Create {
        if req.preferred_subjects.is_none() {
            errors.add("preferred_subjects", "Preferred subjects are required");
        }
        if req.study_mode.is_none() {
            errors.add("study_mode", "Study mode is required");
        }
        if req.group_size.is_none() {
            errors.add("group_size", "Group size is required");
        }
    }

    if let Err(e) = req.validate() {
        errors.extend_from_validator(&e);
    }

    let study_mode = match req.study_mode.as_deref() {
        None => None,
        Some(raw) => {
            let parsed = StudyMode::parse(raw);
            if parsed.is_none() {
                errors.add(
                    "study_mode",
                    "Study mode must be one of: in_person, online, hybrid",
                );
            }
            parsed
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(StudyPreferenceChanges {
        preferred_subjects: req.preferred_subjects.clone(),
        study_mode,
        group_size: req.group_size,
        availability: req.availability.clone(),
        learning_style: req.learning_style.clone(),
    })
}

fn parse_date(errors: &mut ErrorSet, field: &str, raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, format!("{} must be a valid date in the format YYYY-MM-DD", field));
            None
        }
    }
}
