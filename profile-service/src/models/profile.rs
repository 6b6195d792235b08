//! User profile model - one record per account.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored profile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserProfile {
    pub profile_id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub age: i32,
    pub date_of_birth: NaiveDate,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub province: String,
    pub country: String,
    pub postal_code: String,
    pub gender: String,
    pub religion: Option<String>,
    pub profile_image: Option<String>,
    pub user_bio: Option<String>,
    pub interests: Option<String>,
    pub education_institutions: String,
    pub education_majors: String,
    pub education_degrees: String,
    pub graduation_date: NaiveDate,
    pub identification_option: String,
    pub identification_material: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Validated, typed field values from a create or update request. Every field
/// is optional here; a create additionally requires the mandatory ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: AddressChanges,
    pub gender: Option<String>,
    pub religion: Option<String>,
    pub profile_image: Option<String>,
    pub user_bio: Option<String>,
    pub interests: Option<String>,
    pub education_institutions: Option<String>,
    pub education_majors: Option<String>,
    pub education_degrees: Option<String>,
    pub graduation_date: Option<NaiveDate>,
    pub identification_option: Option<String>,
    pub identification_material: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressChanges {
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
}

impl AddressChanges {
    pub fn is_empty(&self) -> bool {
        self == &AddressChanges::default()
    }
}

/// Structured postal address handed to the address verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostalAddress {
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub province: String,
    pub country: String,
    pub postal_code: String,
}

impl PostalAddress {
    /// Single-line form used as the geocoding query.
    pub fn one_line(&self) -> String {
        let mut parts: Vec<&str> = vec![self.address_line_1.as_str()];
        if let Some(line_2) = self.address_line_2.as_deref().filter(|s| !s.trim().is_empty()) {
            parts.push(line_2);
        }
        parts.extend([
            self.city.as_str(),
            self.province.as_str(),
            self.postal_code.as_str(),
            self.country.as_str(),
        ]);
        parts.join(", ")
    }
}

impl UserProfile {
    /// Build a new record from a validated create request. Returns `None` when a
    /// mandatory field is missing.
    pub fn from_changes(user_id: Uuid, changes: ProfileChanges) -> Option<Self> {
        let now = Utc::now();
        let address = changes.address;
        Some(Self {
            profile_id: Uuid::new_v4(),
            user_id,
            first_name: changes.first_name?,
            middle_name: changes.middle_name,
            last_name: changes.last_name?,
            age: changes.age?,
            date_of_birth: changes.date_of_birth?,
            address_line_1: address.address_line_1?,
            address_line_2: address.address_line_2,
            city: address.city?,
            province: address.province?,
            country: address.country?,
            postal_code: address.postal_code?,
            gender: changes.gender?,
            religion: changes.religion,
            profile_image: changes.profile_image,
            user_bio: changes.user_bio,
            interests: changes.interests,
            education_institutions: changes.education_institutions?,
            education_majors: changes.education_majors?,
            education_degrees: changes.education_degrees?,
            graduation_date: changes.graduation_date?,
            identification_option: changes.identification_option?,
            identification_material: changes.identification_material?,
            created_utc: now,
            updated_utc: now,
        })
    }

    pub fn address(&self) -> PostalAddress {
        PostalAddress {
            address_line_1: self.address_line_1.clone(),
            address_line_2: self.address_line_2.clone(),
            city: self.city.clone(),
            province: self.province.clone(),
            country: self.country.clone(),
            postal_code: self.postal_code.clone(),
        }
    }

    /// Address after applying `changes`; omitted sub-fields keep their stored
    /// values.
    pub fn address_with(&self, changes: &AddressChanges) -> PostalAddress {
        let stored = self.address();
        PostalAddress {
            address_line_1: changes
                .address_line_1
                .clone()
                .unwrap_or(stored.address_line_1),
            address_line_2: changes.address_line_2.clone().or(stored.address_line_2),
            city: changes.city.clone().unwrap_or(stored.city),
            province: changes.province.clone().unwrap_or(stored.province),
            country: changes.country.clone().unwrap_or(stored.country),
            postal_code: changes.postal_code.clone().unwrap_or(stored.postal_code),
        }
    }

    /// Overwrite the fields present in `changes`.
    pub fn apply(&mut self, changes: ProfileChanges) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }
        fn set_opt<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut self.first_name, changes.first_name);
        set_opt(&mut self.middle_name, changes.middle_name);
        set(&mut self.last_name, changes.last_name);
        set(&mut self.age, changes.age);
        set(&mut self.date_of_birth, changes.date_of_birth);
        set(&mut self.address_line_1, changes.address.address_line_1);
        set_opt(&mut self.address_line_2, changes.address.address_line_2);
        set(&mut self.city, changes.address.city);
        set(&mut self.province, changes.address.province);
        set(&mut self.country, changes.address.country);
        set(&mut self.postal_code, changes.address.postal_code);
        set(&mut self.gender, changes.gender);
        set_opt(&mut self.religion, changes.religion);
        set_opt(&mut self.profile_image, changes.profile_image);
        set_opt(&mut self.user_bio, changes.user_bio);
        set_opt(&mut self.interests, changes.interests);
        set(&mut self.education_institutions, changes.education_institutions);
        set(&mut self.education_majors, changes.education_majors);
        set(&mut self.education_degrees, changes.education_degrees);
        set(&mut self.graduation_date, changes.graduation_date);
        set(&mut self.identification_option, changes.identification_option);
        set(&mut self.identification_material, changes.identification_material);
        self.updated_utc = Utc::now();
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn complete_changes() -> ProfileChanges {
        ProfileChanges {
            first_name: Some("Ada".to_string()),
            middle_name: None,
            last_name: Some("Lovelace".to_string()),
            age: Some(21),
            date_of_birth: NaiveDate::from_ymd_opt(2003, 5, 14),
            address: AddressChanges {
                address_line_1: Some("100 Queen St W".to_string()),
                address_line_2: None,
                city: Some("Toronto".to_string()),
                province: Some("ON".to_string()),
                country: Some("Canada".to_string()),
                postal_code: Some("M5H 2N2".to_string()),
            },
            gender: Some("female".to_string()),
            religion: None,
            profile_image: None,
            user_bio: Some("Maths and machines".to_string()),
            interests: Some("analysis".to_string()),
            education_institutions: Some("University of Toronto".to_string()),
            education_majors: Some("Mathematics".to_string()),
            education_degrees: Some("BSc".to_string()),
            graduation_date: NaiveDate::from_ymd_opt(2026, 6, 1),
            identification_option: Some("student_card".to_string()),
            identification_material: Some("c3R1ZGVudC1jYXJk".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::complete_changes;
    use super::*;

    #[test]
    fn test_from_changes_requires_mandatory_fields() {
        let user_id = Uuid::new_v4();
        assert!(UserProfile::from_changes(user_id, complete_changes()).is_some());

        let mut missing_city = complete_changes();
        missing_city.address.city = None;
        assert!(UserProfile::from_changes(user_id, missing_city).is_none());
    }

    #[test]
    fn test_address_with_backfills_omitted_fields() {
        let profile = UserProfile::from_changes(Uuid::new_v4(), complete_changes()).unwrap();
        let changes = AddressChanges {
            postal_code: Some("M5V 3L9".to_string()),
            ..Default::default()
        };

        let merged = profile.address_with(&changes);
        assert_eq!(merged.postal_code, "M5V 3L9");
        assert_eq!(merged.address_line_1, "100 Queen St W");
        assert_eq!(merged.city, "Toronto");
        assert_eq!(merged.country, "Canada");
    }

    #[test]
    fn test_apply_only_touches_present_fields() {
        let mut profile = UserProfile::from_changes(Uuid::new_v4(), complete_changes()).unwrap();
        profile.apply(ProfileChanges {
            first_name: Some("Augusta".to_string()),
            ..Default::default()
        });

        assert_eq!(profile.first_name, "Augusta");
        assert_eq!(profile.last_name, "Lovelace");
        assert_eq!(profile.user_bio.as_deref(), Some("Maths and machines"));
    }

    #[test]
    fn test_one_line_skips_blank_second_line() {
        let mut address = UserProfile::from_changes(Uuid::new_v4(), complete_changes())
            .unwrap()
            .address();
        address.address_line_2 = Some("  ".to_string());
        assert_eq!(
            address.one_line(),
            "100 Queen St W, Toronto, ON, M5H 2N2, Canada"
        );
    }
}
