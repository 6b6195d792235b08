//! Study preferences model - one record per account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// How a student prefers to meet study partners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StudyMode {
    InPerson,
    Online,
    Hybrid,
}

impl StudyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyMode::InPerson => "in_person",
            StudyMode::Online => "online",
            StudyMode::Hybrid => "hybrid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_person" => Some(StudyMode::InPerson),
            "online" => Some(StudyMode::Online),
            "hybrid" => Some(StudyMode::Hybrid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudyPreferences {
    pub preference_id: Uuid,
    pub user_id: Uuid,
    pub preferred_subjects: String,
    /// One of `in_person`, `online`, `hybrid`.
    pub study_mode: String,
    pub group_size: i32,
    pub availability: Option<String>,
    pub learning_style: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudyPreferenceChanges {
    pub preferred_subjects: Option<String>,
    pub study_mode: Option<StudyMode>,
    pub group_size: Option<i32>,
    pub availability: Option<String>,
    pub learning_style: Option<String>,
}

impl StudyPreferences {
    pub fn from_changes(user_id: Uuid, changes: StudyPreferenceChanges) -> Option<Self> {
        let now = Utc::now();
        Some(Self {
            preference_id: Uuid::new_v4(),
            user_id,
            preferred_subjects: changes.preferred_subjects?,
            study_mode: changes.study_mode?.as_str().to_string(),
            group_size: changes.group_size?,
            availability: changes.availability,
            learning_style: changes.learning_style,
            created_utc: now,
            updated_utc: now,
        })
    }

    pub fn apply(&mut self, changes: StudyPreferenceChanges) {
        if let Some(subjects) = changes.preferred_subjects {
            self.preferred_subjects = subjects;
        }
        if let Some(mode) = changes.study_mode {
            self.study_mode = mode.as_str().to_string();
        }
        if let Some(size) = changes.group_size {
            self.group_size = size;
        }
        if changes.availability.is_some() {
            self.availability = changes.availability;
        }
        if changes.learning_style.is_some() {
            self.learning_style = changes.learning_style;
        }
        self.updated_utc = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_study_mode_round_trips_through_str() {
        for mode in [StudyMode::InPerson, StudyMode::Online, StudyMode::Hybrid] {
            assert_eq!(StudyMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(StudyMode::parse("telepathy"), None);
    }

    #[test]
    fn test_apply_keeps_omitted_fields() {
        let mut prefs = StudyPreferences::from_changes(
            Uuid::new_v4(),
            StudyPreferenceChanges {
                preferred_subjects: Some("calculus".to_string()),
                study_mode: Some(StudyMode::Online),
                group_size: Some(3),
                availability: Some("weekday evenings".to_string()),
                learning_style: None,
            },
        )
        .unwrap();

        prefs.apply(StudyPreferenceChanges {
            group_size: Some(5),
            ..Default::default()
        });

        assert_eq!(prefs.group_size, 5);
        assert_eq!(prefs.study_mode, "online");
        assert_eq!(prefs.availability.as_deref(), Some("weekday evenings"));
    }
}
