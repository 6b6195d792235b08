use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct StudyPreferencesRequest {
    #[validate(length(min = 1, max = 255, message = "Preferred subjects must be between 1 and 255 characters"))]
    #[schema(example = "linear algebra, statistics")]
    pub preferred_subjects: Option<String>,

    /// `in_person`, `online` or `hybrid`.
    #[schema(example = "hybrid")]
    pub study_mode: Option<String>,

    #[validate(range(min = 1, max = 10, message = "Group size must be between 1 and 10"))]
    #[schema(example = 4)]
    pub group_size: Option<i32>,

    #[validate(length(max = 255, message = "Availability must be at most 255 characters"))]
    pub availability: Option<String>,

    #[validate(length(max = 100, message = "Learning style must be at most 100 characters"))]
    pub learning_style: Option<String>,
}
