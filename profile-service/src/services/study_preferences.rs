use std::sync::Arc;

use super::error::ProfileError;
use super::jwt::Principal;
use super::profile::{finish, record};
use super::store::{ProfileStore, StoreError};
use crate::dtos::study_preferences::StudyPreferencesRequest;
use crate::models::StudyPreferences;
use crate::utils::{validate_study_preferences, ValidationMode};

pub const PREFERENCES_EXIST: &str = "Study preferences already exist";
pub const PREFERENCES_NOT_FOUND: &str = "Study preferences not found";

/// Coordinates reads and writes of the per-account study preferences. Follows
/// the same validate, check existence, mutate, commit protocol as profiles.
#[derive(Clone)]
pub struct StudyPreferencesCoordinator {
    store: Arc<dyn ProfileStore>,
}

impl StudyPreferencesCoordinator {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn get(&self, principal: &Principal) -> Result<StudyPreferences, ProfileError> {
        let result = async {
            let mut tx = self.store.begin().await?;
            let found = tx
                .find_study_preferences(principal.user_id)
                .await
                .map_err(ProfileError::from);
            finish(tx, found)
                .await?
                .ok_or(ProfileError::NotFound(PREFERENCES_NOT_FOUND))
        }
        .await;
        record("get_study_preferences", &result);
        result
    }

    #[tracing::instrument(skip(self, principal, request), fields(user_id = %principal.user_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        request: &StudyPreferencesRequest,
    ) -> Result<StudyPreferences, ProfileError> {
        let result = async {
            let changes = validate_study_preferences(request, ValidationMode::Create)
                .map_err(ProfileError::Invalid)?;
            let prefs = StudyPreferences::from_changes(principal.user_id, changes).ok_or_else(|| {
                ProfileError::Internal(anyhow::anyhow!(
                    "validated study preferences are missing a mandatory field"
                ))
            })?;

            let mut tx = self.store.begin().await?;
            let written = async {
                if tx.find_study_preferences(prefs.user_id).await?.is_some() {
                    return Err(ProfileError::Conflict(PREFERENCES_EXIST));
                }
                tx.insert_study_preferences(&prefs)
                    .await
                    .map_err(|e| match e {
                        StoreError::UniqueViolation => ProfileError::Conflict(PREFERENCES_EXIST),
                        other => ProfileError::Store(other),
                    })?;
                Ok(())
            }
            .await;
            finish(tx, written).await?;

            tracing::info!(preference_id = %prefs.preference_id, "Study preferences created");
            Ok::<_, ProfileError>(prefs)
        }
        .await;
        record("create_study_preferences", &result);
        result
    }

    #[tracing::instrument(skip(self, principal, request), fields(user_id = %principal.user_id))]
    pub async fn update(
        &self,
        principal: &Principal,
        request: &StudyPreferencesRequest,
    ) -> Result<StudyPreferences, ProfileError> {
        let result = async {
            let changes = validate_study_preferences(request, ValidationMode::Update)
                .map_err(ProfileError::Invalid)?;

            let mut tx = self.store.begin().await?;
            let written = async {
                let mut current = tx
                    .find_study_preferences(principal.user_id)
                    .await?
                    .ok_or(ProfileError::NotFound(PREFERENCES_NOT_FOUND))?;
                current.apply(changes);
                tx.update_study_preferences(&current).await?;
                Ok::<_, ProfileError>(current)
            }
            .await;
            finish(tx, written).await
        }
        .await;
        record("update_study_preferences", &result);
        result
    }

    #[tracing::instrument(skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn delete(&self, principal: &Principal) -> Result<(), ProfileError> {
        let result = async {
            let mut tx = self.store.begin().await?;
            let deleted = async {
                if !tx.delete_study_preferences(principal.user_id).await? {
                    return Err(ProfileError::NotFound(PREFERENCES_NOT_FOUND));
                }
                Ok(())
            }
            .await;
            finish(tx, deleted).await
        }
        .await;
        record("delete_study_preferences", &result);
        result
    }
}
