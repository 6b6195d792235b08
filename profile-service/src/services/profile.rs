//! Profile transaction coordinator.
//!
//! Each write runs validate, verify address, check existence, mutate, commit in
//! that order. Storage failures roll the transaction back before the error is
//! returned, so a failed request never leaves a partial write behind.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::address::{is_valid_address, AddressVerifier};
use super::error::ProfileError;
use super::jwt::{Credential, Principal, TokenService};
use super::ledger;
use super::metrics;
use super::store::{ProfileStore, StoreError, StoreTx};
use crate::dtos::profile::ProfileRequest;
use crate::models::{UserProfile, PROFILE_COMPLETION_GRANTS};
use crate::utils::{check_graduation_after_birth, validate_profile, ErrorSet, ValidationMode};

pub const PROFILE_EXISTS: &str = "User information already exists";
pub const PROFILE_NOT_FOUND: &str = "User information not found";

/// Outcome of a successful create: the stored record plus a credential whose
/// permission snapshot includes the capabilities granted by the create.
#[derive(Debug, Clone)]
pub struct ProfileCreated {
    pub profile: UserProfile,
    pub credential: Credential,
}

#[derive(Clone)]
pub struct ProfileCoordinator {
    store: Arc<dyn ProfileStore>,
    address_verifier: Arc<dyn AddressVerifier>,
    tokens: TokenService,
}

/// Commit `tx` when `result` is a success, roll it back otherwise.
pub(crate) async fn finish<T>(
    tx: Box<dyn StoreTx>,
    result: Result<T, ProfileError>,
) -> Result<T, ProfileError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}

pub(crate) fn record<T>(operation: &str, result: &Result<T, ProfileError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => e.outcome(),
    };
    metrics::record_operation(operation, outcome);
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl ProfileCoordinator {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        address_verifier: Arc<dyn AddressVerifier>,
        tokens: TokenService,
    ) -> Self {
        Self {
            store,
            address_verifier,
            tokens,
        }
    }

    #[tracing::instrument(skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn get(&self, principal: &Principal) -> Result<UserProfile, ProfileError> {
        let result = async {
            let mut tx = self.store.begin().await?;
            let found = tx.find_profile(principal.user_id).await.map_err(ProfileError::from);
            let profile = finish(tx, found).await?;
            profile.ok_or(ProfileError::NotFound(PROFILE_NOT_FOUND))
        }
        .await;
        record("get_profile", &result);
        result
    }

    #[tracing::instrument(skip(self, principal, request), fields(user_id = %principal.user_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        request: &ProfileRequest,
    ) -> Result<ProfileCreated, ProfileError> {
        let result = self.create_inner(principal, request).await;
        record("create_profile", &result);
        result
    }

    async fn create_inner(
        &self,
        principal: &Principal,
        request: &ProfileRequest,
    ) -> Result<ProfileCreated, ProfileError> {
        let user_id = principal.user_id;

        let changes =
            validate_profile(request, ValidationMode::Create, today()).map_err(ProfileError::Invalid)?;
        let profile = UserProfile::from_changes(user_id, changes).ok_or_else(|| {
            ProfileError::Internal(anyhow::anyhow!("validated profile is missing a mandatory field"))
        })?;

        let mut errors = ErrorSet::new();
        if !is_valid_address(self.address_verifier.as_ref(), &profile.address(), &mut errors).await {
            return Err(ProfileError::Invalid(errors));
        }

        let mut tx = self.store.begin().await?;
        let written = insert_and_grant(tx.as_mut(), &profile).await;
        let grants = finish(tx, written).await?;

        // Prior snapshot plus everything the ledger now holds.
        let permissions: BTreeSet<String> = principal
            .claims
            .permissions
            .iter()
            .cloned()
            .chain(grants)
            .collect();

        let credential = self
            .tokens
            .issue_default(user_id, permissions, Some(profile.profile_id))?;

        tracing::info!(profile_id = %profile.profile_id, "Profile created");

        Ok(ProfileCreated {
            profile,
            credential,
        })
    }

    #[tracing::instrument(skip(self, principal, request), fields(user_id = %principal.user_id))]
    pub async fn update(
        &self,
        principal: &Principal,
        request: &ProfileRequest,
    ) -> Result<UserProfile, ProfileError> {
        let result = self.update_inner(principal, request).await;
        record("update_profile", &result);
        result
    }

    async fn update_inner(
        &self,
        principal: &Principal,
        request: &ProfileRequest,
    ) -> Result<UserProfile, ProfileError> {
        let user_id = principal.user_id;

        let changes =
            validate_profile(request, ValidationMode::Update, today()).map_err(ProfileError::Invalid)?;

        // The stored record supplies whatever the request omits, so the
        // cross-field rules run against the record as it will be saved.
        let stored = self.load(user_id).await?;
        let mut errors = ErrorSet::new();
        check_graduation_after_birth(
            changes.date_of_birth.unwrap_or(stored.date_of_birth),
            changes.graduation_date.unwrap_or(stored.graduation_date),
            &mut errors,
        );
        if !errors.is_empty() {
            return Err(ProfileError::Invalid(errors));
        }

        if !changes.address.is_empty() {
            let merged = stored.address_with(&changes.address);
            if !is_valid_address(self.address_verifier.as_ref(), &merged, &mut errors).await {
                return Err(ProfileError::Invalid(errors));
            }
        }

        let mut tx = self.store.begin().await?;
        let written = async {
            let mut current = tx
                .find_profile(user_id)
                .await?
                .ok_or(ProfileError::NotFound(PROFILE_NOT_FOUND))?;
            current.apply(changes);
            tx.update_profile(&current).await?;
            Ok::<_, ProfileError>(current)
        }
        .await;
        let updated = finish(tx, written).await?;

        tracing::info!(profile_id = %updated.profile_id, "Profile updated");
        Ok(updated)
    }

    #[tracing::instrument(skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn delete(&self, principal: &Principal) -> Result<(), ProfileError> {
        let user_id = principal.user_id;
        let result = async {
            let mut tx = self.store.begin().await?;
            let deleted = async {
                if tx.find_profile(user_id).await?.is_none() {
                    return Err(ProfileError::NotFound(PROFILE_NOT_FOUND));
                }
                tx.delete_profile(user_id).await?;
                Ok(())
            }
            .await;
            finish(tx, deleted).await
        }
        .await;

        if result.is_ok() {
            tracing::info!("Profile deleted");
        }
        record("delete_profile", &result);
        result
    }

    async fn load(&self, user_id: Uuid) -> Result<UserProfile, ProfileError> {
        let mut tx = self.store.begin().await?;
        let found = tx.find_profile(user_id).await.map_err(ProfileError::from);
        finish(tx, found)
            .await?
            .ok_or(ProfileError::NotFound(PROFILE_NOT_FOUND))
    }
}

/// Insert `profile` and grant the completion capabilities. Returns the tags
/// the account holds afterwards.
async fn insert_and_grant(
    tx: &mut dyn StoreTx,
    profile: &UserProfile,
) -> Result<Vec<String>, ProfileError> {
    if tx.find_profile(profile.user_id).await?.is_some() {
        return Err(ProfileError::Conflict(PROFILE_EXISTS));
    }

    // The pre-check above is only a shortcut; the uniqueness constraint is
    // what rejects a concurrent duplicate.
    tx.insert_profile(profile).await.map_err(|e| match e {
        StoreError::UniqueViolation => ProfileError::Conflict(PROFILE_EXISTS),
        other => ProfileError::Store(other),
    })?;

    ledger::grant_all(tx, profile.user_id, &PROFILE_COMPLETION_GRANTS).await?;
    Ok(ledger::held(tx, profile.user_id).await?)
}
