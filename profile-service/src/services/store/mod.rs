//! Transactional storage for profiles, study preferences and permission grants.
//!
//! Every mutation happens inside a [`StoreTx`]. Dropping a transaction without
//! calling [`StoreTx::commit`] discards all of its writes.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{PermissionGrant, StudyPreferences, UserProfile};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("record already exists")]
    UniqueViolation,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage error: {0}")]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;
    async fn health_check(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait StoreTx: Send {
    async fn find_profile(&mut self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError>;
    /// Fails with [`StoreError::UniqueViolation`] when the account already has
    /// a profile.
    async fn insert_profile(&mut self, profile: &UserProfile) -> Result<(), StoreError>;
    async fn update_profile(&mut self, profile: &UserProfile) -> Result<(), StoreError>;
    /// Returns whether a row was removed.
    async fn delete_profile(&mut self, user_id: Uuid) -> Result<bool, StoreError>;

    async fn find_study_preferences(
        &mut self,
        user_id: Uuid,
    ) -> Result<Option<StudyPreferences>, StoreError>;
    async fn insert_study_preferences(&mut self, prefs: &StudyPreferences) -> Result<(), StoreError>;
    async fn update_study_preferences(&mut self, prefs: &StudyPreferences) -> Result<(), StoreError>;
    async fn delete_study_preferences(&mut self, user_id: Uuid) -> Result<bool, StoreError>;

    async fn has_grant(&mut self, user_id: Uuid, name: &str) -> Result<bool, StoreError>;
    /// Returns `false` when an identical grant already existed.
    async fn insert_grant(&mut self, grant: &PermissionGrant) -> Result<bool, StoreError>;
    async fn list_grants(&mut self, user_id: Uuid) -> Result<Vec<PermissionGrant>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
