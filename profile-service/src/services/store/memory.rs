use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{ProfileStore, StoreError, StoreTx};
use crate::models::{PermissionGrant, StudyPreferences, UserProfile};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    profiles: HashMap<Uuid, UserProfile>,
    preferences: HashMap<Uuid, StudyPreferences>,
    grants: Vec<PermissionGrant>,
}

/// In-process store with serializable transactions: a transaction holds the
/// whole state lock and works on a private copy until commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_next_commit: Arc<AtomicBool>,
    miss_next_lookup: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail after all writes have been staged.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Make the next profile or study-preferences lookup report nothing,
    /// so the following insert runs into the uniqueness constraint.
    pub fn miss_next_lookup(&self) {
        self.miss_next_lookup.store(true, Ordering::SeqCst);
    }

    pub async fn profile_count(&self) -> usize {
        self.state.lock().await.profiles.len()
    }

    pub async fn grants_for(&self, user_id: Uuid) -> Vec<PermissionGrant> {
        self.state
            .lock()
            .await
            .grants
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            working,
            fail_commit: self.fail_next_commit.clone(),
            miss_lookup: self.miss_next_lookup.clone(),
        }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_commit: Arc<AtomicBool>,
    miss_lookup: Arc<AtomicBool>,
}

impl MemoryTx {
    fn missed(&self) -> bool {
        self.miss_lookup.swap(false, Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn find_profile(&mut self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        if self.missed() {
            return Ok(None);
        }
        Ok(self.working.profiles.get(&user_id).cloned())
    }

    async fn insert_profile(&mut self, profile: &UserProfile) -> Result<(), StoreError> {
        if self.working.profiles.contains_key(&profile.user_id) {
            return Err(StoreError::UniqueViolation);
        }
        self.working.profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn update_profile(&mut self, profile: &UserProfile) -> Result<(), StoreError> {
        if let Some(slot) = self.working.profiles.get_mut(&profile.user_id) {
            *slot = profile.clone();
        }
        Ok(())
    }

    async fn delete_profile(&mut self, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.working.profiles.remove(&user_id).is_some())
    }

    async fn find_study_preferences(
        &mut self,
        user_id: Uuid,
    ) -> Result<Option<StudyPreferences>, StoreError> {
        if self.missed() {
            return Ok(None);
        }
        Ok(self.working.preferences.get(&user_id).cloned())
    }

    async fn insert_study_preferences(&mut self, prefs: &StudyPreferences) -> Result<(), StoreError> {
        if self.working.preferences.contains_key(&prefs.user_id) {
            return Err(StoreError::UniqueViolation);
        }
        self.working.preferences.insert(prefs.user_id, prefs.clone());
        Ok(())
    }

    async fn update_study_preferences(&mut self, prefs: &StudyPreferences) -> Result<(), StoreError> {
        if let Some(slot) = self.working.preferences.get_mut(&prefs.user_id) {
            *slot = prefs.clone();
        }
        Ok(())
    }

    async fn delete_study_preferences(&mut self, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.working.preferences.remove(&user_id).is_some())
    }

    async fn has_grant(&mut self, user_id: Uuid, name: &str) -> Result<bool, StoreError> {
        Ok(self
            .working
            .grants
            .iter()
            .any(|g| g.user_id == user_id && g.name == name))
    }

    async fn insert_grant(&mut self, grant: &PermissionGrant) -> Result<bool, StoreError> {
        if self.has_grant(grant.user_id, &grant.name).await? {
            return Ok(false);
        }
        self.working.grants.push(grant.clone());
        Ok(true)
    }

    async fn list_grants(&mut self, user_id: Uuid) -> Result<Vec<PermissionGrant>, StoreError> {
        Ok(self
            .working
            .grants
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTx {
            mut guard,
            working,
            fail_commit,
            ..
        } = *self;
        if fail_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Other(anyhow::anyhow!("injected commit failure")));
        }
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::fixtures::complete_changes;
    use crate::models::Capability;

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let store = InMemoryStore::new();
        let profile = UserProfile::from_changes(Uuid::new_v4(), complete_changes()).unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_profile(&profile).await.unwrap();
        drop(tx);
        assert_eq!(store.profile_count().await, 0);

        let mut tx = store.begin().await.unwrap();
        tx.insert_profile(&profile).await.unwrap();
        tx.rollback().await.unwrap();
        assert_eq!(store.profile_count().await, 0);

        let mut tx = store.begin().await.unwrap();
        tx.insert_profile(&profile).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.profile_count().await, 1);
    }

    #[tokio::test]
    async fn test_second_profile_for_same_user_is_unique_violation() {
        let store = InMemoryStore::new();
        let user_id = Uuid::new_v4();

        let mut tx = store.begin().await.unwrap();
        tx.insert_profile(&UserProfile::from_changes(user_id, complete_changes()).unwrap())
            .await
            .unwrap();
        let second = UserProfile::from_changes(user_id, complete_changes()).unwrap();
        assert!(matches!(
            tx.insert_profile(&second).await,
            Err(StoreError::UniqueViolation)
        ));
    }

    #[tokio::test]
    async fn test_missed_lookup_is_one_shot() {
        let store = InMemoryStore::new();
        let profile = UserProfile::from_changes(Uuid::new_v4(), complete_changes()).unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_profile(&profile).await.unwrap();
        tx.commit().await.unwrap();

        store.miss_next_lookup();
        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_profile(profile.user_id).await.unwrap().is_none());
        assert!(tx.find_profile(profile.user_id).await.unwrap().is_some());
        assert!(matches!(
            tx.insert_profile(&profile).await,
            Err(StoreError::UniqueViolation)
        ));
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_state_untouched() {
        let store = InMemoryStore::new();
        let user_id = Uuid::new_v4();
        store.fail_next_commit();

        let mut tx = store.begin().await.unwrap();
        tx.insert_grant(&PermissionGrant::new(user_id, Capability::CanViewStudyPreferences))
            .await
            .unwrap();
        assert!(tx.commit().await.is_err());
        assert!(store.grants_for(user_id).await.is_empty());

        // The failure is one-shot.
        let mut tx = store.begin().await.unwrap();
        tx.insert_grant(&PermissionGrant::new(user_id, Capability::CanViewStudyPreferences))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.grants_for(user_id).await.len(), 1);
    }
}
