//! Permission ledger: the durable record of which capabilities an account
//! holds. Grants are only ever added, and adding one that already exists is a
//! no-op.

use uuid::Uuid;

use super::store::{StoreError, StoreTx};
use crate::models::{Capability, PermissionGrant};

/// Record `capability` for `user_id` unless it is already held. Returns
/// whether a new grant was written. Runs inside the caller's transaction so a
/// storage failure aborts the enclosing write.
pub async fn grant_if_absent(
    tx: &mut dyn StoreTx,
    user_id: Uuid,
    capability: Capability,
) -> Result<bool, StoreError> {
    if tx.has_grant(user_id, capability.as_str()).await? {
        tracing::debug!(%user_id, capability = %capability, "Grant already held");
        return Ok(false);
    }

    let inserted = tx
        .insert_grant(&PermissionGrant::new(user_id, capability))
        .await?;
    if inserted {
        tracing::info!(%user_id, capability = %capability, "Capability granted");
    }
    Ok(inserted)
}

/// Grant each of `capabilities` in order. Returns how many were new.
pub async fn grant_all(
    tx: &mut dyn StoreTx,
    user_id: Uuid,
    capabilities: &[Capability],
) -> Result<usize, StoreError> {
    let mut granted = 0;
    for capability in capabilities {
        if grant_if_absent(tx, user_id, *capability).await? {
            granted += 1;
        }
    }
    Ok(granted)
}

/// Capability tags currently held by `user_id`.
pub async fn held(tx: &mut dyn StoreTx, user_id: Uuid) -> Result<Vec<String>, StoreError> {
    Ok(tx
        .list_grants(user_id)
        .await?
        .into_iter()
        .map(|g| g.name)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PROFILE_COMPLETION_GRANTS;
    use crate::services::store::{InMemoryStore, ProfileStore};

    #[tokio::test]
    async fn test_grant_if_absent_is_idempotent() {
        let store = InMemoryStore::new();
        let user_id = Uuid::new_v4();

        for attempt in 0..3 {
            let mut tx = store.begin().await.unwrap();
            let inserted = grant_if_absent(tx.as_mut(), user_id, Capability::CanViewStudyPreferences)
                .await
                .unwrap();
            assert_eq!(inserted, attempt == 0);
            tx.commit().await.unwrap();
        }

        assert_eq!(store.grants_for(user_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_grant_all_only_counts_new_grants() {
        let store = InMemoryStore::new();
        let user_id = Uuid::new_v4();
        let mut tx = store.begin().await.unwrap();

        grant_if_absent(tx.as_mut(), user_id, Capability::CanChangeStudyPreferences)
            .await
            .unwrap();
        let granted = grant_all(tx.as_mut(), user_id, &PROFILE_COMPLETION_GRANTS)
            .await
            .unwrap();
        assert_eq!(granted, 3);

        let mut names = held(tx.as_mut(), user_id).await.unwrap();
        names.sort();
        let mut expected: Vec<String> = PROFILE_COMPLETION_GRANTS
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        expected.sort();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_grants_are_scoped_per_user() {
        let store = InMemoryStore::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut tx = store.begin().await.unwrap();

        grant_if_absent(tx.as_mut(), alice, Capability::CanViewStudyPreferences)
            .await
            .unwrap();
        assert!(grant_if_absent(tx.as_mut(), bob, Capability::CanViewStudyPreferences)
            .await
            .unwrap());
        assert_eq!(held(tx.as_mut(), alice).await.unwrap().len(), 1);
    }
}
