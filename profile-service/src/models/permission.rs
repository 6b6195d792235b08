//! Permission grant rows held by the ledger.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Capability;

/// A capability granted to one account. `(user_id, name)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PermissionGrant {
    pub grant_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_utc: DateTime<Utc>,
}

impl PermissionGrant {
    pub fn new(user_id: Uuid, capability: Capability) -> Self {
        Self {
            grant_id: Uuid::new_v4(),
            user_id,
            name: capability.as_str().to_string(),
            created_utc: Utc::now(),
        }
    }

    /// `None` for tags this build does not know about.
    pub fn capability(&self) -> Option<Capability> {
        Capability::parse(&self.name)
    }
}
