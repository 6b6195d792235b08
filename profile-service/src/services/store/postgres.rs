use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{ProfileStore, StoreError, StoreTx};
use crate::models::{PermissionGrant, StudyPreferences, UserProfile};

const PROFILE_COLUMNS: &str = "profile_id, user_id, first_name, middle_name, last_name, age, \
     date_of_birth, address_line_1, address_line_2, city, province, country, postal_code, \
     gender, religion, profile_image, user_bio, interests, education_institutions, \
     education_majors, education_degrees, graduation_date, identification_option, \
     identification_material, created_utc, updated_utc";

const PREFERENCE_COLUMNS: &str = "preference_id, user_id, preferred_subjects, study_mode, \
     group_size, availability, learning_style, created_utc, updated_utc";

/// PostgreSQL-backed store. Uniqueness of one profile per account is enforced
/// by the `user_information_user_id_key` constraint.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::db::health_check(&self.pool).await?;
        Ok(())
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(ref e) if e.is_unique_violation() => StoreError::UniqueViolation,
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn find_profile(&mut self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let sql = format!("SELECT {} FROM user_information WHERE user_id = $1", PROFILE_COLUMNS);
        let profile = sqlx::query_as::<_, UserProfile>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(profile)
    }

    async fn insert_profile(&mut self, profile: &UserProfile) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO user_information ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, \
              $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26)",
            PROFILE_COLUMNS
        );
        sqlx::query(&sql)
            .bind(profile.profile_id)
            .bind(profile.user_id)
            .bind(&profile.first_name)
            .bind(&profile.middle_name)
            .bind(&profile.last_name)
            .bind(profile.age)
            .bind(profile.date_of_birth)
            .bind(&profile.address_line_1)
            .bind(&profile.address_line_2)
            .bind(&profile.city)
            .bind(&profile.province)
            .bind(&profile.country)
            .bind(&profile.postal_code)
            .bind(&profile.gender)
            .bind(&profile.religion)
            .bind(&profile.profile_image)
            .bind(&profile.user_bio)
            .bind(&profile.interests)
            .bind(&profile.education_institutions)
            .bind(&profile.education_majors)
            .bind(&profile.education_degrees)
            .bind(profile.graduation_date)
            .bind(&profile.identification_option)
            .bind(&profile.identification_material)
            .bind(profile.created_utc)
            .bind(profile.updated_utc)
            .execute(&mut *self.tx)
            .await
            .map_err(map_insert_error)?;
        Ok(())
    }

    async fn update_profile(&mut self, profile: &UserProfile) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE user_information SET
                first_name = $2, middle_name = $3, last_name = $4, age = $5,
                date_of_birth = $6, address_line_1 = $7, address_line_2 = $8,
                city = $9, province = $10, country = $11, postal_code = $12,
                gender = $13, religion = $14, profile_image = $15, user_bio = $16,
                interests = $17, education_institutions = $18, education_majors = $19,
                education_degrees = $20, graduation_date = $21,
                identification_option = $22, identification_material = $23,
                updated_utc = $24
            WHERE user_id = $1
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.first_name)
        .bind(&profile.middle_name)
        .bind(&profile.last_name)
        .bind(profile.age)
        .bind(profile.date_of_birth)
        .bind(&profile.address_line_1)
        .bind(&profile.address_line_2)
        .bind(&profile.city)
        .bind(&profile.province)
        .bind(&profile.country)
        .bind(&profile.postal_code)
        .bind(&profile.gender)
        .bind(&profile.religion)
        .bind(&profile.profile_image)
        .bind(&profile.user_bio)
        .bind(&profile.interests)
        .bind(&profile.education_institutions)
        .bind(&profile.education_majors)
        .bind(&profile.education_degrees)
        .bind(profile.graduation_date)
        .bind(&profile.identification_option)
        .bind(&profile.identification_material)
        .bind(profile.updated_utc)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_profile(&mut self, user_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM user_information WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_study_preferences(
        &mut self,
        user_id: Uuid,
    ) -> Result<Option<StudyPreferences>, StoreError> {
        let sql = format!("SELECT {} FROM study_preferences WHERE user_id = $1", PREFERENCE_COLUMNS);
        let prefs = sqlx::query_as::<_, StudyPreferences>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(prefs)
    }

    async fn insert_study_preferences(&mut self, prefs: &StudyPreferences) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO study_preferences ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            PREFERENCE_COLUMNS
        );
        sqlx::query(&sql)
            .bind(prefs.preference_id)
            .bind(prefs.user_id)
            .bind(&prefs.preferred_subjects)
            .bind(&prefs.study_mode)
            .bind(prefs.group_size)
            .bind(&prefs.availability)
            .bind(&prefs.learning_style)
            .bind(prefs.created_utc)
            .bind(prefs.updated_utc)
            .execute(&mut *self.tx)
            .await
            .map_err(map_insert_error)?;
        Ok(())
    }

    async fn update_study_preferences(&mut self, prefs: &StudyPreferences) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE study_preferences SET
                preferred_subjects = $2, study_mode = $3, group_size = $4,
                availability = $5, learning_style = $6, updated_utc = $7
            WHERE user_id = $1
            "#,
        )
        .bind(prefs.user_id)
        .bind(&prefs.preferred_subjects)
        .bind(&prefs.study_mode)
        .bind(prefs.group_size)
        .bind(&prefs.availability)
        .bind(&prefs.learning_style)
        .bind(prefs.updated_utc)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_study_preferences(&mut self, user_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM study_preferences WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn has_grant(&mut self, user_id: Uuid, name: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM permissions WHERE user_id = $1 AND name = $2)",
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn insert_grant(&mut self, grant: &PermissionGrant) -> Result<bool, StoreError> {
        // A concurrent grant of the same capability is not an error.
        let result = sqlx::query(
            r#"
            INSERT INTO permissions (grant_id, user_id, name, created_utc)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, name) DO NOTHING
            "#,
        )
        .bind(grant.grant_id)
        .bind(grant.user_id)
        .bind(&grant.name)
        .bind(grant.created_utc)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_grants(&mut self, user_id: Uuid) -> Result<Vec<PermissionGrant>, StoreError> {
        let grants = sqlx::query_as::<_, PermissionGrant>(
            "SELECT grant_id, user_id, name, created_utc FROM permissions \
             WHERE user_id = $1 ORDER BY created_utc, name",
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(grants)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
