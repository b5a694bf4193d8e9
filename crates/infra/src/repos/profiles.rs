use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::db::Db;
use crate::models::ProfileRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfile {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Clone)]
pub struct ProfileRepo {
    pool: Db,
}

impl ProfileRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    /// Create an account row. Email uniqueness is enforced by the DB.
    pub async fn create(&self, data: CreateProfile) -> SqlxResult<ProfileRow> {
        sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO profiles (email, password_hash, name)
            VALUES (LOWER($1), $2, $3)
            RETURNING id, email, password_hash, name, bio, phone, birth_date,
                      city, state, avatar_url, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.name)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get(&self, id: Uuid) -> SqlxResult<Option<ProfileRow>> {
        sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, email, password_hash, name, bio, phone, birth_date,
                   city, state, avatar_url, created_at, updated_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_by_email(&self, email: &str) -> SqlxResult<Option<ProfileRow>> {
        sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, email, password_hash, name, bio, phone, birth_date,
                   city, state, avatar_url, created_at, updated_at
            FROM profiles
            WHERE email = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// Batch lookup for dataloaders.
    pub async fn get_many(&self, ids: &[Uuid]) -> SqlxResult<Vec<ProfileRow>> {
        sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, email, password_hash, name, bio, phone, birth_date,
                   city, state, avatar_url, created_at, updated_at
            FROM profiles
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
    }

    /// Partial update; absent fields keep their current value.
    pub async fn update(&self, id: Uuid, data: UpdateProfile) -> SqlxResult<Option<ProfileRow>> {
        sqlx::query_as::<_, ProfileRow>(
            r#"
            UPDATE profiles
            SET name = COALESCE($2, name),
                bio = COALESCE($3, bio),
                phone = COALESCE($4, phone),
                birth_date = COALESCE($5, birth_date),
                city = COALESCE($6, city),
                state = COALESCE($7, state),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, name, bio, phone, birth_date,
                      city, state, avatar_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.bio)
        .bind(data.phone)
        .bind(data.birth_date)
        .bind(data.city)
        .bind(data.state)
        .fetch_optional(&self.pool)
        .await
    }

    /// NULL clears the avatar.
    pub async fn set_avatar_url(
        &self,
        id: Uuid,
        avatar_url: Option<&str>,
    ) -> SqlxResult<Option<ProfileRow>> {
        sqlx::query_as::<_, ProfileRow>(
            r#"
            UPDATE profiles
            SET avatar_url = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, name, bio, phone, birth_date,
                      city, state, avatar_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(avatar_url)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> SqlxResult<bool> {
        let result =
            sqlx::query("UPDATE profiles SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
