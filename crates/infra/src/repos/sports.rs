use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::db::Db;
use crate::models::SportRow;

#[derive(Clone)]
pub struct SportRepo {
    pool: Db,
}

impl SportRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> SqlxResult<Vec<SportRow>> {
        sqlx::query_as::<_, SportRow>(
            r#"
            SELECT id, name, icon, description, default_min_players, default_max_players, created_at
            FROM sports
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get(&self, id: Uuid) -> SqlxResult<Option<SportRow>> {
        sqlx::query_as::<_, SportRow>(
            r#"
            SELECT id, name, icon, description, default_min_players, default_max_players, created_at
            FROM sports
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_many(&self, ids: &[Uuid]) -> SqlxResult<Vec<SportRow>> {
        sqlx::query_as::<_, SportRow>(
            r#"
            SELECT id, name, icon, description, default_min_players, default_max_players, created_at
            FROM sports
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
    }
}
