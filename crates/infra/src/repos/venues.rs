use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::db::Db;
use crate::models::VenueRow;

#[derive(Clone)]
pub struct VenueRepo {
    pool: Db,
}

impl VenueRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    pub async fn list(&self, city: Option<String>) -> SqlxResult<Vec<VenueRow>> {
        sqlx::query_as::<_, VenueRow>(
            r#"
            SELECT id, name, address, city, state, facilities, created_at
            FROM venues
            WHERE ($1::text IS NULL OR city ILIKE $1)
            ORDER BY name ASC
            "#,
        )
        .bind(city)
        .fetch_all(&self.pool)
        .await
    }

    /// Batch lookup for dataloaders.
    pub async fn get_many(&self, ids: &[Uuid]) -> SqlxResult<Vec<VenueRow>> {
        sqlx::query_as::<_, VenueRow>(
            r#"
            SELECT id, name, address, city, state, facilities, created_at
            FROM venues
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
    }
}
