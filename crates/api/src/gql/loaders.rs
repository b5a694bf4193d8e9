use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dataloader::Loader;
use uuid::Uuid;

use infra::db::Db;
use infra::models::{ProfileRow, SportRow, VenueRow};
use infra::repos::{ProfileRepo, SportRepo, VenueRepo};

/// Batched lookups behind the nested GraphQL fields, so a roster of
/// thirty players costs one profile query instead of thirty.

pub struct SportLoader {
    pool: Db,
}

impl SportLoader {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }
}

impl Loader<Uuid> for SportLoader {
    type Value = SportRow;
    type Error = Arc<sqlx::Error>;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        let rows = SportRepo::new(self.pool.clone())
            .get_many(keys)
            .await
            .map_err(Arc::new)?;
        Ok(rows.into_iter().map(|row| (row.id, row)).collect())
    }
}

pub struct VenueLoader {
    pool: Db,
}

impl VenueLoader {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }
}

impl Loader<Uuid> for VenueLoader {
    type Value = VenueRow;
    type Error = Arc<sqlx::Error>;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        let rows = VenueRepo::new(self.pool.clone())
            .get_many(keys)
            .await
            .map_err(Arc::new)?;
        Ok(rows.into_iter().map(|row| (row.id, row)).collect())
    }
}

pub struct ProfileLoader {
    pool: Db,
}

impl ProfileLoader {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }
}

impl Loader<Uuid> for ProfileLoader {
    type Value = ProfileRow;
    type Error = Arc<sqlx::Error>;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        let rows = ProfileRepo::new(self.pool.clone())
            .get_many(keys)
            .await
            .map_err(Arc::new)?;
        Ok(rows.into_iter().map(|row| (row.id, row)).collect())
    }
}
