use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::db::Db;
use crate::models::MatchRow;
use crate::pagination::LimitOffset;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMatch {
    pub sport_id: Uuid,
    pub venue_id: Option<Uuid>,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub match_date: DateTime<Utc>,
    pub duration_minutes: i32,
    pub min_players: i32,
    pub max_players: i32,
    pub price_cents: i64,
    pub skill_level: String,
    pub gender: String,
}

#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    pub sport_id: Option<Uuid>,
    pub city: Option<String>,
    pub skill_level: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub max_price_cents: Option<i64>,
    /// Which statuses to include; listings default to open + confirmed.
    pub statuses: Vec<String>,
}

#[derive(Clone)]
pub struct MatchRepo {
    pool: Db,
}

impl MatchRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    /// Insert a one-off match (no series). Seats start empty and the
    /// status starts `open`.
    pub async fn create(&self, data: CreateMatch) -> SqlxResult<MatchRow> {
        sqlx::query_as::<_, MatchRow>(
            r#"
            INSERT INTO matches (sport_id, venue_id, organizer_id, title, description,
                                 match_date, duration_minutes, min_players, max_players,
                                 price_cents, skill_level, gender)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, sport_id, venue_id, organizer_id, series_id, title, description,
                      match_date, duration_minutes, min_players, max_players, current_players,
                      price_cents, skill_level, gender, status, recurrence, created_at, updated_at
            "#,
        )
        .bind(data.sport_id)
        .bind(data.venue_id)
        .bind(data.organizer_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.match_date)
        .bind(data.duration_minutes)
        .bind(data.min_players)
        .bind(data.max_players)
        .bind(data.price_cents)
        .bind(data.skill_level)
        .bind(data.gender)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get(&self, id: Uuid) -> SqlxResult<Option<MatchRow>> {
        sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT id, sport_id, venue_id, organizer_id, series_id, title, description,
                   match_date, duration_minutes, min_players, max_players, current_players,
                   price_cents, skill_level, gender, status, recurrence, created_at, updated_at
            FROM matches
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_many(&self, ids: &[Uuid]) -> SqlxResult<Vec<MatchRow>> {
        sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT id, sport_id, venue_id, organizer_id, series_id, title, description,
                   match_date, duration_minutes, min_players, max_players, current_players,
                   price_cents, skill_level, gender, status, recurrence, created_at, updated_at
            FROM matches
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list(&self, filter: MatchFilter, page: Option<LimitOffset>) -> SqlxResult<Vec<MatchRow>> {
        let p = page.unwrap_or_default();

        // Dynamic WHERE using the NULL-or pattern to keep a single prepared statement
        sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT m.id, m.sport_id, m.venue_id, m.organizer_id, m.series_id, m.title,
                   m.description, m.match_date, m.duration_minutes, m.min_players,
                   m.max_players, m.current_players, m.price_cents, m.skill_level,
                   m.gender, m.status, m.recurrence, m.created_at, m.updated_at
            FROM matches m
            LEFT JOIN venues v ON v.id = m.venue_id
            WHERE m.status = ANY($1)
              AND ($2::uuid IS NULL OR m.sport_id = $2)
              AND ($3::text IS NULL OR v.city ILIKE $3)
              AND ($4::text IS NULL OR m.skill_level = $4)
              AND ($5::timestamptz IS NULL OR m.match_date >= $5)
              AND ($6::timestamptz IS NULL OR m.match_date <= $6)
              AND ($7::bigint IS NULL OR m.price_cents <= $7)
            ORDER BY m.match_date ASC
            LIMIT $8 OFFSET $9
            "#,
        )
        .bind(filter.statuses)
        .bind(filter.sport_id)
        .bind(filter.city)
        .bind(filter.skill_level)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.max_price_cents)
        .bind(p.limit)
        .bind(p.offset)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_by_series(&self, series_id: Uuid) -> SqlxResult<Vec<MatchRow>> {
        sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT id, sport_id, venue_id, organizer_id, series_id, title, description,
                   match_date, duration_minutes, min_players, max_players, current_players,
                   price_cents, skill_level, gender, status, recurrence, created_at, updated_at
            FROM matches
            WHERE series_id = $1
            ORDER BY match_date ASC
            "#,
        )
        .bind(series_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Terminal transition; a cancelled match never reopens.
    pub async fn cancel(&self, id: Uuid) -> SqlxResult<Option<MatchRow>> {
        sqlx::query_as::<_, MatchRow>(
            r#"
            UPDATE matches
            SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1 AND status <> 'cancelled'
            RETURNING id, sport_id, venue_id, organizer_id, series_id, title, description,
                      match_date, duration_minutes, min_players, max_players, current_players,
                      price_cents, skill_level, gender, status, recurrence, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
