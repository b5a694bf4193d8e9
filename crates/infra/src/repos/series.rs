use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::db::Db;
use crate::models::{MatchRow, SeriesRow};
use crate::repos::matches::CreateMatch;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSeries {
    pub organizer_id: Uuid,
    pub sport_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub frequency: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub occurrences: i32,
}

#[derive(Clone)]
pub struct SeriesRepo {
    pool: Db,
}

impl SeriesRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    /// Insert the series row and one match per occurrence in a single
    /// transaction; either the whole series exists afterwards or none of it.
    pub async fn create_with_matches(
        &self,
        data: CreateSeries,
        template: CreateMatch,
        dates: &[DateTime<Utc>],
    ) -> SqlxResult<(SeriesRow, Vec<MatchRow>)> {
        let mut tx = self.pool.begin().await?;

        let series = sqlx::query_as::<_, SeriesRow>(
            r#"
            INSERT INTO match_series (organizer_id, sport_id, title, description, frequency,
                                      start_date, end_date, occurrences)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, organizer_id, sport_id, title, description, frequency,
                      start_date, end_date, occurrences, is_active, created_at, updated_at
            "#,
        )
        .bind(data.organizer_id)
        .bind(data.sport_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.frequency)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.occurrences)
        .fetch_one(&mut *tx)
        .await?;

        let mut matches = Vec::with_capacity(dates.len());
        for date in dates {
            let row = sqlx::query_as::<_, MatchRow>(
                r#"
                INSERT INTO matches (sport_id, venue_id, organizer_id, series_id, title,
                                     description, match_date, duration_minutes, min_players,
                                     max_players, price_cents, skill_level, gender, recurrence)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                RETURNING id, sport_id, venue_id, organizer_id, series_id, title, description,
                          match_date, duration_minutes, min_players, max_players, current_players,
                          price_cents, skill_level, gender, status, recurrence, created_at, updated_at
                "#,
            )
            .bind(template.sport_id)
            .bind(template.venue_id)
            .bind(template.organizer_id)
            .bind(series.id)
            .bind(&template.title)
            .bind(&template.description)
            .bind(date)
            .bind(template.duration_minutes)
            .bind(template.min_players)
            .bind(template.max_players)
            .bind(template.price_cents)
            .bind(&template.skill_level)
            .bind(&template.gender)
            .bind(&data.frequency)
            .fetch_one(&mut *tx)
            .await?;
            matches.push(row);
        }

        tx.commit().await?;
        Ok((series, matches))
    }

    pub async fn get(&self, id: Uuid) -> SqlxResult<Option<SeriesRow>> {
        sqlx::query_as::<_, SeriesRow>(
            r#"
            SELECT id, organizer_id, sport_id, title, description, frequency,
                   start_date, end_date, occurrences, is_active, created_at, updated_at
            FROM match_series
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_by_organizer(&self, organizer_id: Uuid) -> SqlxResult<Vec<SeriesRow>> {
        sqlx::query_as::<_, SeriesRow>(
            r#"
            SELECT id, organizer_id, sport_id, title, description, frequency,
                   start_date, end_date, occurrences, is_active, created_at, updated_at
            FROM match_series
            WHERE organizer_id = $1
            ORDER BY is_active DESC, start_date DESC
            "#,
        )
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Deactivate a series and cancel its future matches; past matches are
    /// left untouched. Returns the series and how many matches were
    /// cancelled, or None when the series does not exist.
    pub async fn deactivate(&self, id: Uuid) -> SqlxResult<Option<(SeriesRow, u64)>> {
        let mut tx = self.pool.begin().await?;

        let series = sqlx::query_as::<_, SeriesRow>(
            r#"
            UPDATE match_series
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING id, organizer_id, sport_id, title, description, frequency,
                      start_date, end_date, occurrences, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(series) = series else {
            return Ok(None);
        };

        let cancelled = sqlx::query(
            r#"
            UPDATE matches
            SET status = 'cancelled', updated_at = NOW()
            WHERE series_id = $1 AND match_date > NOW() AND status <> 'cancelled'
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(Some((series, cancelled)))
    }
}
