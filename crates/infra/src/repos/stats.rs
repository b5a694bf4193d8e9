use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::db::Db;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportStats {
    pub sport_id: Uuid,
    pub sport_name: String,
    pub sport_icon: Option<String>,
    pub matches_played: i64,
    pub matches_missed: i64,
    pub matches_organized: i64,
    /// attended / (attended + no_show), as a percentage. 0 when unplayed.
    pub attendance_rate: f64,
}

#[derive(Clone)]
pub struct StatsRepo {
    pool: Db,
}

impl StatsRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    /// Per-sport aggregates for a player, computed on read. Sports the
    /// player only organized in still get a line.
    pub async fn per_sport(&self, user_id: Uuid) -> SqlxResult<Vec<SportStats>> {
        let played: Vec<(Uuid, String, Option<String>, i64, i64)> = sqlx::query_as(
            r#"
            SELECT s.id, s.name, s.icon,
                   COUNT(*) FILTER (WHERE p.status = 'attended') AS played,
                   COUNT(*) FILTER (WHERE p.status = 'no_show') AS missed
            FROM match_participants p
            JOIN matches m ON m.id = p.match_id
            JOIN sports s ON s.id = m.sport_id
            WHERE p.user_id = $1
            GROUP BY s.id, s.name, s.icon
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let organized: Vec<(Uuid, String, Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT s.id, s.name, s.icon, COUNT(*) AS organized
            FROM matches m
            JOIN sports s ON s.id = m.sport_id
            WHERE m.organizer_id = $1 AND m.status <> 'cancelled'
            GROUP BY s.id, s.name, s.icon
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_sport: HashMap<Uuid, SportStats> = HashMap::new();
        for (id, name, icon, played, missed) in played {
            by_sport.insert(
                id,
                SportStats {
                    sport_id: id,
                    sport_name: name,
                    sport_icon: icon,
                    matches_played: played,
                    matches_missed: missed,
                    matches_organized: 0,
                    attendance_rate: 0.0,
                },
            );
        }
        for (id, name, icon, organized) in organized {
            by_sport
                .entry(id)
                .or_insert_with(|| SportStats {
                    sport_id: id,
                    sport_name: name,
                    sport_icon: icon,
                    matches_played: 0,
                    matches_missed: 0,
                    matches_organized: 0,
                    attendance_rate: 0.0,
                })
                .matches_organized = organized;
        }

        let mut stats: Vec<SportStats> = by_sport.into_values().collect();
        for s in &mut stats {
            let outcomes = s.matches_played + s.matches_missed;
            if outcomes > 0 {
                s.attendance_rate = s.matches_played as f64 / outcomes as f64 * 100.0;
            }
        }
        stats.sort_by(|a, b| a.sport_name.cmp(&b.sport_name));
        Ok(stats)
    }
}
