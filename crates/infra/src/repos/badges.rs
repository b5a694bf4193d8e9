use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::db::Db;
use crate::models::{BadgeRow, EarnedBadgeRow};

#[derive(Clone)]
pub struct BadgeRepo {
    pool: Db,
}

impl BadgeRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> SqlxResult<Vec<BadgeRow>> {
        sqlx::query_as::<_, BadgeRow>(
            r#"
            SELECT id, slug, name, description, icon, category, rarity, reward_xp
            FROM badges
            ORDER BY category ASC, reward_xp ASC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> SqlxResult<Vec<EarnedBadgeRow>> {
        sqlx::query_as::<_, EarnedBadgeRow>(
            r#"
            SELECT b.id, b.slug, b.name, b.description, b.icon, b.category, b.rarity,
                   b.reward_xp, ub.earned_at
            FROM user_badges ub
            JOIN badges b ON b.id = ub.badge_id
            WHERE ub.user_id = $1
            ORDER BY ub.earned_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Grant a badge by slug if the user does not hold it yet. Returns the
    /// badge only when it was newly granted, so callers can pay out its
    /// reward XP exactly once.
    pub async fn award(&self, user_id: Uuid, slug: &str) -> SqlxResult<Option<BadgeRow>> {
        let granted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO user_badges (user_id, badge_id)
            SELECT $1, b.id FROM badges b WHERE b.slug = $2
            ON CONFLICT (user_id, badge_id) DO NOTHING
            RETURNING badge_id
            "#,
        )
        .bind(user_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        let Some((badge_id,)) = granted else {
            return Ok(None);
        };

        sqlx::query_as::<_, BadgeRow>(
            r#"
            SELECT id, slug, name, description, icon, category, rarity, reward_xp
            FROM badges
            WHERE id = $1
            "#,
        )
        .bind(badge_id)
        .fetch_optional(&self.pool)
        .await
    }
}
