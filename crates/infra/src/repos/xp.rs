use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::db::Db;
use crate::leveling;
use crate::models::{RankedPlayerRow, XpAccountRow, XpTransactionRow};
use crate::pagination::LimitOffset;

#[derive(Clone)]
pub struct XpRepo {
    pool: Db,
}

impl XpRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    /// Append a ledger entry and fold it into the account, recomputing
    /// level and league from the new total. The total never goes below
    /// zero, whatever the ledger says.
    pub async fn award(
        &self,
        user_id: Uuid,
        amount: i32,
        kind: &str,
        reason: &str,
    ) -> SqlxResult<XpAccountRow> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO xp_transactions (user_id, amount, kind, reason) VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(amount)
        .bind(kind)
        .bind(reason)
        .execute(&mut *tx)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO user_xp (user_id, total_xp)
            VALUES ($1, GREATEST($2::bigint, 0))
            ON CONFLICT (user_id)
            DO UPDATE SET total_xp = GREATEST(user_xp.total_xp + $2::bigint, 0),
                          updated_at = NOW()
            RETURNING total_xp
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        let account = sqlx::query_as::<_, XpAccountRow>(
            r#"
            UPDATE user_xp
            SET level = $2, league = $3
            WHERE user_id = $1
            RETURNING user_id, total_xp, level, league, updated_at
            "#,
        )
        .bind(user_id)
        .bind(leveling::level_for_xp(total))
        .bind(leveling::league_for_xp(total))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(account)
    }

    pub async fn account(&self, user_id: Uuid) -> SqlxResult<Option<XpAccountRow>> {
        sqlx::query_as::<_, XpAccountRow>(
            "SELECT user_id, total_xp, level, league, updated_at FROM user_xp WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn history(
        &self,
        user_id: Uuid,
        kind: Option<String>,
        page: Option<LimitOffset>,
    ) -> SqlxResult<Vec<XpTransactionRow>> {
        let p = page.unwrap_or_default();

        sqlx::query_as::<_, XpTransactionRow>(
            r#"
            SELECT id, user_id, amount, kind, reason, created_at
            FROM xp_transactions
            WHERE user_id = $1
              AND ($2::text IS NULL OR kind = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(p.limit)
        .bind(p.offset)
        .fetch_all(&self.pool)
        .await
    }

    /// Global ranking by total XP. Ties share a rank; names break the
    /// display order.
    pub async fn leaderboard(&self, limit: i64) -> SqlxResult<Vec<RankedPlayerRow>> {
        sqlx::query_as::<_, RankedPlayerRow>(
            r#"
            SELECT RANK() OVER (ORDER BY x.total_xp DESC) AS rank,
                   x.user_id, p.name, p.avatar_url, x.total_xp, x.level, x.league,
                   (SELECT COUNT(*) FROM user_badges ub WHERE ub.user_id = x.user_id) AS badges,
                   (SELECT COUNT(*) FROM match_participants mp
                    WHERE mp.user_id = x.user_id AND mp.status = 'attended') AS matches_attended
            FROM user_xp x
            JOIN profiles p ON p.id = x.user_id
            ORDER BY x.total_xp DESC, p.name ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
