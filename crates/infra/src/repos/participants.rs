use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, Result as SqlxResult, Transaction};
use uuid::Uuid;

use crate::db::Db;
use crate::models::{MatchRow, ParticipantRow};
use crate::roster::{self, ParticipantStatus};

#[derive(Debug)]
pub enum JoinOutcome {
    /// Seat taken; `match_row` reflects the updated counter and status.
    Joined {
        participant: ParticipantRow,
        match_row: MatchRow,
    },
    /// Match was at capacity; queued with a 1-based waitlist position.
    Waitlisted {
        participant: ParticipantRow,
        position: i64,
    },
    AlreadyJoined,
    MatchNotFound,
    MatchCancelled,
    MatchStarted,
}

#[derive(Debug)]
pub enum LeaveOutcome {
    Left {
        removed: ParticipantRow,
        promoted: Option<ParticipantRow>,
        match_row: MatchRow,
    },
    NotJoined,
    MatchNotFound,
}

#[derive(Debug)]
pub enum ConfirmOutcome {
    Confirmed(ParticipantRow),
    OnWaitlist,
    NotJoined,
    MatchNotFound,
    MatchCancelled,
    MatchStarted,
}

#[derive(Debug)]
pub enum RemoveOutcome {
    Removed {
        participant: ParticipantRow,
        promoted: Option<ParticipantRow>,
        match_row: MatchRow,
    },
    NotFound,
}

#[derive(Debug)]
pub enum AttendanceOutcome {
    Marked {
        participant: ParticipantRow,
        /// True the first time this row is marked attended. Later
        /// corrections keep it false, so attendance XP is never paid twice.
        first_attendance: bool,
    },
    NotStarted,
    NotFound,
}

/// Match columns read under `FOR UPDATE` while a roster change is in flight.
#[derive(Debug, FromRow)]
struct SeatLock {
    id: Uuid,
    status: String,
    match_date: DateTime<Utc>,
    current_players: i32,
    min_players: i32,
    max_players: i32,
}

impl SeatLock {
    fn is_running(&self, now: DateTime<Utc>) -> bool {
        self.status != "cancelled" && self.match_date > now
    }
}

#[derive(Clone)]
pub struct ParticipantRepo {
    pool: Db,
}

impl ParticipantRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    /// Join a match. The match row is locked for the whole decision, so the
    /// seat check and the counter update cannot interleave with another
    /// join or leave on the same match.
    pub async fn join(&self, match_id: Uuid, user_id: Uuid) -> SqlxResult<JoinOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(m) = lock_match(&mut tx, match_id).await? else {
            return Ok(JoinOutcome::MatchNotFound);
        };
        if m.status == "cancelled" {
            return Ok(JoinOutcome::MatchCancelled);
        }
        if m.match_date <= Utc::now() {
            return Ok(JoinOutcome::MatchStarted);
        }

        let already: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM match_participants
                WHERE match_id = $1 AND user_id = $2 AND status <> 'cancelled'
            )
            "#,
        )
        .bind(match_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if already {
            return Ok(JoinOutcome::AlreadyJoined);
        }

        let seat = roster::seat_for_join(m.current_players, m.max_players);
        let participant = sqlx::query_as::<_, ParticipantRow>(
            r#"
            INSERT INTO match_participants (match_id, user_id, status)
            VALUES ($1, $2, $3)
            RETURNING id, match_id, user_id, status, joined_at, confirmed_at
            "#,
        )
        .bind(match_id)
        .bind(user_id)
        .bind(seat.as_str())
        .fetch_one(&mut *tx)
        .await?;

        if seat.is_seated() {
            let match_row = set_seats(&mut tx, &m, m.current_players + 1).await?;
            tx.commit().await?;
            Ok(JoinOutcome::Joined { participant, match_row })
        } else {
            let position: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*) FROM match_participants
                WHERE match_id = $1 AND status = 'waitlist'
                  AND (joined_at, id) <= ($2, $3)
                "#,
            )
            .bind(match_id)
            .bind(participant.joined_at)
            .bind(participant.id)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok(JoinOutcome::Waitlisted { participant, position })
        }
    }

    /// Leave a match, deleting the caller's row whatever its state. A freed
    /// seat is handed to the earliest waitlisted player; an emptied waitlist
    /// slot just disappears.
    pub async fn leave(&self, match_id: Uuid, user_id: Uuid) -> SqlxResult<LeaveOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(m) = lock_match(&mut tx, match_id).await? else {
            return Ok(LeaveOutcome::MatchNotFound);
        };

        let removed = sqlx::query_as::<_, ParticipantRow>(
            r#"
            DELETE FROM match_participants
            WHERE match_id = $1 AND user_id = $2 AND status <> 'cancelled'
            RETURNING id, match_id, user_id, status, joined_at, confirmed_at
            "#,
        )
        .bind(match_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(removed) = removed else {
            return Ok(LeaveOutcome::NotJoined);
        };

        let was_seated = ParticipantStatus::parse(&removed.status)
            .map(|s| s.is_seated())
            .unwrap_or(false);
        let (promoted, match_row) = backfill_seat(&mut tx, &m, was_seated).await?;

        tx.commit().await?;
        Ok(LeaveOutcome::Left { removed, promoted, match_row })
    }

    /// Confirm presence. Idempotent: a repeat confirm succeeds and keeps
    /// the original `confirmed_at`.
    pub async fn confirm(&self, match_id: Uuid, user_id: Uuid) -> SqlxResult<ConfirmOutcome> {
        let updated = sqlx::query_as::<_, ParticipantRow>(
            r#"
            UPDATE match_participants p
            SET status = 'confirmed', confirmed_at = COALESCE(p.confirmed_at, NOW())
            FROM matches m
            WHERE p.match_id = $1 AND p.user_id = $2
              AND p.status IN ('pending', 'confirmed')
              AND m.id = p.match_id AND m.status <> 'cancelled' AND m.match_date > NOW()
            RETURNING p.id, p.match_id, p.user_id, p.status, p.joined_at, p.confirmed_at
            "#,
        )
        .bind(match_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            return Ok(ConfirmOutcome::Confirmed(row));
        }

        // Miss: work out which precondition failed for the caller.
        let match_status: Option<(String, DateTime<Utc>)> =
            sqlx::query_as("SELECT status, match_date FROM matches WHERE id = $1")
                .bind(match_id)
                .fetch_optional(&self.pool)
                .await?;
        let Some((status, match_date)) = match_status else {
            return Ok(ConfirmOutcome::MatchNotFound);
        };
        if status == "cancelled" {
            return Ok(ConfirmOutcome::MatchCancelled);
        }

        let participant = self.get_for_user(match_id, user_id).await?;
        match participant {
            Some(p) if p.status == "waitlist" => Ok(ConfirmOutcome::OnWaitlist),
            Some(_) if match_date <= Utc::now() => Ok(ConfirmOutcome::MatchStarted),
            Some(_) => Ok(ConfirmOutcome::NotJoined),
            None => Ok(ConfirmOutcome::NotJoined),
        }
    }

    /// Organizer-side removal: the participant stays on the books as
    /// `declined`, and a seated decline backfills from the waitlist.
    pub async fn decline(&self, participant_id: Uuid) -> SqlxResult<RemoveOutcome> {
        self.remove(participant_id, "declined", false).await
    }

    /// Sweeper-side removal of an unconfirmed pending seat. The row becomes
    /// `cancelled`, which frees the (match, user) pair for a future rejoin.
    pub async fn release(&self, participant_id: Uuid) -> SqlxResult<RemoveOutcome> {
        self.remove(participant_id, "cancelled", true).await
    }

    async fn remove(
        &self,
        participant_id: Uuid,
        new_status: &str,
        only_unconfirmed_pending: bool,
    ) -> SqlxResult<RemoveOutcome> {
        let mut tx = self.pool.begin().await?;

        // The match id is unknown until the participant is read, so read it
        // unlocked first, then lock the match and re-check the row.
        let probe: Option<(Uuid,)> =
            sqlx::query_as("SELECT match_id FROM match_participants WHERE id = $1")
                .bind(participant_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((match_id,)) = probe else {
            return Ok(RemoveOutcome::NotFound);
        };
        let Some(m) = lock_match(&mut tx, match_id).await? else {
            return Ok(RemoveOutcome::NotFound);
        };

        let target = if only_unconfirmed_pending {
            sqlx::query_as::<_, ParticipantRow>(
                r#"
                SELECT id, match_id, user_id, status, joined_at, confirmed_at
                FROM match_participants
                WHERE id = $1 AND status = 'pending' AND confirmed_at IS NULL
                FOR UPDATE
                "#,
            )
        } else {
            sqlx::query_as::<_, ParticipantRow>(
                r#"
                SELECT id, match_id, user_id, status, joined_at, confirmed_at
                FROM match_participants
                WHERE id = $1 AND status IN ('pending', 'confirmed', 'waitlist')
                FOR UPDATE
                "#,
            )
        }
        .bind(participant_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(target) = target else {
            return Ok(RemoveOutcome::NotFound);
        };

        let participant = sqlx::query_as::<_, ParticipantRow>(
            r#"
            UPDATE match_participants
            SET status = $2
            WHERE id = $1
            RETURNING id, match_id, user_id, status, joined_at, confirmed_at
            "#,
        )
        .bind(participant_id)
        .bind(new_status)
        .fetch_one(&mut *tx)
        .await?;

        let was_seated = ParticipantStatus::parse(&target.status)
            .map(|s| s.is_seated())
            .unwrap_or(false);
        let (promoted, match_row) = backfill_seat(&mut tx, &m, was_seated).await?;

        tx.commit().await?;
        Ok(RemoveOutcome::Removed { participant, promoted, match_row })
    }

    /// Organizer bookkeeping after kick-off; attended/no_show may be
    /// corrected back and forth.
    pub async fn mark_attendance(
        &self,
        participant_id: Uuid,
        attended: bool,
    ) -> SqlxResult<AttendanceOutcome> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(String, DateTime<Utc>, bool)> = sqlx::query_as(
            r#"
            SELECT p.status, m.match_date, p.xp_awarded
            FROM match_participants p
            JOIN matches m ON m.id = p.match_id
            WHERE p.id = $1
            FOR UPDATE OF p
            "#,
        )
        .bind(participant_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((_, match_date, already_awarded)) = current else {
            return Ok(AttendanceOutcome::NotFound);
        };
        if match_date > Utc::now() {
            return Ok(AttendanceOutcome::NotStarted);
        }

        let updated = sqlx::query_as::<_, ParticipantRow>(
            r#"
            UPDATE match_participants
            SET status = CASE WHEN $2 THEN 'attended' ELSE 'no_show' END,
                xp_awarded = xp_awarded OR $2
            WHERE id = $1 AND status IN ('pending', 'confirmed', 'attended', 'no_show')
            RETURNING id, match_id, user_id, status, joined_at, confirmed_at
            "#,
        )
        .bind(participant_id)
        .bind(attended)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        match updated {
            Some(participant) => Ok(AttendanceOutcome::Marked {
                participant,
                first_attendance: attended && !already_awarded,
            }),
            None => Ok(AttendanceOutcome::NotFound),
        }
    }

    /// Seated and post-match participants, in join order.
    pub async fn roster(&self, match_id: Uuid) -> SqlxResult<Vec<ParticipantRow>> {
        sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT id, match_id, user_id, status, joined_at, confirmed_at
            FROM match_participants
            WHERE match_id = $1 AND status IN ('pending', 'confirmed', 'attended', 'no_show')
            ORDER BY joined_at ASC, id ASC
            "#,
        )
        .bind(match_id)
        .fetch_all(&self.pool)
        .await
    }

    /// The waitlist in promotion order.
    pub async fn waitlist(&self, match_id: Uuid) -> SqlxResult<Vec<ParticipantRow>> {
        sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT id, match_id, user_id, status, joined_at, confirmed_at
            FROM match_participants
            WHERE match_id = $1 AND status = 'waitlist'
            ORDER BY joined_at ASC, id ASC
            "#,
        )
        .bind(match_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get(&self, id: Uuid) -> SqlxResult<Option<ParticipantRow>> {
        sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT id, match_id, user_id, status, joined_at, confirmed_at
            FROM match_participants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_for_user(
        &self,
        match_id: Uuid,
        user_id: Uuid,
    ) -> SqlxResult<Option<ParticipantRow>> {
        sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT id, match_id, user_id, status, joined_at, confirmed_at
            FROM match_participants
            WHERE match_id = $1 AND user_id = $2 AND status <> 'cancelled'
            "#,
        )
        .bind(match_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// The caller's upcoming involvements (seated or waitlisted), soonest
    /// match first.
    pub async fn list_upcoming_for_user(&self, user_id: Uuid) -> SqlxResult<Vec<ParticipantRow>> {
        sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT p.id, p.match_id, p.user_id, p.status, p.joined_at, p.confirmed_at
            FROM match_participants p
            JOIN matches m ON m.id = p.match_id
            WHERE p.user_id = $1
              AND p.status IN ('pending', 'confirmed', 'waitlist')
              AND m.status <> 'cancelled'
              AND m.match_date > NOW()
            ORDER BY m.match_date ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Pending seats whose confirmation deadline has passed: the match
    /// starts within `release_secs` and the seat has been held for at least
    /// `grace_secs`. Batched per sweep.
    pub async fn releasable(&self, release_secs: i64, grace_secs: i64) -> SqlxResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT p.id
            FROM match_participants p
            JOIN matches m ON m.id = p.match_id
            WHERE p.status = 'pending' AND p.confirmed_at IS NULL
              AND m.status <> 'cancelled'
              AND m.match_date > NOW()
              AND m.match_date <= NOW() + ($1::bigint * INTERVAL '1 second')
              AND p.joined_at <= NOW() - ($2::bigint * INTERVAL '1 second')
            ORDER BY m.match_date ASC
            LIMIT 100
            "#,
        )
        .bind(release_secs)
        .bind(grace_secs)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn attended_count(&self, user_id: Uuid) -> SqlxResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM match_participants WHERE user_id = $1 AND status = 'attended'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }
}

async fn lock_match(
    tx: &mut Transaction<'_, Postgres>,
    match_id: Uuid,
) -> SqlxResult<Option<SeatLock>> {
    sqlx::query_as::<_, SeatLock>(
        r#"
        SELECT id, status, match_date, current_players, min_players, max_players
        FROM matches
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(match_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Rewrites the seat counter and recomputes the match status from it.
async fn set_seats(
    tx: &mut Transaction<'_, Postgres>,
    m: &SeatLock,
    current_players: i32,
) -> SqlxResult<MatchRow> {
    let current_players = current_players.clamp(0, m.max_players);
    let status = roster::match_status_for(current_players, m.min_players, m.max_players);
    sqlx::query_as::<_, MatchRow>(
        r#"
        UPDATE matches
        SET current_players = $2, status = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING id, sport_id, venue_id, organizer_id, series_id, title, description,
                  match_date, duration_minutes, min_players, max_players, current_players,
                  price_cents, skill_level, gender, status, recurrence, created_at, updated_at
        "#,
    )
    .bind(m.id)
    .bind(current_players)
    .bind(status.as_str())
    .fetch_one(&mut **tx)
    .await
}

/// After a seat was vacated: hand it to the earliest waitlisted player, or
/// shrink the counter when the waitlist is empty. Matches that are already
/// over or cancelled keep their counters as history.
async fn backfill_seat(
    tx: &mut Transaction<'_, Postgres>,
    m: &SeatLock,
    was_seated: bool,
) -> SqlxResult<(Option<ParticipantRow>, MatchRow)> {
    if was_seated && m.is_running(Utc::now()) {
        if let Some(promoted) = promote_next(tx, m.id).await? {
            let match_row = get_match(tx, m.id).await?;
            return Ok((Some(promoted), match_row));
        }
        let match_row = set_seats(tx, m, m.current_players - 1).await?;
        return Ok((None, match_row));
    }
    let match_row = get_match(tx, m.id).await?;
    Ok((None, match_row))
}

/// Earliest waitlisted player wins the seat; ties on `joined_at` fall back
/// to the smaller id. The promoted row goes back to `pending` and still owes
/// a presence confirmation.
async fn promote_next(
    tx: &mut Transaction<'_, Postgres>,
    match_id: Uuid,
) -> SqlxResult<Option<ParticipantRow>> {
    sqlx::query_as::<_, ParticipantRow>(
        r#"
        UPDATE match_participants
        SET status = 'pending'
        WHERE id = (
            SELECT id FROM match_participants
            WHERE match_id = $1 AND status = 'waitlist'
            ORDER BY joined_at ASC, id ASC
            LIMIT 1
        )
        RETURNING id, match_id, user_id, status, joined_at, confirmed_at
        "#,
    )
    .bind(match_id)
    .fetch_optional(&mut **tx)
    .await
}

async fn get_match(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> SqlxResult<MatchRow> {
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
    .fetch_one(&mut **tx)
    .await
}
