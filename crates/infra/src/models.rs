use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SportRow {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub default_min_players: i32,
    pub default_max_players: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct VenueRow {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub facilities: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MatchRow {
    pub id: Uuid,
    pub sport_id: Uuid,
    pub venue_id: Option<Uuid>,
    pub organizer_id: Uuid,
    pub series_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub match_date: DateTime<Utc>,
    pub duration_minutes: i32,
    pub min_players: i32,
    pub max_players: i32,
    pub current_players: i32,
    pub price_cents: i64,
    pub skill_level: String,
    pub gender: String,
    pub status: String,
    pub recurrence: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ParticipantRow {
    pub id: Uuid,
    pub match_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub joined_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SeriesRow {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub sport_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub frequency: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub occurrences: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct XpAccountRow {
    pub user_id: Uuid,
    pub total_xp: i64,
    pub level: i32,
    pub league: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct XpTransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i32,
    pub kind: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BadgeRow {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category: String,
    pub rarity: String,
    pub reward_xp: i32,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EarnedBadgeRow {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category: String,
    pub rarity: String,
    pub reward_xp: i32,
    pub earned_at: DateTime<Utc>,
}

/// Leaderboard line: XP account joined with the public profile bits.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RankedPlayerRow {
    pub rank: i64,
    pub user_id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    pub total_xp: i64,
    pub level: i32,
    pub league: String,
    pub badges: i64,
    pub matches_attended: i64,
}
