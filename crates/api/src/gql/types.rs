use async_graphql::dataloader::DataLoader;
use async_graphql::{
    ComplexObject, Context, Enum, Error, InputObject, Result, SimpleObject, ID,
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use infra::models::{
    BadgeRow, EarnedBadgeRow, MatchRow, ParticipantRow, ProfileRow, RankedPlayerRow, SeriesRow,
    SportRow, VenueRow, XpAccountRow, XpTransactionRow,
};
use infra::repos::MatchRepo;
use infra::{recurrence, roster};

use crate::gql::loaders::{ProfileLoader, SportLoader, VenueLoader};
use crate::gql::scalars::Money;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Enums mirrored to their database spellings
// ---------------------------------------------------------------------------

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum MatchStatus {
    Open,
    Confirmed,
    Full,
    Cancelled,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Open => "open",
            MatchStatus::Confirmed => "confirmed",
            MatchStatus::Full => "full",
            MatchStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_db(s: &str) -> Self {
        roster::MatchStatus::parse(s)
            .map(Into::into)
            .unwrap_or(MatchStatus::Open)
    }
}

impl From<roster::MatchStatus> for MatchStatus {
    fn from(status: roster::MatchStatus) -> Self {
        match status {
            roster::MatchStatus::Open => MatchStatus::Open,
            roster::MatchStatus::Confirmed => MatchStatus::Confirmed,
            roster::MatchStatus::Full => MatchStatus::Full,
            roster::MatchStatus::Cancelled => MatchStatus::Cancelled,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum ParticipantStatus {
    Pending,
    Confirmed,
    Waitlist,
    Declined,
    Cancelled,
    Attended,
    NoShow,
}

impl ParticipantStatus {
    pub fn from_db(s: &str) -> Self {
        roster::ParticipantStatus::parse(s)
            .map(Into::into)
            .unwrap_or(ParticipantStatus::Cancelled)
    }
}

impl From<roster::ParticipantStatus> for ParticipantStatus {
    fn from(status: roster::ParticipantStatus) -> Self {
        match status {
            roster::ParticipantStatus::Pending => ParticipantStatus::Pending,
            roster::ParticipantStatus::Confirmed => ParticipantStatus::Confirmed,
            roster::ParticipantStatus::Waitlist => ParticipantStatus::Waitlist,
            roster::ParticipantStatus::Declined => ParticipantStatus::Declined,
            roster::ParticipantStatus::Cancelled => ParticipantStatus::Cancelled,
            roster::ParticipantStatus::Attended => ParticipantStatus::Attended,
            roster::ParticipantStatus::NoShow => ParticipantStatus::NoShow,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Any,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
            SkillLevel::Any => "any",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "beginner" => SkillLevel::Beginner,
            "intermediate" => SkillLevel::Intermediate,
            "advanced" => SkillLevel::Advanced,
            _ => SkillLevel::Any,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum GenderPolicy {
    Male,
    Female,
    Mixed,
}

impl GenderPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenderPolicy::Male => "male",
            GenderPolicy::Female => "female",
            GenderPolicy::Mixed => "mixed",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "male" => GenderPolicy::Male,
            "female" => GenderPolicy::Female,
            _ => GenderPolicy::Mixed,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum RecurrenceFrequency {
    Weekly,
    Biweekly,
    Monthly,
}

impl From<RecurrenceFrequency> for recurrence::Frequency {
    fn from(frequency: RecurrenceFrequency) -> Self {
        match frequency {
            RecurrenceFrequency::Weekly => recurrence::Frequency::Weekly,
            RecurrenceFrequency::Biweekly => recurrence::Frequency::Biweekly,
            RecurrenceFrequency::Monthly => recurrence::Frequency::Monthly,
        }
    }
}

impl From<recurrence::Frequency> for RecurrenceFrequency {
    fn from(frequency: recurrence::Frequency) -> Self {
        match frequency {
            recurrence::Frequency::Weekly => RecurrenceFrequency::Weekly,
            recurrence::Frequency::Biweekly => RecurrenceFrequency::Biweekly,
            recurrence::Frequency::Monthly => RecurrenceFrequency::Monthly,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum League {
    Bronze,
    Silver,
    Gold,
    Diamond,
    Master,
}

impl League {
    pub fn from_db(s: &str) -> Self {
        match s {
            "silver" => League::Silver,
            "gold" => League::Gold,
            "diamond" => League::Diamond,
            "master" => League::Master,
            _ => League::Bronze,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum XpReason {
    MatchCreated,
    MatchParticipated,
    BadgeEarned,
    Manual,
}

impl XpReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            XpReason::MatchCreated => "match_created",
            XpReason::MatchParticipated => "match_participated",
            XpReason::BadgeEarned => "badge_earned",
            XpReason::Manual => "manual",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "match_created" => XpReason::MatchCreated,
            "match_participated" => XpReason::MatchParticipated,
            "badge_earned" => XpReason::BadgeEarned,
            _ => XpReason::Manual,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum BadgeCategory {
    Participation,
    Achievement,
    Social,
    Special,
}

impl BadgeCategory {
    pub fn from_db(s: &str) -> Self {
        match s {
            "achievement" => BadgeCategory::Achievement,
            "social" => BadgeCategory::Social,
            "special" => BadgeCategory::Special,
            _ => BadgeCategory::Participation,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl BadgeRarity {
    pub fn from_db(s: &str) -> Self {
        match s {
            "rare" => BadgeRarity::Rare,
            "epic" => BadgeRarity::Epic,
            "legendary" => BadgeRarity::Legendary,
            _ => BadgeRarity::Common,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum RosterEventKind {
    Joined,
    Left,
    Promoted,
    Confirmed,
    Declined,
    Released,
}

// ---------------------------------------------------------------------------
// Object types
// ---------------------------------------------------------------------------

#[derive(SimpleObject, Clone)]
pub struct Sport {
    pub id: ID,
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub default_min_players: i32,
    pub default_max_players: i32,
}

impl From<SportRow> for Sport {
    fn from(row: SportRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            icon: row.icon,
            description: row.description,
            default_min_players: row.default_min_players,
            default_max_players: row.default_max_players,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct Venue {
    pub id: ID,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub facilities: Vec<String>,
}

impl From<VenueRow> for Venue {
    fn from(row: VenueRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            address: row.address,
            city: row.city,
            state: row.state,
            facilities: row.facilities,
        }
    }
}

/// Public view of an account; never exposes contact details.
#[derive(SimpleObject, Clone)]
pub struct Player {
    pub id: ID,
    pub name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl From<ProfileRow> for Player {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            avatar_url: row.avatar_url,
            bio: row.bio,
            city: row.city,
            state: row.state,
        }
    }
}

/// The caller's own profile, email and all.
#[derive(SimpleObject, Clone)]
pub struct Profile {
    pub id: ID,
    pub email: String,
    pub name: String,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id.into(),
            email: row.email,
            name: row.name,
            bio: row.bio,
            phone: row.phone,
            birth_date: row.birth_date,
            city: row.city,
            state: row.state,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
        }
    }
}

#[derive(SimpleObject, Clone)]
#[graphql(complex)]
pub struct Match {
    pub id: ID,
    pub sport_id: ID,
    pub venue_id: Option<ID>,
    pub organizer_id: ID,
    pub series_id: Option<ID>,
    pub title: String,
    pub description: Option<String>,
    pub match_date: DateTime<Utc>,
    pub duration_minutes: i32,
    pub min_players: i32,
    pub max_players: i32,
    pub current_players: i32,
    pub price: Money,
    pub skill_level: SkillLevel,
    pub gender: GenderPolicy,
    pub status: MatchStatus,
    pub recurrence: Option<RecurrenceFrequency>,
    pub created_at: DateTime<Utc>,
}

impl From<MatchRow> for Match {
    fn from(row: MatchRow) -> Self {
        Self {
            id: row.id.into(),
            sport_id: row.sport_id.into(),
            venue_id: row.venue_id.map(Into::into),
            organizer_id: row.organizer_id.into(),
            series_id: row.series_id.map(Into::into),
            title: row.title,
            description: row.description,
            match_date: row.match_date,
            duration_minutes: row.duration_minutes,
            min_players: row.min_players,
            max_players: row.max_players,
            current_players: row.current_players,
            price: Money(row.price_cents),
            skill_level: SkillLevel::from_db(&row.skill_level),
            gender: GenderPolicy::from_db(&row.gender),
            status: MatchStatus::from_db(&row.status),
            recurrence: recurrence::Frequency::parse(&row.recurrence).map(Into::into),
            created_at: row.created_at,
        }
    }
}

#[ComplexObject]
impl Match {
    async fn sport(&self, ctx: &Context<'_>) -> Result<Sport> {
        let loader = ctx.data::<DataLoader<SportLoader>>()?;
        let sport_id = parse_id(&self.sport_id)?;

        match loader
            .load_one(sport_id)
            .await
            .map_err(|e| Error::new(e.to_string()))?
        {
            Some(row) => Ok(row.into()),
            None => Err(Error::new("Sport not found")),
        }
    }

    async fn venue(&self, ctx: &Context<'_>) -> Result<Option<Venue>> {
        let Some(venue_id) = &self.venue_id else {
            return Ok(None);
        };
        let loader = ctx.data::<DataLoader<VenueLoader>>()?;

        let row = loader
            .load_one(parse_id(venue_id)?)
            .await
            .map_err(|e| Error::new(e.to_string()))?;
        Ok(row.map(Into::into))
    }

    async fn organizer(&self, ctx: &Context<'_>) -> Result<Player> {
        let loader = ctx.data::<DataLoader<ProfileLoader>>()?;

        match loader
            .load_one(parse_id(&self.organizer_id)?)
            .await
            .map_err(|e| Error::new(e.to_string()))?
        {
            Some(row) => Ok(row.into()),
            None => Err(Error::new("Player not found")),
        }
    }
}

#[derive(SimpleObject, Clone)]
#[graphql(complex)]
pub struct Participant {
    pub id: ID,
    pub match_id: ID,
    pub user_id: ID,
    pub status: ParticipantStatus,
    pub joined_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl From<ParticipantRow> for Participant {
    fn from(row: ParticipantRow) -> Self {
        Self {
            id: row.id.into(),
            match_id: row.match_id.into(),
            user_id: row.user_id.into(),
            status: ParticipantStatus::from_db(&row.status),
            joined_at: row.joined_at,
            confirmed_at: row.confirmed_at,
        }
    }
}

#[ComplexObject]
impl Participant {
    async fn player(&self, ctx: &Context<'_>) -> Result<Player> {
        let loader = ctx.data::<DataLoader<ProfileLoader>>()?;

        match loader
            .load_one(parse_id(&self.user_id)?)
            .await
            .map_err(|e| Error::new(e.to_string()))?
        {
            Some(row) => Ok(row.into()),
            None => Err(Error::new("Player not found")),
        }
    }
}

/// Seated participant plus whether the presence gate still wants a
/// confirmation from them.
#[derive(SimpleObject, Clone)]
pub struct RosterEntry {
    pub participant: Participant,
    pub needs_confirmation: bool,
}

/// Waitlisted participant with the 1-based promotion position.
#[derive(SimpleObject, Clone)]
pub struct WaitlistEntry {
    pub participant: Participant,
    pub position: i64,
}

#[derive(SimpleObject, Clone)]
pub struct Roster {
    pub match_id: ID,
    pub players: Vec<RosterEntry>,
    pub waitlist: Vec<WaitlistEntry>,
}

/// One of the caller's active participations joined with its match.
#[derive(SimpleObject, Clone)]
pub struct Participation {
    #[graphql(name = "match")]
    pub match_info: Match,
    pub participant: Participant,
}

/// Result of a join: either a seat or a spot in the queue.
#[derive(SimpleObject, Clone)]
pub struct JoinResult {
    pub participant: Participant,
    /// 1-based position when the join landed on the waitlist.
    pub waitlist_position: Option<i64>,
    /// The match with its updated counter; absent for waitlist joins,
    /// which leave the match untouched.
    #[graphql(name = "match")]
    pub match_info: Option<Match>,
}

#[derive(SimpleObject, Clone)]
pub struct SeriesCancellation {
    pub series: Series,
    /// Future matches flipped to cancelled; past ones are left alone.
    pub cancelled_matches: i64,
}

#[derive(SimpleObject, Clone)]
#[graphql(complex)]
pub struct Series {
    pub id: ID,
    pub organizer_id: ID,
    pub sport_id: ID,
    pub title: String,
    pub description: Option<String>,
    pub frequency: RecurrenceFrequency,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub occurrences: i32,
    pub is_active: bool,
}

impl From<SeriesRow> for Series {
    fn from(row: SeriesRow) -> Self {
        Self {
            id: row.id.into(),
            organizer_id: row.organizer_id.into(),
            sport_id: row.sport_id.into(),
            title: row.title,
            description: row.description,
            frequency: recurrence::Frequency::parse(&row.frequency)
                .map(Into::into)
                .unwrap_or(RecurrenceFrequency::Weekly),
            start_date: row.start_date,
            end_date: row.end_date,
            occurrences: row.occurrences,
            is_active: row.is_active,
        }
    }
}

#[ComplexObject]
impl Series {
    async fn sport(&self, ctx: &Context<'_>) -> Result<Sport> {
        let loader = ctx.data::<DataLoader<SportLoader>>()?;

        match loader
            .load_one(parse_id(&self.sport_id)?)
            .await
            .map_err(|e| Error::new(e.to_string()))?
        {
            Some(row) => Ok(row.into()),
            None => Err(Error::new("Sport not found")),
        }
    }

    async fn matches(&self, ctx: &Context<'_>) -> Result<Vec<Match>> {
        let state = ctx.data::<AppState>()?;
        let repo = MatchRepo::new(state.db.clone());

        let rows = repo.list_by_series(parse_id(&self.id)?).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(SimpleObject, Clone)]
pub struct AuthPayload {
    pub token: String,
    pub profile: Profile,
}

#[derive(SimpleObject, Clone)]
pub struct XpSummary {
    pub total_xp: i64,
    pub level: i32,
    pub league: League,
    pub xp_for_current_level: i64,
    pub xp_for_next_level: i64,
    pub progress_to_next_level: f64,
}

impl From<XpAccountRow> for XpSummary {
    fn from(row: XpAccountRow) -> Self {
        Self {
            total_xp: row.total_xp,
            level: row.level,
            league: League::from_db(&row.league),
            xp_for_current_level: infra::leveling::xp_for_level(row.level),
            xp_for_next_level: infra::leveling::xp_for_level(row.level + 1),
            progress_to_next_level: infra::leveling::progress_to_next_level(row.total_xp),
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct XpTransaction {
    pub id: ID,
    pub amount: i32,
    pub kind: XpReason,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<XpTransactionRow> for XpTransaction {
    fn from(row: XpTransactionRow) -> Self {
        Self {
            id: row.id.into(),
            amount: row.amount,
            kind: XpReason::from_db(&row.kind),
            reason: row.reason,
            created_at: row.created_at,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct Badge {
    pub id: ID,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category: BadgeCategory,
    pub rarity: BadgeRarity,
    pub reward_xp: i32,
}

impl From<BadgeRow> for Badge {
    fn from(row: BadgeRow) -> Self {
        Self {
            id: row.id.into(),
            slug: row.slug,
            name: row.name,
            description: row.description,
            icon: row.icon,
            category: BadgeCategory::from_db(&row.category),
            rarity: BadgeRarity::from_db(&row.rarity),
            reward_xp: row.reward_xp,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct EarnedBadge {
    pub badge: Badge,
    pub earned_at: DateTime<Utc>,
}

impl From<EarnedBadgeRow> for EarnedBadge {
    fn from(row: EarnedBadgeRow) -> Self {
        Self {
            badge: Badge {
                id: row.id.into(),
                slug: row.slug,
                name: row.name,
                description: row.description,
                icon: row.icon,
                category: BadgeCategory::from_db(&row.category),
                rarity: BadgeRarity::from_db(&row.rarity),
                reward_xp: row.reward_xp,
            },
            earned_at: row.earned_at,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct RankedPlayer {
    pub rank: i64,
    pub user_id: ID,
    pub name: String,
    pub avatar_url: Option<String>,
    pub total_xp: i64,
    pub level: i32,
    pub league: League,
    pub badges: i64,
    pub matches_attended: i64,
}

impl From<RankedPlayerRow> for RankedPlayer {
    fn from(row: RankedPlayerRow) -> Self {
        Self {
            rank: row.rank,
            user_id: row.user_id.into(),
            name: row.name,
            avatar_url: row.avatar_url,
            total_xp: row.total_xp,
            level: row.level,
            league: League::from_db(&row.league),
            badges: row.badges,
            matches_attended: row.matches_attended,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct SportStats {
    pub sport_id: ID,
    pub sport_name: String,
    pub sport_icon: Option<String>,
    pub matches_played: i64,
    pub matches_missed: i64,
    pub matches_organized: i64,
    pub attendance_rate: f64,
}

impl From<infra::repos::SportStats> for SportStats {
    fn from(stats: infra::repos::SportStats) -> Self {
        Self {
            sport_id: stats.sport_id.into(),
            sport_name: stats.sport_name,
            sport_icon: stats.sport_icon,
            matches_played: stats.matches_played,
            matches_missed: stats.matches_missed,
            matches_organized: stats.matches_organized,
            attendance_rate: stats.attendance_rate,
        }
    }
}

/// One roster transition on the realtime feed.
#[derive(SimpleObject, Clone)]
pub struct RosterEvent {
    pub match_id: ID,
    pub participant_id: ID,
    pub user_id: ID,
    pub status: ParticipantStatus,
    pub kind: RosterEventKind,
}

impl RosterEvent {
    pub fn new(kind: RosterEventKind, participant: &ParticipantRow) -> Self {
        Self {
            match_id: participant.match_id.into(),
            participant_id: participant.id.into(),
            user_id: participant.user_id.into(),
            status: ParticipantStatus::from_db(&participant.status),
            kind,
        }
    }
}

/// One tick of the pre-match countdown stream.
#[derive(SimpleObject, Clone)]
pub struct CountdownFrame {
    pub match_id: ID,
    pub server_time: DateTime<Utc>,
    pub seconds_to_start: i64,
    pub confirmation_window_open: bool,
    pub status: MatchStatus,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(InputObject)]
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(InputObject)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

#[derive(InputObject)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(InputObject)]
pub struct RecurrenceInput {
    pub frequency: RecurrenceFrequency,
    /// How many occurrences to generate, clamped to 1..=52.
    pub count: i32,
}

#[derive(InputObject)]
pub struct CreateMatchInput {
    pub sport_id: ID,
    pub venue_id: Option<ID>,
    pub title: String,
    pub description: Option<String>,
    pub match_date: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    /// Defaults to the sport's usual quorum when omitted.
    pub min_players: Option<i32>,
    /// Defaults to the sport's usual capacity when omitted.
    pub max_players: Option<i32>,
    pub price: Option<Money>,
    pub skill_level: Option<SkillLevel>,
    pub gender: Option<GenderPolicy>,
    pub recurrence: Option<RecurrenceInput>,
}

#[derive(InputObject, Default)]
pub struct MatchFilterInput {
    pub sport_id: Option<ID>,
    pub city: Option<String>,
    pub skill_level: Option<SkillLevel>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub max_price: Option<Money>,
    /// Defaults to open + confirmed listings.
    pub statuses: Option<Vec<MatchStatus>>,
}

pub(crate) fn parse_id(id: &ID) -> Result<Uuid> {
    Uuid::parse_str(id.as_str()).map_err(|e| Error::new(e.to_string()))
}
