use std::collections::HashMap;

use async_graphql::{Context, Error, Object, Result, ID};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use infra::pagination::LimitOffset;
use infra::repos::{
    BadgeRepo, MatchFilter, MatchRepo, ParticipantRepo, ProfileRepo, SeriesRepo, SportRepo,
    StatsRepo, VenueRepo, XpRepo,
};
use infra::{recurrence, roster};

use crate::auth::permissions::require_user;
use crate::gql::types::{self, parse_id};
use crate::state::AppState;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Current server time (UTC); doubles as an API liveness probe.
    async fn server_time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sports(&self, ctx: &Context<'_>) -> Result<Vec<types::Sport>> {
        let state = ctx.data::<AppState>()?;
        let repo = SportRepo::new(state.db.clone());
        let rows = repo.list_all().await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn venues(&self, ctx: &Context<'_>, city: Option<String>) -> Result<Vec<types::Venue>> {
        let state = ctx.data::<AppState>()?;
        let repo = VenueRepo::new(state.db.clone());
        let rows = repo.list(city).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Upcoming matches, newest kick-off last. Defaults to open and
    /// confirmed listings unless the filter says otherwise.
    async fn matches(
        &self,
        ctx: &Context<'_>,
        filter: Option<types::MatchFilterInput>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<types::Match>> {
        let state = ctx.data::<AppState>()?;
        let repo = MatchRepo::new(state.db.clone());

        let filter = filter.unwrap_or_default();
        let statuses = match filter.statuses {
            Some(wanted) if !wanted.is_empty() => {
                wanted.iter().map(|s| s.as_str().to_string()).collect()
            }
            _ => vec!["open".to_string(), "confirmed".to_string()],
        };
        let match_filter = MatchFilter {
            sport_id: filter.sport_id.map(|id| parse_id(&id)).transpose()?,
            city: filter.city,
            skill_level: filter.skill_level.map(|s| s.as_str().to_string()),
            from: filter.date_from,
            to: filter.date_to,
            max_price_cents: filter.max_price.map(|m| m.0),
            statuses,
        };
        let page = Some(LimitOffset::page(limit, offset, 100));

        let rows = repo.list(match_filter, page).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[graphql(name = "match")]
    async fn match_by_id(&self, ctx: &Context<'_>, id: ID) -> Result<Option<types::Match>> {
        let state = ctx.data::<AppState>()?;
        let repo = MatchRepo::new(state.db.clone());
        let id: Uuid = id.parse()?;

        Ok(repo.get(id).await?.map(Into::into))
    }

    /// Seated players plus the waitlist in promotion order.
    async fn match_roster(&self, ctx: &Context<'_>, match_id: ID) -> Result<types::Roster> {
        let state = ctx.data::<AppState>()?;
        let match_repo = MatchRepo::new(state.db.clone());
        let participant_repo = ParticipantRepo::new(state.db.clone());
        let match_id: Uuid = match_id.parse()?;

        let Some(match_row) = match_repo.get(match_id).await? else {
            return Err(Error::new("Match not found"));
        };

        let now = Utc::now();
        let players = participant_repo
            .roster(match_id)
            .await?
            .into_iter()
            .map(|row| {
                let needs_confirmation = roster::ParticipantStatus::parse(&row.status)
                    .map(|status| {
                        roster::needs_confirmation(
                            now,
                            match_row.match_date,
                            status,
                            row.confirmed_at,
                        )
                    })
                    .unwrap_or(false);
                types::RosterEntry {
                    participant: row.into(),
                    needs_confirmation,
                }
            })
            .collect();

        let waitlist = participant_repo
            .waitlist(match_id)
            .await?
            .into_iter()
            .enumerate()
            .map(|(i, row)| types::WaitlistEntry {
                participant: row.into(),
                position: i as i64 + 1,
            })
            .collect();

        Ok(types::Roster {
            match_id: match_row.id.into(),
            players,
            waitlist,
        })
    }

    /// The caller's active participations in upcoming matches.
    async fn my_matches(&self, ctx: &Context<'_>) -> Result<Vec<types::Participation>> {
        let user_id = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let participant_repo = ParticipantRepo::new(state.db.clone());
        let match_repo = MatchRepo::new(state.db.clone());

        let participants = participant_repo.list_upcoming_for_user(user_id).await?;
        let match_ids: Vec<Uuid> = participants.iter().map(|p| p.match_id).collect();
        let matches: HashMap<Uuid, _> = match_repo
            .get_many(&match_ids)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        Ok(participants
            .into_iter()
            .filter_map(|p| {
                matches.get(&p.match_id).cloned().map(|m| types::Participation {
                    match_info: m.into(),
                    participant: p.into(),
                })
            })
            .collect())
    }

    async fn me(&self, ctx: &Context<'_>) -> Result<types::Profile> {
        let user_id = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let repo = ProfileRepo::new(state.db.clone());

        match repo.get(user_id).await? {
            Some(row) => Ok(row.into()),
            None => Err(Error::new("Player not found")),
        }
    }

    async fn player(&self, ctx: &Context<'_>, id: ID) -> Result<Option<types::Player>> {
        let state = ctx.data::<AppState>()?;
        let repo = ProfileRepo::new(state.db.clone());
        let id: Uuid = id.parse()?;

        Ok(repo.get(id).await?.map(Into::into))
    }

    /// Per-sport attendance and organizing aggregates for a player.
    async fn player_stats(&self, ctx: &Context<'_>, user_id: ID) -> Result<Vec<types::SportStats>> {
        let state = ctx.data::<AppState>()?;
        let repo = StatsRepo::new(state.db.clone());
        let user_id: Uuid = user_id.parse()?;

        let stats = repo.per_sport(user_id).await?;
        Ok(stats.into_iter().map(Into::into).collect())
    }

    async fn badges(&self, ctx: &Context<'_>) -> Result<Vec<types::Badge>> {
        let state = ctx.data::<AppState>()?;
        let repo = BadgeRepo::new(state.db.clone());
        let rows = repo.list_all().await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn player_badges(
        &self,
        ctx: &Context<'_>,
        user_id: ID,
    ) -> Result<Vec<types::EarnedBadge>> {
        let state = ctx.data::<AppState>()?;
        let repo = BadgeRepo::new(state.db.clone());
        let user_id: Uuid = user_id.parse()?;

        let rows = repo.list_for_user(user_id).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// The caller's XP account. A fresh account reads as zero XP in
    /// bronze rather than an error.
    async fn my_xp(&self, ctx: &Context<'_>) -> Result<types::XpSummary> {
        let user_id = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let repo = XpRepo::new(state.db.clone());

        match repo.account(user_id).await? {
            Some(account) => Ok(account.into()),
            None => Ok(types::XpSummary {
                total_xp: 0,
                level: 1,
                league: types::League::Bronze,
                xp_for_current_level: 0,
                xp_for_next_level: infra::leveling::xp_for_level(2),
                progress_to_next_level: 0.0,
            }),
        }
    }

    async fn xp_history(
        &self,
        ctx: &Context<'_>,
        kind: Option<types::XpReason>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<types::XpTransaction>> {
        let user_id = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let repo = XpRepo::new(state.db.clone());

        let page = Some(LimitOffset::page(limit, offset, 100));
        let rows = repo
            .history(user_id, kind.map(|k| k.as_str().to_string()), page)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn leaderboard(
        &self,
        ctx: &Context<'_>,
        limit: Option<i64>,
    ) -> Result<Vec<types::RankedPlayer>> {
        let state = ctx.data::<AppState>()?;
        let repo = XpRepo::new(state.db.clone());

        let rows = repo.leaderboard(limit.unwrap_or(100).clamp(1, 100)).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn my_series(&self, ctx: &Context<'_>) -> Result<Vec<types::Series>> {
        let user_id = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let repo = SeriesRepo::new(state.db.clone());

        let rows = repo.list_by_organizer(user_id).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Dates a recurrence would generate, without creating anything.
    async fn series_preview(
        &self,
        start: DateTime<Utc>,
        frequency: types::RecurrenceFrequency,
        count: i32,
    ) -> Vec<DateTime<Utc>> {
        recurrence::occurrences(start, frequency.into(), count.clamp(1, 52) as u32)
    }
}
