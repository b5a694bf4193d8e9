use async_graphql::{Context, Error, Object, Result, ID};
use chrono::Utc;
use uuid::Uuid;

use infra::leveling::{XP_MATCH_ATTENDED, XP_MATCH_CREATED};
use infra::recurrence;
use infra::repos::{
    AttendanceOutcome, BadgeRepo, ConfirmOutcome, CreateMatch, CreateProfile, CreateSeries,
    JoinOutcome, LeaveOutcome, MatchRepo, ParticipantRepo, ProfileRepo, RemoveOutcome, SeriesRepo,
    SportRepo, UpdateProfile, XpRepo,
};

use crate::auth::permissions::{require_organizer, require_user};
use crate::auth::PasswordService;
use crate::error::AppError;
use crate::gql::types::{self, RosterEvent, RosterEventKind};
use crate::state::AppState;

/// Attendance milestones that unlock a badge, by attended-match count.
const ATTENDANCE_MILESTONES: [(i64, &str); 4] = [
    (1, "estreante"),
    (10, "veterano"),
    (50, "maratonista"),
    (200, "lenda-da-varzea"),
];

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn sign_up(&self, ctx: &Context<'_>, input: types::SignUpInput) -> Result<types::AuthPayload> {
        let state = ctx.data::<AppState>()?;
        let repo = ProfileRepo::new(state.db.clone());

        PasswordService::validate_password_strength(&input.password).map_err(domain_error)?;
        if repo.get_by_email(&input.email).await?.is_some() {
            return Err(Error::new("Email already registered"));
        }

        let password_hash = PasswordService::hash_password(&input.password).map_err(domain_error)?;
        let profile = repo
            .create(CreateProfile {
                email: input.email,
                password_hash,
                name: input.name,
            })
            .await?;

        let token = state
            .jwt_service()
            .create_token(profile.id, profile.email.clone())
            .map_err(domain_error)?;

        Ok(types::AuthPayload {
            token,
            profile: profile.into(),
        })
    }

    /// Wrong email and wrong password come back indistinguishable.
    async fn sign_in(&self, ctx: &Context<'_>, input: types::SignInInput) -> Result<types::AuthPayload> {
        let state = ctx.data::<AppState>()?;
        let repo = ProfileRepo::new(state.db.clone());

        let Some(profile) = repo.get_by_email(&input.email).await? else {
            return Err(Error::new("Invalid credentials"));
        };
        let valid = PasswordService::verify_password(&input.password, &profile.password_hash)
            .map_err(domain_error)?;
        if !valid {
            return Err(Error::new("Invalid credentials"));
        }

        let token = state
            .jwt_service()
            .create_token(profile.id, profile.email.clone())
            .map_err(domain_error)?;

        Ok(types::AuthPayload {
            token,
            profile: profile.into(),
        })
    }

    /// Always answers true so the response never reveals whether an
    /// email is registered. The token itself goes to the log, delivery
    /// is out of scope here.
    async fn request_password_reset(&self, ctx: &Context<'_>, email: String) -> Result<bool> {
        let state = ctx.data::<AppState>()?;
        let repo = ProfileRepo::new(state.db.clone());

        if let Some(profile) = repo.get_by_email(&email).await? {
            let token = state.password_resets().issue(profile.id).await;
            tracing::info!("password reset token for {}: {}", profile.email, token);
        }

        Ok(true)
    }

    async fn reset_password(
        &self,
        ctx: &Context<'_>,
        token: String,
        new_password: String,
    ) -> Result<bool> {
        let state = ctx.data::<AppState>()?;
        let repo = ProfileRepo::new(state.db.clone());

        // Check the password before consuming the token, so a weak
        // choice does not burn the single-use token.
        PasswordService::validate_password_strength(&new_password).map_err(domain_error)?;
        let Some(user_id) = state.password_resets().consume(&token).await else {
            return Err(Error::new("Invalid or expired reset token"));
        };
        let password_hash = PasswordService::hash_password(&new_password).map_err(domain_error)?;

        if !repo.set_password_hash(user_id, &password_hash).await? {
            return Err(Error::new("Player not found"));
        }
        Ok(true)
    }

    async fn update_profile(
        &self,
        ctx: &Context<'_>,
        input: types::UpdateProfileInput,
    ) -> Result<types::Profile> {
        let user_id = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let repo = ProfileRepo::new(state.db.clone());

        let updated = repo
            .update(
                user_id,
                UpdateProfile {
                    name: input.name,
                    bio: input.bio,
                    phone: input.phone,
                    birth_date: input.birth_date,
                    city: input.city,
                    state: input.state,
                },
            )
            .await?;

        match updated {
            Some(row) => Ok(row.into()),
            None => Err(Error::new("Player not found")),
        }
    }

    /// Create a match, or a whole series of them when a recurrence is
    /// given. Returns every match created, kick-off ascending.
    async fn create_match(
        &self,
        ctx: &Context<'_>,
        input: types::CreateMatchInput,
    ) -> Result<Vec<types::Match>> {
        let user_id = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let sport_repo = SportRepo::new(state.db.clone());

        let sport_id = types::parse_id(&input.sport_id)?;
        let Some(sport) = sport_repo.get(sport_id).await? else {
            return Err(Error::new("Sport not found"));
        };
        if input.match_date <= Utc::now() {
            return Err(Error::new("Match date must be in the future"));
        }

        let min_players = input.min_players.unwrap_or(sport.default_min_players);
        let max_players = input.max_players.unwrap_or(sport.default_max_players);
        if min_players < 2 || max_players < min_players {
            return Err(Error::new("Invalid player limits"));
        }

        let template = CreateMatch {
            sport_id,
            venue_id: input.venue_id.map(|id| types::parse_id(&id)).transpose()?,
            organizer_id: user_id,
            title: input.title.clone(),
            description: input.description,
            match_date: input.match_date,
            duration_minutes: input.duration_minutes.unwrap_or(60),
            min_players,
            max_players,
            price_cents: input.price.map(|m| m.0).unwrap_or(0),
            skill_level: input
                .skill_level
                .unwrap_or(types::SkillLevel::Any)
                .as_str()
                .to_string(),
            gender: input
                .gender
                .unwrap_or(types::GenderPolicy::Mixed)
                .as_str()
                .to_string(),
        };

        let xp_repo = XpRepo::new(state.db.clone());
        let created = match input.recurrence {
            None => {
                let match_repo = MatchRepo::new(state.db.clone());
                let row = match_repo.create(template).await?;
                xp_repo
                    .award(
                        user_id,
                        XP_MATCH_CREATED,
                        "match_created",
                        &format!("Created match \"{}\"", input.title),
                    )
                    .await?;
                vec![row]
            }
            Some(rec) => {
                let count = rec.count.clamp(1, 52) as u32;
                let dates = recurrence::occurrences(input.match_date, rec.frequency.into(), count);
                let series_repo = SeriesRepo::new(state.db.clone());

                let data = CreateSeries {
                    organizer_id: user_id,
                    sport_id,
                    title: input.title.clone(),
                    description: template.description.clone(),
                    frequency: recurrence::Frequency::from(rec.frequency).as_str().to_string(),
                    start_date: *dates.first().unwrap_or(&input.match_date),
                    end_date: *dates.last().unwrap_or(&input.match_date),
                    occurrences: dates.len() as i32,
                };
                let (_series, matches) = series_repo.create_with_matches(data, template, &dates).await?;
                xp_repo
                    .award(
                        user_id,
                        XP_MATCH_CREATED * matches.len() as i32,
                        "match_created",
                        &format!("Created {} matches in series \"{}\"", matches.len(), input.title),
                    )
                    .await?;
                matches
            }
        };

        grant_badge(state, user_id, "organizador").await?;

        Ok(created.into_iter().map(Into::into).collect())
    }

    async fn cancel_match(&self, ctx: &Context<'_>, id: ID) -> Result<types::Match> {
        let user_id = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let repo = MatchRepo::new(state.db.clone());
        let id: Uuid = id.parse()?;

        let Some(match_row) = repo.get(id).await? else {
            return Err(Error::new("Match not found"));
        };
        require_organizer(user_id, match_row.organizer_id)?;

        match repo.cancel(id).await? {
            Some(row) => Ok(row.into()),
            None => Err(Error::new("Match is cancelled")),
        }
    }

    /// Take a seat, or queue up when the match is already at capacity.
    async fn join_match(&self, ctx: &Context<'_>, match_id: ID) -> Result<types::JoinResult> {
        let user_id = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let repo = ParticipantRepo::new(state.db.clone());
        let match_id: Uuid = match_id.parse()?;

        match repo.join(match_id, user_id).await? {
            JoinOutcome::Joined { participant, match_row } => {
                state.publish_roster_event(RosterEvent::new(RosterEventKind::Joined, &participant));
                Ok(types::JoinResult {
                    participant: participant.into(),
                    waitlist_position: None,
                    match_info: Some(match_row.into()),
                })
            }
            JoinOutcome::Waitlisted { participant, position } => {
                state.publish_roster_event(RosterEvent::new(RosterEventKind::Joined, &participant));
                Ok(types::JoinResult {
                    participant: participant.into(),
                    waitlist_position: Some(position),
                    match_info: None,
                })
            }
            JoinOutcome::AlreadyJoined => Err(Error::new("Already joined this match")),
            JoinOutcome::MatchNotFound => Err(Error::new("Match not found")),
            JoinOutcome::MatchCancelled => Err(Error::new("Match is cancelled")),
            JoinOutcome::MatchStarted => Err(Error::new("Match already started")),
        }
    }

    /// Give up the seat or the queue spot. Freed seats go to the
    /// earliest-joined waitlisted player.
    async fn leave_match(&self, ctx: &Context<'_>, match_id: ID) -> Result<types::Match> {
        let user_id = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let repo = ParticipantRepo::new(state.db.clone());
        let match_id: Uuid = match_id.parse()?;

        match repo.leave(match_id, user_id).await? {
            LeaveOutcome::Left { removed, promoted, match_row } => {
                state.publish_roster_event(RosterEvent::new(RosterEventKind::Left, &removed));
                if let Some(promoted) = &promoted {
                    state.publish_roster_event(RosterEvent::new(RosterEventKind::Promoted, promoted));
                }
                Ok(match_row.into())
            }
            LeaveOutcome::NotJoined => Err(Error::new("Not a participant of this match")),
            LeaveOutcome::MatchNotFound => Err(Error::new("Match not found")),
        }
    }

    /// Confirm presence inside the 48h window. Safe to repeat; the
    /// first confirmation timestamp sticks.
    async fn confirm_presence(&self, ctx: &Context<'_>, match_id: ID) -> Result<types::Participant> {
        let user_id = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let repo = ParticipantRepo::new(state.db.clone());
        let match_id: Uuid = match_id.parse()?;

        match repo.confirm(match_id, user_id).await? {
            ConfirmOutcome::Confirmed(participant) => {
                state.publish_roster_event(RosterEvent::new(
                    RosterEventKind::Confirmed,
                    &participant,
                ));
                Ok(participant.into())
            }
            ConfirmOutcome::OnWaitlist => Err(Error::new("Cannot confirm from the waitlist")),
            ConfirmOutcome::NotJoined => Err(Error::new("Not a participant of this match")),
            ConfirmOutcome::MatchNotFound => Err(Error::new("Match not found")),
            ConfirmOutcome::MatchCancelled => Err(Error::new("Match is cancelled")),
            ConfirmOutcome::MatchStarted => Err(Error::new("Match already started")),
        }
    }

    /// Organizer removes a participant; a seated decline frees the seat
    /// exactly like a leave.
    async fn decline_participant(
        &self,
        ctx: &Context<'_>,
        participant_id: ID,
    ) -> Result<types::Match> {
        let user_id = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let repo = ParticipantRepo::new(state.db.clone());
        let match_repo = MatchRepo::new(state.db.clone());
        let participant_id: Uuid = participant_id.parse()?;

        let Some(participant) = repo.get(participant_id).await? else {
            return Err(Error::new("Participant not found"));
        };
        let Some(match_row) = match_repo.get(participant.match_id).await? else {
            return Err(Error::new("Match not found"));
        };
        require_organizer(user_id, match_row.organizer_id)?;

        match repo.decline(participant_id).await? {
            RemoveOutcome::Removed { participant, promoted, match_row } => {
                state.publish_roster_event(RosterEvent::new(RosterEventKind::Declined, &participant));
                if let Some(promoted) = &promoted {
                    state.publish_roster_event(RosterEvent::new(RosterEventKind::Promoted, promoted));
                }
                Ok(match_row.into())
            }
            RemoveOutcome::NotFound => Err(Error::new("Participant not found")),
        }
    }

    /// Organizer bookkeeping once the match has kicked off. The first
    /// transition to attended pays out XP and may unlock badges.
    async fn mark_attendance(
        &self,
        ctx: &Context<'_>,
        participant_id: ID,
        attended: bool,
    ) -> Result<types::Participant> {
        let user_id = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let repo = ParticipantRepo::new(state.db.clone());
        let match_repo = MatchRepo::new(state.db.clone());
        let participant_id: Uuid = participant_id.parse()?;

        let Some(participant) = repo.get(participant_id).await? else {
            return Err(Error::new("Participant not found"));
        };
        let Some(match_row) = match_repo.get(participant.match_id).await? else {
            return Err(Error::new("Match not found"));
        };
        require_organizer(user_id, match_row.organizer_id)?;

        match repo.mark_attendance(participant_id, attended).await? {
            AttendanceOutcome::Marked { participant, first_attendance } => {
                if first_attendance {
                    let xp_repo = XpRepo::new(state.db.clone());
                    xp_repo
                        .award(
                            participant.user_id,
                            XP_MATCH_ATTENDED,
                            "match_participated",
                            &format!("Played \"{}\"", match_row.title),
                        )
                        .await?;

                    let attended_count = repo.attended_count(participant.user_id).await?;
                    for (threshold, slug) in ATTENDANCE_MILESTONES {
                        if attended_count >= threshold {
                            grant_badge(state, participant.user_id, slug).await?;
                        }
                    }
                }
                Ok(participant.into())
            }
            AttendanceOutcome::NotStarted => Err(Error::new("Match has not started yet")),
            AttendanceOutcome::NotFound => Err(Error::new("Participant not found")),
        }
    }

    /// Deactivate a series and cancel its future matches. Played or
    /// already-cancelled occurrences stay as they are.
    async fn cancel_series(&self, ctx: &Context<'_>, id: ID) -> Result<types::SeriesCancellation> {
        let user_id = require_user(ctx)?;
        let state = ctx.data::<AppState>()?;
        let repo = SeriesRepo::new(state.db.clone());
        let id: Uuid = id.parse()?;

        let Some(series) = repo.get(id).await? else {
            return Err(Error::new("Series not found"));
        };
        require_organizer(user_id, series.organizer_id)?;

        match repo.deactivate(id).await? {
            Some((series, cancelled)) => Ok(types::SeriesCancellation {
                series: series.into(),
                cancelled_matches: cancelled as i64,
            }),
            None => Err(Error::new("Series not found")),
        }
    }
}

/// Idempotent badge grant; pays the reward XP only on a fresh grant.
async fn grant_badge(state: &AppState, user_id: Uuid, slug: &str) -> Result<()> {
    let badge_repo = BadgeRepo::new(state.db.clone());
    if let Some(badge) = badge_repo.award(user_id, slug).await? {
        let xp_repo = XpRepo::new(state.db.clone());
        xp_repo
            .award(
                user_id,
                badge.reward_xp,
                "badge_earned",
                &format!("Earned badge \"{}\"", badge.name),
            )
            .await?;
        tracing::info!("user {} earned badge {}", user_id, badge.slug);
    }
    Ok(())
}

/// Unwrap the HTTP-flavored error wrapper so GraphQL clients see the
/// domain message alone.
fn domain_error(err: AppError) -> Error {
    match err {
        AppError::BadRequest(msg)
        | AppError::Unauthorized(msg)
        | AppError::NotFound(msg)
        | AppError::Internal(msg) => Error::new(msg),
        other => Error::new(other.to_string()),
    }
}
