use std::time::Duration as StdDuration;

use async_graphql::{Context, Error, Result, Subscription, ID};
use chrono::Utc;
use futures_util::Stream;
use tokio::time::interval;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use infra::repos::MatchRepo;
use infra::roster;

use crate::gql::types::{CountdownFrame, MatchStatus, RosterEvent};
use crate::state::AppState;

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Live roster transitions, optionally narrowed to one match.
    /// Receivers that fall behind the broadcast skip the missed events.
    async fn roster_events(
        &self,
        ctx: &Context<'_>,
        match_id: Option<ID>,
    ) -> Result<impl Stream<Item = RosterEvent>> {
        let state = ctx.data::<AppState>()?;
        let wanted = match match_id {
            Some(id) => Some(id.parse::<Uuid>()?.to_string()),
            None => None,
        };

        let receiver = state.subscribe_roster_events();
        Ok(BroadcastStream::new(receiver).filter_map(move |event| match event {
            Ok(event) => match &wanted {
                Some(id) if event.match_id.as_str() != id => None,
                _ => Some(event),
            },
            Err(_) => None,
        }))
    }

    /// One frame per second until kick-off (or cancellation), tracking
    /// the seat counter and whether the confirmation window is open.
    async fn match_countdown(
        &self,
        ctx: &Context<'_>,
        match_id: ID,
    ) -> Result<impl Stream<Item = CountdownFrame>> {
        let state = ctx.data::<AppState>()?.clone();
        let match_id: Uuid = match_id.parse()?;

        let repo = MatchRepo::new(state.db.clone());
        if repo.get(match_id).await?.is_none() {
            return Err(Error::new("Match not found"));
        }

        let mut ticker = interval(StdDuration::from_secs(1));

        Ok(async_stream::stream! {
            loop {
                ticker.tick().await;

                let repo = MatchRepo::new(state.db.clone());
                let Ok(Some(match_row)) = repo.get(match_id).await else {
                    break;
                };

                let now = Utc::now();
                let seconds_to_start = (match_row.match_date - now).num_seconds();
                let status = MatchStatus::from_db(&match_row.status);
                let frame = CountdownFrame {
                    match_id: match_row.id.into(),
                    server_time: now,
                    seconds_to_start: seconds_to_start.max(0),
                    confirmation_window_open: roster::in_confirmation_window(
                        now,
                        match_row.match_date,
                    ),
                    status,
                };

                let finished = seconds_to_start <= 0 || status == MatchStatus::Cancelled;
                yield frame;
                if finished {
                    break;
                }
            }
        })
    }
}
