use std::time::Duration;
use tokio::time::{interval, Interval};
use tracing::{error, info, warn};

use infra::repos::{ParticipantRepo, RemoveOutcome};

use crate::gql::types::{RosterEvent, RosterEventKind};
use crate::AppState;

/// How the sweeper decides a pending seat has expired.
#[derive(Debug, Clone, Copy)]
pub struct PresenceConfig {
    /// Seats release once kick-off is at most this close.
    pub release_hours: i64,
    /// Minimum seat tenure before a release is allowed, so late joiners
    /// keep time to react.
    pub join_grace_minutes: i64,
    pub sweep_seconds: u64,
}

impl PresenceConfig {
    pub fn from_env() -> Self {
        Self {
            release_hours: env_i64("PRESENCE_RELEASE_HOURS", 24),
            join_grace_minutes: env_i64("PRESENCE_JOIN_GRACE_MINUTES", 120),
            sweep_seconds: env_i64("PRESENCE_SWEEP_SECONDS", 60).max(1) as u64,
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub struct PresenceService {
    state: AppState,
    config: PresenceConfig,
    interval: Interval,
}

impl PresenceService {
    pub fn new(state: AppState, config: PresenceConfig) -> Self {
        let interval = interval(Duration::from_secs(config.sweep_seconds));

        Self { state, config, interval }
    }

    /// Run the deadline sweeper until the process exits.
    pub async fn run(&mut self) {
        info!(
            "Starting presence service (release {}h before kick-off, {}min join grace)",
            self.config.release_hours, self.config.join_grace_minutes
        );

        loop {
            self.interval.tick().await;

            if let Err(e) = self.sweep().await {
                error!("Presence sweep failed: {}", e);
            }
        }
    }

    /// Release every overdue unconfirmed seat, one transaction each, and
    /// put the transitions on the roster feed.
    async fn sweep(&self) -> Result<(), sqlx::Error> {
        let repo = ParticipantRepo::new(self.state.db.clone());
        let due = repo
            .releasable(
                self.config.release_hours * 3600,
                self.config.join_grace_minutes * 60,
            )
            .await?;
        if due.is_empty() {
            return Ok(());
        }

        let mut released = 0usize;
        let mut promoted = 0usize;
        for participant_id in due {
            match repo.release(participant_id).await {
                Ok(RemoveOutcome::Removed { participant, promoted: next, .. }) => {
                    released += 1;
                    self.state.publish_roster_event(RosterEvent::new(
                        RosterEventKind::Released,
                        &participant,
                    ));
                    if let Some(next) = next {
                        promoted += 1;
                        self.state.publish_roster_event(RosterEvent::new(
                            RosterEventKind::Promoted,
                            &next,
                        ));
                    }
                }
                // Confirmed or gone between the scan and the release.
                Ok(RemoveOutcome::NotFound) => {}
                Err(e) => {
                    warn!("Failed to release participant {}: {}", participant_id, e);
                }
            }
        }

        if released > 0 {
            info!(
                "Released {} unconfirmed seats ({} promoted from waitlists)",
                released, promoted
            );
        }
        Ok(())
    }
}

/// Spawn the presence service as a background task next to the server.
pub fn spawn_presence_service(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut service = PresenceService::new(state, PresenceConfig::from_env());
        service.run().await;
    })
}
