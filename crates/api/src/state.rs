use std::path::PathBuf;

use sqlx::PgPool;
use tokio::sync::broadcast;

use crate::auth::{AuthConfig, JwtService, PasswordResetService};
use crate::gql::types::RosterEvent;

/// Shared handles for the whole app: the pool, auth services, the
/// avatar storage root and the realtime roster feed.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    jwt_service: JwtService,
    password_resets: PasswordResetService,
    avatar_dir: PathBuf,
    roster_events: broadcast::Sender<RosterEvent>,
}

impl AppState {
    pub fn new(db: PgPool) -> anyhow::Result<Self> {
        let auth_config = AuthConfig::from_env()?;
        let jwt_service = JwtService::new(&auth_config);
        let avatar_dir = std::env::var("AVATAR_DIR")
            .unwrap_or_else(|_| "uploads/avatars".into())
            .into();
        let (roster_events, _) = broadcast::channel(100);

        Ok(Self {
            db,
            jwt_service,
            password_resets: PasswordResetService::new(),
            avatar_dir,
            roster_events,
        })
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn password_resets(&self) -> &PasswordResetService {
        &self.password_resets
    }

    pub fn avatar_dir(&self) -> &PathBuf {
        &self.avatar_dir
    }

    /// Fan a roster change out to every live subscription. A send error
    /// only means nobody is listening right now.
    pub fn publish_roster_event(&self, event: RosterEvent) {
        let _ = self.roster_events.send(event);
    }

    pub fn subscribe_roster_events(&self) -> broadcast::Receiver<RosterEvent> {
        self.roster_events.subscribe()
    }
}
