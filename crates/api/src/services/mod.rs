pub mod presence;

pub use presence::{spawn_presence_service, PresenceConfig, PresenceService};
