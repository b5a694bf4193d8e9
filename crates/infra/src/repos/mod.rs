pub mod badges;
pub mod matches;
pub mod participants;
pub mod profiles;
pub mod series;
pub mod sports;
pub mod stats;
pub mod venues;
pub mod xp;

pub use badges::BadgeRepo;
pub use matches::{CreateMatch, MatchFilter, MatchRepo};
pub use participants::{
    AttendanceOutcome, ConfirmOutcome, JoinOutcome, LeaveOutcome, ParticipantRepo, RemoveOutcome,
};
pub use profiles::{CreateProfile, ProfileRepo, UpdateProfile};
pub use series::{CreateSeries, SeriesRepo};
pub use sports::SportRepo;
pub use stats::{SportStats, StatsRepo};
pub use venues::VenueRepo;
pub use xp::XpRepo;
