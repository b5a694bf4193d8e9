pub mod db;
pub mod leveling;
pub mod models;
pub mod pagination;
pub mod recurrence;
pub mod repos;
pub mod roster;
