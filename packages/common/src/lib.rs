pub mod config;
pub mod job;
pub mod retry;

pub use job::{JobArgs, JobState, PointsGranterArgs};
