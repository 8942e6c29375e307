pub mod answer;
pub mod athlete;
pub mod athlete_discipline;
pub mod discipline;
pub mod event;
pub mod job;
pub mod question;
pub mod role;
pub mod user;
pub mod user_role;
