pub mod answer;
pub mod athlete;
pub mod auth;
pub mod discipline;
pub mod event;
pub mod question;
pub mod ranking;
pub mod shared;
pub mod user;
