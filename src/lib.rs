pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod leaderboard;
pub mod roster;
pub mod uwu;
