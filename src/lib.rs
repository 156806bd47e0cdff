//! Hybrid Athlete Blueprint - 8-week hybrid training program tracker
//! with calorie-targeted meal plans
//!
//! Calisthenics and bodybuilding on a 5-day split, progressed week by week.

pub mod auth;
pub mod backend;
pub mod config;
pub mod local;
pub mod models;
pub mod nutrition;
pub mod program;
pub mod progress;
pub mod tui;
pub mod workout_log;

pub use backend::{Backend, BackendError, SqliteBackend, SupabaseBackend};
pub use config::Config;
pub use workout_log::{LogError, WorkoutSession};
