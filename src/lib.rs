//! MLB player home-run odds ingestion.
//!
//! Scheduled jobs pull the MLB schedule and player home-run prop odds from
//! The Odds API, upsert them into PostgreSQL, and keep an append-only odds
//! history that the dashboard endpoints chart.

pub mod api;
pub mod calendar;
pub mod config;
pub mod error;
pub mod jobs;
pub mod provider;
pub mod scheduler;
pub mod store;

pub use config::Config;
pub use error::{IngestError, Result};
