//! PlayFab Fetcher Service
//!
//! Resolves a list of PlayFab IDs, pulls each player's combined info from the
//! PlayFab Client API with bounded concurrency, and upserts the normalized
//! records into a relational table.

pub mod client;
pub mod collector;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod ids;
pub mod logging;
pub mod models;
pub mod session;
pub mod store;


pub use client::{PlayFabClient, PlayerSource};
pub use config::FetcherConfig;
pub use error::{FetcherError, Result};
pub use fetcher::{run_pipeline, PlayFabFetcher, RunSummary};
pub use models::*;
pub use store::PlayerStore;
