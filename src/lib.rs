//! # Deck Meta
//!
//! Swiss card-game tournament tracker with deck meta analytics.
//!
//! ## Architecture
//!
//! - **models**: Tournament records and derived statistics
//! - **calculate**: Standings, deck stats, matchups, leaderboards and the Deck Lab
//! - **live**: Editing session for the tournament being played
//! - **storage**: Live tournament persistence and JSON exports
//! - **archive**: Finished tournaments from a local directory or a remote site
//! - **catalog**: Deck catalog, name normalization and meta-share slices
//! - **fetch**: HTTP client with an on-disk body cache
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod archive;
pub mod calculate;
pub mod catalog;
pub mod config;
pub mod fetch;
pub mod live;
pub mod models;
pub mod storage;

pub use models::*;
