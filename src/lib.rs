//! # Score Keeper
//!
//! Head-to-head game results texted in as one-line messages, recorded in a
//! spreadsheet and answered with running statistics.
//!
//! ## Architecture
//!
//! - **models**: Records, message log entries and the tracked pair
//! - **parser**: Message text → record, with format violations
//! - **sheets**: Range-addressed tabular store (Google Sheets, in-memory) and
//!   the header-growing session on top of it
//! - **calculate**: Win tallies and reply rendering
//! - **scoring**: The pipeline every entry point shares
//! - **messages**: Persisted message history
//! - **storage**: Blob storage for the message history
//! - **api**: HTTP front door (web UI, SMS webhook)
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod messages;
pub mod models;
pub mod parser;
pub mod scoring;
pub mod sheets;
pub mod storage;

pub use models::*;
