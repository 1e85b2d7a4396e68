//! cellar-core library.
//!
//! # Conventions
//!
//! - **Errors**: `anyhow::Result` for application helpers (open, config,
//!   import); typed [`merge::MergeError`] for merge operations.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod merge;
pub mod model;
