//! # OmniverseTV Common Library
//!
//! Shared code for the OmniverseTV backend services including:
//! - Error types
//! - Catalog and translation domain types
//! - Redis cache client and key derivation
//! - Redis-backed translation job queue
//! - Durable translation store (SQLite)
//! - Configuration loading
//! - Localized pending messages

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod localization;
pub mod queue;
pub mod types;

pub use error::{Error, Result};
