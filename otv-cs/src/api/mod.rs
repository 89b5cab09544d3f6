//! HTTP API for the catalog service

pub mod handlers;
pub mod server;

pub use server::{create_router, AppState};
