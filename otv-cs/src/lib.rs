//! # OmniverseTV Catalog Service (otv-cs)
//!
//! Serves catalog reads over HTTP and coordinates on-demand translation:
//! cache lookup, durable store lookup, and lock-guarded enqueueing of
//! asynchronous translation work. The service never blocks a request on a
//! translation being produced; callers poll until the work completes.

pub mod api;
pub mod db;
pub mod error;
pub mod seed;
pub mod translation;
