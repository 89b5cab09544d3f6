//! # OmniverseTV Translation Worker (otv-tw)
//!
//! Background consumer of the translation queue. Each job is translated via
//! the external provider, persisted idempotently, and its enqueue lock is
//! released whatever the outcome, so the catalog service can always retry a
//! failed key later.

pub mod provider;
pub mod worker;
