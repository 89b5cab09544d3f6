//! Development seed data
//!
//! Populates a handful of packages and channels so the read path can be
//! exercised end-to-end on a fresh database. Run via `--seed`; skipped when
//! the catalog already has rows.

use sqlx::{Pool, Sqlite};
use tracing::info;

use otv_common::Result;

pub async fn seed_catalog(pool: &Pool<Sqlite>) -> Result<()> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM packages")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        info!("Catalog already populated, skipping seed");
        return Ok(());
    }

    info!("Seeding catalog with demo packages and channels");

    let packages: &[(&str, &str, f64)] = &[
        (
            "Basic Multiverse Bundle",
            "Entry-level access to twelve curated dimensions of entertainment.",
            9.99,
        ),
        (
            "Cosmic Comedy Central",
            "The best of multiversal comedy, curated across infinite timelines.",
            14.99,
        ),
        (
            "Premium Omniverse Pass",
            "Every channel, every dimension, zero interdimensional roaming fees.",
            29.99,
        ),
    ];

    for (name, description, price) in packages {
        sqlx::query("INSERT INTO packages (name, description, price) VALUES (?, ?, ?)")
            .bind(name)
            .bind(description)
            .bind(price)
            .execute(pool)
            .await?;
    }

    let channels: &[(&str, &str, &str)] = &[
        (
            "Quantum News 24",
            "Round-the-clock updates from every timeline at once.",
            "Dimension Q-42",
        ),
        (
            "Gladiator Galaxy",
            "Live sports where the laws of physics are a suggestion.",
            "Dimension G-7",
        ),
        (
            "The Infinite Kitchen",
            "Cooking shows featuring ingredients that do not exist here yet.",
            "Dimension K-0",
        ),
    ];

    for (name, description, origin) in channels {
        sqlx::query("INSERT INTO channels (name, description, dimension_origin) VALUES (?, ?, ?)")
            .bind(name)
            .bind(description)
            .bind(origin)
            .execute(pool)
            .await?;
    }

    Ok(())
}
