//! Catalog lookup
//!
//! Read-only resolution of packages and channels into the uniform
//! [`CatalogItem`] view. The translation pipeline is kind-agnostic from
//! here on; the kind only selects the table.

use async_trait::async_trait;
use otv_common::types::{CatalogItem, ItemKind};
use otv_common::Result;
use sqlx::{Pool, Sqlite};

/// Catalog resolution contract used by the orchestrator.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Resolve an item by kind and id; `None` when it does not exist.
    async fn find_item(&self, kind: ItemKind, item_id: i64) -> Result<Option<CatalogItem>>;
}

#[derive(sqlx::FromRow)]
struct PackageRow {
    id: i64,
    name: String,
    description: String,
    price: f64,
}

#[derive(sqlx::FromRow)]
struct ChannelRow {
    id: i64,
    name: String,
    description: String,
    dimension_origin: Option<String>,
}

/// SQLite-backed catalog lookup.
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: Pool<Sqlite>,
}

impl SqliteCatalog {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogLookup for SqliteCatalog {
    async fn find_item(&self, kind: ItemKind, item_id: i64) -> Result<Option<CatalogItem>> {
        match kind {
            ItemKind::Package => {
                let row = sqlx::query_as::<_, PackageRow>(
                    "SELECT id, name, description, price FROM packages WHERE id = ?",
                )
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await?;

                Ok(row.map(|p| CatalogItem {
                    id: p.id,
                    kind: ItemKind::Package,
                    name: p.name,
                    description: p.description,
                    price: Some(p.price),
                    dimension_origin: None,
                }))
            }
            ItemKind::Channel => {
                let row = sqlx::query_as::<_, ChannelRow>(
                    "SELECT id, name, description, dimension_origin FROM channels WHERE id = ?",
                )
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await?;

                Ok(row.map(|c| CatalogItem {
                    id: c.id,
                    kind: ItemKind::Channel,
                    name: c.name,
                    description: c.description,
                    price: None,
                    dimension_origin: c.dimension_origin,
                }))
            }
        }
    }
}
