//! Translation store
//!
//! Durable home of finished translations, keyed by
//! (item_kind, item_id, language_code). Rows are created only by the
//! translation worker; the request path just reads.

use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::{ItemKind, Translation};

/// Store contract used by the orchestrator (read) and the worker (write).
#[async_trait]
pub trait TranslationStore: Send + Sync {
    /// Look up a finished translation; `None` when it does not exist yet.
    async fn find_translation(
        &self,
        kind: ItemKind,
        item_id: i64,
        language_code: &str,
    ) -> Result<Option<Translation>>;

    /// Insert a translation unless its natural key already exists.
    ///
    /// Returns the stored row and whether this call created it. A duplicate
    /// job redelivered by the queue lands here as `(existing, false)`.
    async fn find_or_create(&self, translation: Translation) -> Result<(Translation, bool)>;
}

#[derive(sqlx::FromRow)]
struct TranslationRow {
    item_kind: String,
    item_id: i64,
    language_code: String,
    translated_name: String,
    translated_description: String,
}

impl TranslationRow {
    fn into_translation(self) -> Result<Translation> {
        Ok(Translation {
            item_kind: ItemKind::from_str(&self.item_kind)
                .map_err(|_| Error::Internal(format!("Corrupt item_kind row: {}", self.item_kind)))?,
            item_id: self.item_id,
            language_code: self.language_code,
            translated_name: self.translated_name,
            translated_description: self.translated_description,
        })
    }
}

/// SQLite-backed translation store.
#[derive(Clone)]
pub struct SqliteTranslationStore {
    pool: Pool<Sqlite>,
}

impl SqliteTranslationStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TranslationStore for SqliteTranslationStore {
    async fn find_translation(
        &self,
        kind: ItemKind,
        item_id: i64,
        language_code: &str,
    ) -> Result<Option<Translation>> {
        let row = sqlx::query_as::<_, TranslationRow>(
            r#"
            SELECT item_kind, item_id, language_code, translated_name, translated_description
            FROM translations
            WHERE item_kind = ? AND item_id = ? AND language_code = ?
            "#,
        )
        .bind(kind.as_str())
        .bind(item_id)
        .bind(language_code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TranslationRow::into_translation).transpose()
    }

    async fn find_or_create(&self, translation: Translation) -> Result<(Translation, bool)> {
        // INSERT .. ON CONFLICT DO NOTHING keeps this race-safe against a
        // concurrent worker holding a redelivered copy of the same job.
        let result = sqlx::query(
            r#"
            INSERT INTO translations
                (item_kind, item_id, language_code, translated_name, translated_description)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (item_kind, item_id, language_code) DO NOTHING
            "#,
        )
        .bind(translation.item_kind.as_str())
        .bind(translation.item_id)
        .bind(&translation.language_code)
        .bind(&translation.translated_name)
        .bind(&translation.translated_description)
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() > 0;

        let stored = self
            .find_translation(
                translation.item_kind,
                translation.item_id,
                &translation.language_code,
            )
            .await?
            .ok_or_else(|| {
                Error::Internal(format!(
                    "Translation for {}:{}:{} vanished after insert",
                    translation.item_kind, translation.item_id, translation.language_code
                ))
            })?;

        Ok((stored, created))
    }
}
