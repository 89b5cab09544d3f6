//! Catalog and translation domain types
//!
//! Shared between the catalog service (request path) and the translation
//! worker. Wire shapes follow the public catalog API: item fields at the top
//! level, translation state in an optional `translation` block.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Kind discriminator for translatable catalog items.
///
/// Serialized as `"package"` / `"channel"` in job payloads, cache keys and
/// database rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Package,
    Channel,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Package => "package",
            ItemKind::Channel => "channel",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "package" | "packages" => Ok(ItemKind::Package),
            "channel" | "channels" => Ok(ItemKind::Channel),
            other => Err(Error::InvalidInput(format!(
                "Unknown catalog item kind: {}",
                other
            ))),
        }
    }
}

/// Uniform read-only view over a catalog item (package or channel).
///
/// `price` is populated for packages, `dimension_origin` for channels; the
/// translation pipeline itself only ever touches `name` and `description`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub kind: ItemKind,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_origin: Option<String>,
}

/// A finished translation as persisted in the translation store.
///
/// At most one row exists per (item_kind, item_id, language_code).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub item_kind: ItemKind,
    pub item_id: i64,
    pub language_code: String,
    pub translated_name: String,
    pub translated_description: String,
}

/// Payload enqueued for the translation worker.
///
/// Carries the original text so the worker never has to re-read the catalog.
/// Queue bookkeeping (job id, attempt counter) is added by the queue layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationJob {
    pub item_kind: ItemKind,
    pub item_id: i64,
    pub language_code: String,
    pub original_name: String,
    pub original_description: String,
}

/// Translation progress as reported to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    Completed,
    Pending,
}

/// The `translation` block of a catalog read response.
///
/// `completed` carries the translated text; `pending` carries a localized
/// retry-later message. This same JSON shape is what gets cached under the
/// result key, so a cache hit deserializes straight into the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationBlock {
    pub status: TranslationStatus,
    pub language_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TranslationBlock {
    /// Block for a finished translation.
    pub fn completed(language_code: &str, name: String, description: String) -> Self {
        Self {
            status: TranslationStatus::Completed,
            language_code: language_code.to_string(),
            name: Some(name),
            description: Some(description),
            message: None,
        }
    }

    /// Block for a translation that is still being produced.
    pub fn pending(language_code: &str, message: String) -> Self {
        Self {
            status: TranslationStatus::Pending,
            language_code: language_code.to_string(),
            name: None,
            description: None,
            message: Some(message),
        }
    }
}

/// Full catalog read response: the item, plus translation state when a
/// language was requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatedItemView {
    #[serde(flatten)]
    pub item: CatalogItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationBlock>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_kind_parses_singular_and_plural() {
        assert_eq!("package".parse::<ItemKind>().unwrap(), ItemKind::Package);
        assert_eq!("channels".parse::<ItemKind>().unwrap(), ItemKind::Channel);
        assert!("movie".parse::<ItemKind>().is_err());
    }

    #[test]
    fn completed_block_serializes_without_message() {
        let block = TranslationBlock::completed("fr", "Nom".into(), "Desc".into());
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["languageCode"], "fr");
        assert_eq!(json["name"], "Nom");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn pending_block_serializes_without_text_fields() {
        let block = TranslationBlock::pending("de", "bitte warten".into());
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("name").is_none());
        assert!(json.get("description").is_none());
        assert_eq!(json["message"], "bitte warten");
    }
}
