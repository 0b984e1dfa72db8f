//! Wire types for the remote catalog service.
//!
//! Remote payloads are loosely shaped, so optional fields default rather than
//! failing the whole page, and each catalog entry is decoded independently.

use std::num::NonZeroU32;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Extension used when an item carries none.
pub const DEFAULT_FILE_EXTENSION: &str = "mp4";

/// Variation tag marking the original upload.
const SOURCE_VARIATION: &str = "source";

/// A delivery option for a media item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Variation {
    /// Variation kind, e.g. `source`, `high_res_proxy_mp4`.
    #[serde(default, rename = "type", deserialize_with = "deserialize_non_empty")]
    pub kind: Option<String>,
    /// Human-readable label; some payloads tag `source` here instead of `type`.
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub label: Option<String>,
    /// Download URL (pre-signed; needs no auth headers).
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub url: Option<String>,
}

impl Variation {
    /// Returns true if this variation is tagged as the original upload.
    #[must_use]
    pub fn is_source(&self) -> bool {
        self.kind.as_deref() == Some(SOURCE_VARIATION)
            || self.label.as_deref() == Some(SOURCE_VARIATION)
    }
}

/// Remote media item descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaItem {
    /// Stable unique key; the only field guaranteed non-empty.
    #[serde(default, deserialize_with = "deserialize_item_id")]
    pub id: String,
    /// Remote filename, if the service reports one.
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub filename: Option<String>,
    /// File extension without the dot.
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub file_extension: Option<String>,
    /// Remote size in bytes, when known.
    #[serde(default, deserialize_with = "deserialize_size")]
    pub file_size: Option<u64>,
    /// Delivery options in server order.
    #[serde(default, deserialize_with = "deserialize_variations")]
    pub variations: Vec<Variation>,
    /// Creation timestamp as reported by the service.
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub created_at: Option<String>,
    /// Media type (`Video`, `Photo`, `MultiClipEdit`, ...).
    #[serde(default, rename = "type", deserialize_with = "deserialize_non_empty")]
    pub media_type: Option<String>,
}

impl MediaItem {
    /// Creates a bare item with only an id, mostly useful in tests.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filename: None,
            file_extension: None,
            file_size: None,
            variations: Vec::new(),
            created_at: None,
            media_type: None,
        }
    }

    /// Returns the file extension, defaulting to `mp4`.
    #[must_use]
    pub fn extension(&self) -> &str {
        self.file_extension
            .as_deref()
            .map_or(DEFAULT_FILE_EXTENSION, |ext| ext.trim_start_matches('.'))
    }

    /// Returns the reported filename or `{id}.{extension}`.
    #[must_use]
    pub fn resolved_filename(&self) -> String {
        match &self.filename {
            Some(name) => name.clone(),
            None => format!("{}.{}", self.id, self.extension()),
        }
    }

    /// Returns the URL of the first `source` variation, if any.
    #[must_use]
    pub fn source_url(&self) -> Option<&str> {
        self.variations
            .iter()
            .filter(|v| v.is_source())
            .find_map(|v| v.url.as_deref().filter(|u| !u.is_empty()))
    }

    /// Decodes one catalog entry, returning `None` when it has no usable id.
    pub(crate) fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value::<Self>(value)
            .ok()
            .filter(|item| !item.id.trim().is_empty())
    }
}

/// Catalog page cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageLimit {
    /// Fetch until the catalog is exhausted.
    #[default]
    Unbounded,
    /// Fetch at most this many pages.
    Pages(NonZeroU32),
}

impl PageLimit {
    /// Builds a limit from an optional count; `None` or `0` means unbounded.
    #[must_use]
    pub fn from_option(pages: Option<u32>) -> Self {
        pages
            .and_then(NonZeroU32::new)
            .map_or(Self::Unbounded, Self::Pages)
    }

    /// Returns true if `page` (1-indexed) is beyond the cap.
    #[must_use]
    pub fn exceeded_by(self, page: u32) -> bool {
        match self {
            Self::Unbounded => false,
            Self::Pages(max) => page > max.get(),
        }
    }
}

/// One page of the catalog response.
#[derive(Debug, Default, Deserialize)]
pub struct MediaPage {
    #[serde(default, rename = "_embedded")]
    embedded: Embedded,
    #[serde(default, rename = "_pages")]
    pages: Option<PageInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct Embedded {
    #[serde(default)]
    media: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct PageInfo {
    #[serde(default, deserialize_with = "deserialize_size")]
    total_pages: Option<u64>,
}

impl MediaPage {
    /// Number of raw entries on the page, including undecodable ones.
    #[must_use]
    pub fn raw_len(&self) -> usize {
        self.embedded.media.len()
    }

    /// Server-declared total page count, if present.
    #[must_use]
    pub fn total_pages(&self) -> Option<u64> {
        self.pages.as_ref().and_then(|p| p.total_pages)
    }

    /// Consumes the page into decoded items, dropping entries without an id.
    ///
    /// Returns the items and the number of dropped entries.
    #[must_use]
    pub fn into_items(self) -> (Vec<MediaItem>, usize) {
        let raw = self.embedded.media.len();
        let items: Vec<MediaItem> = self
            .embedded
            .media
            .into_iter()
            .filter_map(MediaItem::from_value)
            .collect();
        let dropped = raw - items.len();
        (items, dropped)
    }
}

/// Subset of the current-user response.
#[derive(Debug, Default, Deserialize)]
pub struct CurrentUser {
    #[serde(default, deserialize_with = "deserialize_id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_id")]
    user_id: Option<String>,
}

impl CurrentUser {
    /// Returns `id`, falling back to `user_id`.
    #[must_use]
    pub fn into_id(self) -> Option<String> {
        self.id.or(self.user_id)
    }
}

fn deserialize_non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts a number or a numeric string; anything else becomes `None`.
fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Numeric ids are accepted; a missing id decodes as empty and is dropped later.
fn deserialize_item_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_id(deserializer)?.unwrap_or_default())
}

/// Skips malformed variation entries instead of rejecting the item.
fn deserialize_variations<'de, D>(deserializer: D) -> Result<Vec<Variation>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::Array(entries)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolved_filename_prefers_remote_name() {
        let mut item = MediaItem::new("abc");
        item.filename = Some("GX010001.MP4".to_string());
        assert_eq!(item.resolved_filename(), "GX010001.MP4");
    }

    #[test]
    fn test_resolved_filename_synthesizes_from_id_and_extension() {
        let mut item = MediaItem::new("abc");
        item.file_extension = Some("jpg".to_string());
        assert_eq!(item.resolved_filename(), "abc.jpg");
    }

    #[test]
    fn test_resolved_filename_defaults_to_mp4() {
        assert_eq!(MediaItem::new("abc").resolved_filename(), "abc.mp4");
    }

    #[test]
    fn test_empty_filename_is_treated_as_absent() {
        let item = MediaItem::from_value(json!({"id": "x1", "filename": "", "file_extension": "360"}))
            .unwrap();
        assert_eq!(item.resolved_filename(), "x1.360");
    }

    #[test]
    fn test_source_url_matches_type_or_label() {
        let by_type = MediaItem::from_value(json!({
            "id": "a",
            "variations": [
                {"type": "high", "url": "https://cdn/high"},
                {"type": "source", "url": "https://cdn/source"}
            ]
        }))
        .unwrap();
        assert_eq!(by_type.source_url(), Some("https://cdn/source"));

        let by_label = MediaItem::from_value(json!({
            "id": "b",
            "variations": [{"label": "source", "url": "https://cdn/label"}]
        }))
        .unwrap();
        assert_eq!(by_label.source_url(), Some("https://cdn/label"));
    }

    #[test]
    fn test_source_url_absent_without_source_variation() {
        let item = MediaItem::from_value(json!({
            "id": "a",
            "variations": [{"type": "high", "url": "https://cdn/high"}]
        }))
        .unwrap();
        assert_eq!(item.source_url(), None);
    }

    #[test]
    fn test_file_size_accepts_number_or_string() {
        let numeric = MediaItem::from_value(json!({"id": "a", "file_size": 1000})).unwrap();
        assert_eq!(numeric.file_size, Some(1000));
        let textual = MediaItem::from_value(json!({"id": "a", "file_size": "2048"})).unwrap();
        assert_eq!(textual.file_size, Some(2048));
        let junk = MediaItem::from_value(json!({"id": "a", "file_size": "n/a"})).unwrap();
        assert_eq!(junk.file_size, None);
    }

    #[test]
    fn test_off_type_optional_fields_keep_the_item() {
        let created = MediaItem::from_value(json!({"id": "abc", "created_at": 1_700_000_000})).unwrap();
        assert_eq!(created.created_at.as_deref(), Some("1700000000"));

        let named = MediaItem::from_value(json!({"id": "def", "filename": 12345})).unwrap();
        assert_eq!(named.resolved_filename(), "12345");

        let typed = MediaItem::from_value(json!({"id": "ghi", "type": {"k": 1}})).unwrap();
        assert_eq!(typed.media_type, None);

        let odd = MediaItem::from_value(json!({
            "id": "jkl",
            "file_extension": ["mp4"],
            "filename": null,
            "variations": [{"type": "source", "label": 7, "url": "https://cdn/s"}]
        }))
        .unwrap();
        assert_eq!(odd.resolved_filename(), "jkl.mp4");
        assert_eq!(odd.source_url(), Some("https://cdn/s"));
    }

    #[test]
    fn test_item_without_id_is_dropped() {
        assert!(MediaItem::from_value(json!({"filename": "orphan.mp4"})).is_none());
        assert!(MediaItem::from_value(json!({"id": ""})).is_none());
    }

    #[test]
    fn test_malformed_variation_is_skipped() {
        let item = MediaItem::from_value(json!({
            "id": "a",
            "variations": [42, {"type": "source", "url": "https://cdn/s"}]
        }))
        .unwrap();
        assert_eq!(item.variations.len(), 1);
        assert_eq!(item.source_url(), Some("https://cdn/s"));
    }

    #[test]
    fn test_media_page_into_items_counts_dropped() {
        let page: MediaPage = serde_json::from_value(json!({
            "_embedded": {"media": [{"id": "a"}, {"nope": true}, {"id": "b"}]},
            "_pages": {"total_pages": 4}
        }))
        .unwrap();
        assert_eq!(page.raw_len(), 3);
        assert_eq!(page.total_pages(), Some(4));
        let (items, dropped) = page.into_items();
        assert_eq!(items.len(), 2);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_media_page_without_pages_block_has_unknown_total() {
        let page: MediaPage = serde_json::from_value(json!({"_embedded": {"media": []}})).unwrap();
        assert_eq!(page.total_pages(), None);
    }

    #[test]
    fn test_page_limit_from_option() {
        assert_eq!(PageLimit::from_option(None), PageLimit::Unbounded);
        assert_eq!(PageLimit::from_option(Some(0)), PageLimit::Unbounded);
        assert!(PageLimit::from_option(Some(1)).exceeded_by(2));
        assert!(!PageLimit::from_option(Some(1)).exceeded_by(1));
        assert!(!PageLimit::Unbounded.exceeded_by(u32::MAX));
    }

    #[test]
    fn test_current_user_falls_back_to_user_id() {
        let user: CurrentUser = serde_json::from_value(json!({"user_id": "u-9"})).unwrap();
        assert_eq!(user.into_id(), Some("u-9".to_string()));
        let numeric: CurrentUser = serde_json::from_value(json!({"id": 17})).unwrap();
        assert_eq!(numeric.into_id(), Some("17".to_string()));
    }
}
