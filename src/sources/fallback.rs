//! Standardized fallback items for source adapters

use serde_json::Value;

use crate::models::{RawItem, SubtitleEntry};

const DEMO_HLS_URL: &str =
    "https://storage.googleapis.com/shaka-demo-assets/angel-one-hls/hls.m3u8";
const DEMO_SUBTITLE_URL: &str =
    "https://storage.googleapis.com/shaka-demo-assets/angel-one-hls/angel-one-en.vtt";

/// Blueprint for one fallback item. Defaults describe a public demo VOD
/// asset with an English subtitle track; adapters override what they need.
pub struct FallbackItem {
    pub id: String,
    pub name: String,
    pub stream_type: String,
    pub url: String,
    pub language: String,
    pub category: String,
    pub subtitles: Vec<SubtitleEntry>,
    pub media: Value,
}

impl Default for FallbackItem {
    fn default() -> Self {
        Self {
            id: "demo-item-1".to_string(),
            name: "Sample Title".to_string(),
            stream_type: "vod".to_string(),
            url: DEMO_HLS_URL.to_string(),
            language: "en".to_string(),
            category: "Demo".to_string(),
            subtitles: vec![SubtitleEntry {
                lang: "en".to_string(),
                url: DEMO_SUBTITLE_URL.to_string(),
                source: None,
                label: None,
                translated: false,
                synced: false,
            }],
            media: Value::Object(Default::default()),
        }
    }
}

/// Builds the single-item fallback list every adapter returns when its
/// provider cannot be used.
pub fn create_fallback(item: FallbackItem) -> Vec<RawItem> {
    vec![RawItem {
        id: Some(item.id.trim().to_string()),
        name: Some(item.name.trim().to_string()),
        stream_type: Some(item.stream_type.to_lowercase().trim().to_string()),
        url: Some(item.url.trim().to_string()),
        canonical_url: Some(item.url.trim().to_string()),
        language: Some(item.language.to_lowercase().trim().to_string()),
        category: Some(item.category.trim().to_string()),
        country: None,
        media: Some(item.media),
        subtitles: item.subtitles,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_a_single_labeled_item() {
        let items = create_fallback(FallbackItem {
            id: "demo-vod-1".into(),
            name: "Pluto VOD Demo".into(),
            ..Default::default()
        });
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_deref(), Some("demo-vod-1"));
        assert_eq!(items[0].category.as_deref(), Some("Demo"));
        assert_eq!(items[0].url, items[0].canonical_url);
    }

    #[test]
    fn defaults_carry_the_demo_subtitle() {
        let items = create_fallback(FallbackItem::default());
        assert_eq!(items[0].subtitles.len(), 1);
        assert_eq!(items[0].subtitles[0].lang, "en");
    }
}
