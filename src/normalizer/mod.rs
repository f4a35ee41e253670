//! Normalization of provider-native items into catalog records
//!
//! Everything here is pure data shaping: identity assignment, name cleanup,
//! URL canonicalization and first-seen-wins deduplication. Nothing in this
//! module performs I/O or drops a record; records that should not be kept
//! are the policy's business, not the normalizer's.

use std::collections::HashSet;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;
use url::Url;
use uuid::Uuid;

use crate::models::{RawItem, StreamRecord, StreamStatus, StreamType};

/// Query parameters that rotate between discoveries of the same stream.
const VOLATILE_PARAMS: [&str; 5] = ["token", "auth", "session", "sig", "expires"];

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));
static QUALITY_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:hd|fhd|4k)\s*$").expect("quality regex should compile"));
static BRACKETED_QUALITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\[(]\s*(?:hd|fhd|4k)\s*[\])]\s*$").expect("bracket regex should compile")
});

/// Shapes a provider-native item into a [`StreamRecord`].
///
/// Deterministic and total: missing fields get defaults (`"Unnamed"`,
/// `"unknown"` category, generated id), nothing is rejected here. Status
/// and score start at `unknown`/0 and belong to the validators.
pub fn normalize(raw: RawItem) -> StreamRecord {
    let now = Utc::now();

    let id = raw
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let url = raw.url.unwrap_or_default();
    let canonical_source = raw
        .canonical_url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| url.clone());

    StreamRecord {
        id,
        name: clean_name(raw.name.as_deref()),
        stream_type: raw
            .stream_type
            .as_deref()
            .map(StreamType::parse)
            .unwrap_or_default(),
        canonical_url: canonicalize_url(&canonical_source),
        url,
        country: raw.country.map(|c| c.to_lowercase()),
        language: raw.language.map(|l| l.to_lowercase()),
        category: raw
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "unknown".to_string()),
        media: raw
            .media
            .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
        subtitles: raw.subtitles,
        status: StreamStatus::Unknown,
        score: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Trims, collapses internal whitespace and strips a trailing quality
/// suffix ("HD", "FHD", "4K", bare or bracketed).
fn clean_name(name: Option<&str>) -> String {
    let Some(name) = name else {
        return "Unnamed".to_string();
    };

    let collapsed = WHITESPACE_RE.replace_all(name.trim(), " ");
    let stripped = QUALITY_SUFFIX_RE.replace(&collapsed, "");
    let stripped = BRACKETED_QUALITY_RE.replace(stripped.trim(), "");
    let cleaned = stripped.trim();

    if cleaned.is_empty() {
        "Unnamed".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Produces the stable comparison form of a stream URL: fragment removed,
/// volatile auth parameters stripped (case-insensitively) and the remaining
/// query sorted by key. Two discoveries of the same stream that differ only
/// in a rotating token or parameter order canonicalize identically.
///
/// A URL that does not parse is logged and passed through unchanged.
pub fn canonicalize_url(raw_url: &str) -> String {
    if raw_url.is_empty() {
        return String::new();
    }

    let mut url = match Url::parse(raw_url) {
        Ok(url) => url,
        Err(err) => {
            warn!(url = raw_url, error = %err, "url canonicalization failed, keeping original");
            return raw_url.to_string();
        }
    };

    url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.retain(|(key, _)| {
        let key = key.to_lowercase();
        !VOLATILE_PARAMS.contains(&key.as_str())
    });
    // Stable sort keeps repeated keys in their original value order.
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut()
            .clear()
            .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    url.to_string()
}

/// Collapses duplicates within one discovery run. Single pass, first-seen
/// order preserved; later items with an already-seen key are dropped
/// silently.
pub fn dedupe_streams(streams: Vec<StreamRecord>) -> Vec<StreamRecord> {
    let mut seen = HashSet::with_capacity(streams.len());
    let mut deduped = Vec::with_capacity(streams.len());
    for stream in streams {
        if seen.insert(stream.dedup_key()) {
            deduped.push(stream);
        }
    }
    deduped
}
