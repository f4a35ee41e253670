use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawItem {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub stream_type: Option<String>,
    pub url: Option<String>,
    pub canonical_url: Option<String>,
    pub language: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub media: Option<Value>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Iptv,
    Vod,
    Webcam,
    Radio,
}

impl StreamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Iptv => "iptv",
            StreamType::Vod => "vod",
            StreamType::Webcam => "webcam",
            StreamType::Radio => "radio",
        }
    }

    /// Folds provider-native type labels into the catalog taxonomy.
    /// Unrecognized labels default to `iptv`.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().trim() {
            "vod" => StreamType::Vod,
            "webcam" => StreamType::Webcam,
            "radio" | "audio" => StreamType::Radio,
            _ => StreamType::Iptv,
        }
    }
}

impl Default for StreamType {
    fn default() -> Self {
        StreamType::Iptv
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Online,
    Offline,
    Unknown,
}

impl StreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamStatus::Online => "online",
            StreamStatus::Offline => "offline",
            StreamStatus::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "online" => StreamStatus::Online,
            "offline" => StreamStatus::Offline,
            _ => StreamStatus::Unknown,
        }
    }
}

impl Default for StreamStatus {
    fn default() -> Self {
        StreamStatus::Unknown
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleEntry {
    pub lang: String,
    pub url: String,
    pub source: Option<String>,
    pub label: Option<String>, // release/variant text, used by the SDH penalty
    #[serde(default)]
    pub translated: bool,
    #[serde(default)]
    pub synced: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub stream_type: StreamType,
    pub url: String, // as discovered, including any auth parameters
    pub canonical_url: String,
    pub country: Option<String>,
    pub language: Option<String>,
    pub category: String,
    pub media: Value,
    pub subtitles: Vec<SubtitleEntry>,
    pub status: StreamStatus,
    pub score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StreamRecord {
    /// Key under which duplicates collapse within one discovery run.
    pub fn dedup_key(&self) -> String {
        format!("{}::{}", self.canonical_url, self.name.to_lowercase())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub status: StreamStatus,
    pub score: i32,
    pub reason: Option<String>,
}

impl ValidationResult {
    pub fn online(score: i32) -> Self {
        Self {
            ok: true,
            status: StreamStatus::Online,
            score,
            reason: None,
        }
    }

    pub fn offline(score: i32, reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: StreamStatus::Offline,
            score,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub accept: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantineRecord {
    pub stream: StreamRecord,
    pub quarantine_reason: String,
    pub policy_version: String, // policy id@version that produced the rejection
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: Uuid,
    pub name: String,
    pub adapter_id: String,
    pub config: Value,
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionSummary {
    pub accepted: usize,
    pub quarantined: usize,
    pub rejected: usize,
    pub total: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReprocessSummary {
    pub processed: usize,
    pub released: usize,
    pub kept: usize,
    pub failed: usize,
    pub total: usize,
    pub duration_ms: u64,
}

/// Outcome of a subtitle synchronization attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub url: String,
    pub synced: bool,
}
