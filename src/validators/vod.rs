//! VOD file probe
//!
//! Existence check plus a minimum content-length guard that weeds out
//! stub and placeholder files. Servers that omit the header are
//! trusted on reachability alone.

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::Client;
use tracing::debug;

use super::{transport_reason, StreamValidator};
use crate::models::{StreamRecord, StreamType, ValidationResult};

pub struct VodValidator {
    client: Client,
    min_vod_bytes: u64,
}

impl VodValidator {
    pub fn new(client: Client, min_vod_bytes: u64) -> Self {
        Self {
            client,
            min_vod_bytes,
        }
    }
}

#[async_trait]
impl StreamValidator for VodValidator {
    fn name(&self) -> &'static str {
        "vod"
    }

    fn handles(&self, stream: &StreamRecord) -> bool {
        stream.stream_type == StreamType::Vod
    }

    async fn validate(&self, stream: &StreamRecord) -> ValidationResult {
        if stream.url.trim().is_empty() {
            return ValidationResult::offline(0, "missing URL");
        }

        debug!("probing VOD '{}' at {}", stream.name, stream.url);

        let response = match self.client.head(&stream.url).send().await {
            Ok(response) => response,
            Err(err) => return ValidationResult::offline(0, transport_reason(&err)),
        };

        if !response.status().is_success() {
            return ValidationResult::offline(
                0,
                format!("HTTP {}", response.status().as_u16()),
            );
        }

        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(0);
        if content_length > 0 && content_length < self.min_vod_bytes {
            return ValidationResult::offline(
                50,
                format!("file too small ({} bytes)", content_length),
            );
        }

        ValidationResult::online(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StreamStatus, StreamType};
    use chrono::Utc;

    fn vod_record(url: &str) -> StreamRecord {
        StreamRecord {
            id: "v1".into(),
            name: "Feature".into(),
            stream_type: StreamType::Vod,
            url: url.into(),
            canonical_url: url.into(),
            country: None,
            language: None,
            category: "unknown".into(),
            media: serde_json::json!({}),
            subtitles: Vec::new(),
            status: StreamStatus::Unknown,
            score: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn claims_vod_records_only() {
        let validator = VodValidator::new(Client::new(), 1024);
        assert!(validator.handles(&vod_record("http://ex/v.mp4")));

        let mut live = vod_record("http://ex/live.m3u8");
        live.stream_type = StreamType::Iptv;
        assert!(!validator.handles(&live));
    }

    #[tokio::test]
    async fn unreachable_file_is_offline_with_a_reason() {
        let validator = VodValidator::new(Client::new(), 1024);
        let result = validator.validate(&vod_record("http://127.0.0.1:1/v.mp4")).await;
        assert!(!result.ok);
        assert_eq!(result.score, 0);
        assert!(result.reason.is_some());
    }
}
