//! Generic existence probe
//!
//! Lowest-common-denominator check used whenever no protocol-specific
//! validator claims a record. A reachable endpoint is worth less than
//! a verified playlist or segment, so success caps at 80.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{transport_reason, StreamValidator};
use crate::models::{StreamRecord, ValidationResult};

pub struct GenericValidator {
    client: Client,
}

impl GenericValidator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StreamValidator for GenericValidator {
    fn name(&self) -> &'static str {
        "generic"
    }

    async fn validate(&self, stream: &StreamRecord) -> ValidationResult {
        if stream.url.trim().is_empty() {
            return ValidationResult::offline(0, "missing URL");
        }

        debug!("probing '{}' at {}", stream.name, stream.url);

        match self.client.head(&stream.url).send().await {
            Ok(response) if response.status().is_success() => ValidationResult::online(80),
            Ok(response) => ValidationResult::offline(
                0,
                format!("HTTP {}", response.status().as_u16()),
            ),
            Err(err) => ValidationResult::offline(0, transport_reason(&err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StreamStatus, StreamType};
    use chrono::Utc;

    fn record_with_url(url: &str) -> StreamRecord {
        StreamRecord {
            id: "g1".into(),
            name: "Probe Target".into(),
            stream_type: StreamType::Webcam,
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

    #[tokio::test]
    async fn blank_url_is_offline_without_probing() {
        let validator = GenericValidator::new(Client::new());
        let result = validator.validate(&record_with_url("  ")).await;
        assert!(!result.ok);
        assert_eq!(result.score, 0);
        assert_eq!(result.reason.as_deref(), Some("missing URL"));
    }

    #[tokio::test]
    async fn unreachable_host_is_captured_as_offline() {
        let validator = GenericValidator::new(Client::new());
        let result = validator.validate(&record_with_url("http://127.0.0.1:1/")).await;
        assert!(!result.ok);
        assert_eq!(result.status, StreamStatus::Offline);
        assert_eq!(result.score, 0);
        assert!(result.reason.is_some());
    }
}
