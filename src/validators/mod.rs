//! Reachability validators
//!
//! One validator probes one stream and always produces a
//! [`ValidationResult`]. Transport failures, timeouts and malformed
//! payloads are captured as `offline` results with a reason; a
//! validator never returns an error and is called exactly once per
//! record per run.
//!
//! Selection works in two steps: validators that explicitly claim a
//! record (via [`StreamValidator::handles`]) win in registration
//! order, then the record type is matched against a fixed convention
//! (`iptv` to the HLS prober, `radio` to the ICY prober), and anything
//! left falls through to the generic existence probe.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ValidationConfig;
use crate::models::{StreamRecord, StreamType, ValidationResult};

pub mod generic;
pub mod hls;
pub mod icy;
pub mod schema;
pub mod vod;

pub use generic::GenericValidator;
pub use hls::HlsValidator;
pub use icy::IcyValidator;
pub use schema::validate_stream_schema;
pub use vod::VodValidator;

/// Probe thresholds shared by the concrete validators.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub timeout: Duration,
    pub min_segment_bytes: u64,
    pub min_vod_bytes: u64,
    pub slow_ms: u64,
    pub very_slow_ms: u64,
}

impl From<&ValidationConfig> for ProbeConfig {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.probe_timeout_secs),
            min_segment_bytes: config.min_segment_bytes,
            min_vod_bytes: config.min_vod_bytes,
            slow_ms: config.slow_ms,
            very_slow_ms: config.very_slow_ms,
        }
    }
}

#[async_trait]
pub trait StreamValidator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Explicit claim on a record, checked before type matching.
    fn handles(&self, stream: &StreamRecord) -> bool {
        let _ = stream;
        false
    }

    async fn validate(&self, stream: &StreamRecord) -> ValidationResult;
}

/// Picks the validator for a record from an ordered registration list.
pub fn select<'a>(
    validators: &'a [(String, Arc<dyn StreamValidator>)],
    stream: &StreamRecord,
) -> Option<&'a Arc<dyn StreamValidator>> {
    if let Some((_, validator)) = validators.iter().find(|(_, v)| v.handles(stream)) {
        return Some(validator);
    }

    let conventional = match stream.stream_type {
        StreamType::Vod => "vod",
        StreamType::Iptv => "hls",
        StreamType::Radio => "icy",
        StreamType::Webcam => "generic",
    };
    if let Some((_, validator)) = validators.iter().find(|(name, _)| name == conventional) {
        return Some(validator);
    }

    validators
        .iter()
        .find(|(name, _)| name == "generic")
        .map(|(_, validator)| validator)
}

/// Renders a transport error into a result reason.
pub(crate) fn transport_reason(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedValidator {
        name: &'static str,
        claims_vod: bool,
    }

    #[async_trait]
    impl StreamValidator for NamedValidator {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handles(&self, stream: &StreamRecord) -> bool {
            self.claims_vod && stream.stream_type == StreamType::Vod
        }

        async fn validate(&self, _stream: &StreamRecord) -> ValidationResult {
            ValidationResult::online(100)
        }
    }

    fn registry() -> Vec<(String, Arc<dyn StreamValidator>)> {
        [("vod", true), ("hls", false), ("icy", false), ("generic", false)]
            .into_iter()
            .map(|(name, claims_vod)| {
                (
                    name.to_string(),
                    Arc::new(NamedValidator { name, claims_vod }) as Arc<dyn StreamValidator>,
                )
            })
            .collect()
    }

    fn stream_of_type(stream_type: StreamType) -> StreamRecord {
        StreamRecord {
            id: "s1".into(),
            name: "Stream".into(),
            stream_type,
            url: "http://ex/stream".into(),
            canonical_url: "http://ex/stream".into(),
            country: None,
            language: None,
            category: "unknown".into(),
            media: serde_json::json!({}),
            subtitles: Vec::new(),
            status: crate::models::StreamStatus::Unknown,
            score: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn explicit_claim_wins_over_type_convention() {
        let validators = registry();
        let picked = select(&validators, &stream_of_type(StreamType::Vod)).unwrap();
        assert_eq!(picked.name(), "vod");
    }

    #[test]
    fn iptv_and_radio_follow_the_type_convention() {
        let validators = registry();
        let iptv = select(&validators, &stream_of_type(StreamType::Iptv)).unwrap();
        assert_eq!(iptv.name(), "hls");
        let radio = select(&validators, &stream_of_type(StreamType::Radio)).unwrap();
        assert_eq!(radio.name(), "icy");
    }

    #[test]
    fn unmatched_types_fall_back_to_generic() {
        let validators = registry();
        let picked = select(&validators, &stream_of_type(StreamType::Webcam)).unwrap();
        assert_eq!(picked.name(), "generic");
    }

    #[test]
    fn empty_registry_selects_nothing() {
        let validators: Vec<(String, Arc<dyn StreamValidator>)> = Vec::new();
        assert!(select(&validators, &stream_of_type(StreamType::Iptv)).is_none());
    }
}
