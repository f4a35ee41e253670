//! Capability registry
//!
//! One explicit object built once at startup and handed by reference
//! to the orchestrator and jobs. Adapters are keyed by id, validators
//! and subtitle providers keep their registration order, which decides
//! explicit-claim scanning and first-success-wins chains.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tracing::info;

use crate::config::Config;
use crate::models::StreamRecord;
use crate::sources::{
    PlutoLiveAdapter, PlutoVodAdapter, RadioBrowserAdapter, RtpPlayAdapter, SourceAdapter,
};
use crate::subtitles::{
    OpenSubtitlesProvider, SubtitleProvider, SyncerProvider, TranslatorProvider,
};
use crate::validators::{
    self, GenericValidator, HlsValidator, IcyValidator, ProbeConfig, StreamValidator, VodValidator,
};

pub struct Registry {
    adapters: HashMap<String, Arc<dyn SourceAdapter>>,
    validators: Vec<(String, Arc<dyn StreamValidator>)>,
    subtitle_providers: Vec<Arc<dyn SubtitleProvider>>,
}

impl Registry {
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        validators: Vec<(String, Arc<dyn StreamValidator>)>,
        subtitle_providers: Vec<Arc<dyn SubtitleProvider>>,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.id().to_string(), adapter))
            .collect();
        Self {
            adapters,
            validators,
            subtitle_providers,
        }
    }

    /// Wires up the full production set of adapters, validators and
    /// subtitle providers.
    pub fn bootstrap(config: &Config) -> Self {
        let probe = ProbeConfig::from(&config.validation);
        let client = Client::builder()
            .timeout(probe.timeout)
            .user_agent(config.adapters.user_agent.clone())
            .build()
            .unwrap_or_else(|_| Client::new());

        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(PlutoVodAdapter::new(&config.adapters)),
            Arc::new(PlutoLiveAdapter::new(&config.adapters)),
            Arc::new(RadioBrowserAdapter::new(&config.adapters)),
            Arc::new(RtpPlayAdapter::new(&config.adapters)),
        ];

        let validators: Vec<(String, Arc<dyn StreamValidator>)> = vec![
            (
                "hls".to_string(),
                Arc::new(HlsValidator::new(client.clone(), probe.min_segment_bytes)),
            ),
            (
                "icy".to_string(),
                Arc::new(IcyValidator::new(
                    client.clone(),
                    probe.slow_ms,
                    probe.very_slow_ms,
                )),
            ),
            (
                "vod".to_string(),
                Arc::new(VodValidator::new(client.clone(), probe.min_vod_bytes)),
            ),
            ("generic".to_string(), Arc::new(GenericValidator::new(client))),
        ];

        let subtitle_providers: Vec<Arc<dyn SubtitleProvider>> = vec![
            Arc::new(OpenSubtitlesProvider::new(&config.subtitles)),
            Arc::new(TranslatorProvider::new(&config.subtitles)),
            Arc::new(SyncerProvider::new(&config.subtitles)),
        ];

        info!(
            "registry ready: {} adapters, {} validators, {} subtitle providers",
            adapters.len(),
            validators.len(),
            subtitle_providers.len()
        );

        Self::new(adapters, validators, subtitle_providers)
    }

    pub fn adapter(&self, id: &str) -> Option<&Arc<dyn SourceAdapter>> {
        self.adapters.get(id)
    }

    pub fn validator_for(&self, stream: &StreamRecord) -> Option<&Arc<dyn StreamValidator>> {
        validators::select(&self.validators, stream)
    }

    pub fn subtitle_providers(&self) -> &[Arc<dyn SubtitleProvider>] {
        &self.subtitle_providers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StreamStatus, StreamType};
    use chrono::Utc;

    fn record_of_type(stream_type: StreamType) -> StreamRecord {
        StreamRecord {
            id: "reg1".into(),
            name: "Registo".into(),
            stream_type,
            url: "http://ex/x".into(),
            canonical_url: "http://ex/x".into(),
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
    fn bootstrap_registers_the_full_production_set() {
        let registry = Registry::bootstrap(&Config::default());
        assert!(registry.adapter("pluto-vod").is_some());
        assert!(registry.adapter("pluto-live").is_some());
        assert!(registry.adapter("radiobrowser").is_some());
        assert!(registry.adapter("rtp-play").is_some());
        assert!(registry.adapter("unknown").is_none());
        assert_eq!(registry.subtitle_providers().len(), 3);
    }

    #[test]
    fn validator_routing_follows_record_type() {
        let registry = Registry::bootstrap(&Config::default());
        let vod = registry.validator_for(&record_of_type(StreamType::Vod)).unwrap();
        assert_eq!(vod.name(), "vod");
        let radio = registry.validator_for(&record_of_type(StreamType::Radio)).unwrap();
        assert_eq!(radio.name(), "icy");
        let webcam = registry
            .validator_for(&record_of_type(StreamType::Webcam))
            .unwrap();
        assert_eq!(webcam.name(), "generic");
    }
}
