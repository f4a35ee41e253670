//! Radio Browser adapter
//!
//! Community radio directory, no credentials. Stations are taken from the
//! plain station listing with broken entries filtered server-side; the
//! resolved URL is preferred because the raw one may be a redirector.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::fallback::{create_fallback, FallbackItem};
use super::{SourceAdapter, DISCOVERY_TIMEOUT_SECS};
use crate::config::AdapterConfig;
use crate::errors::{AppResult, SourceError};
use crate::models::RawItem;

const DEMO_RADIO_URL: &str = "https://stream.live.vc.bbcmedia.co.uk/bbc_world_service";

pub struct RadioBrowserAdapter {
    client: Client,
    api_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RadioBrowserSourceConfig {
    limit: Option<usize>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Station {
    stationuuid: Option<String>,
    name: Option<String>,
    url_resolved: Option<String>,
    language: Option<String>,
    tags: Option<StationTags>,
}

/// The directory reports tags as a comma string, some mirrors as an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StationTags {
    Text(String),
    List(Vec<String>),
}

impl StationTags {
    fn into_category(self) -> Option<String> {
        let joined = match self {
            StationTags::Text(text) => text.trim().to_string(),
            StationTags::List(tags) => tags.join(", ").trim().to_string(),
        };
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }
}

impl RadioBrowserAdapter {
    pub fn new(config: &AdapterConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DISCOVERY_TIMEOUT_SECS))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: config.radiobrowser_api_url.clone(),
        }
    }

    async fn fetch_stations(&self, config: &RadioBrowserSourceConfig) -> AppResult<Vec<RawItem>> {
        let limit = config.limit.unwrap_or(5);
        let language = config.language.as_deref().unwrap_or("pt");

        let response = self
            .client
            .get(&self.api_url)
            .query(&[("limit", limit.to_string().as_str()), ("hidebroken", "true")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(
                SourceError::http(response.status().as_u16(), "station listing failed").into(),
            );
        }

        let stations: Vec<Station> = response.json().await?;
        if stations.is_empty() {
            return Err(SourceError::empty_payload("radiobrowser").into());
        }

        let items = stations
            .into_iter()
            .take(limit)
            .map(|station| {
                let url = station.url_resolved.map(|u| u.trim().to_string());
                RawItem {
                    id: station.stationuuid.map(|id| id.trim().to_string()),
                    name: Some(
                        station
                            .name
                            .map(|n| n.trim().to_string())
                            .filter(|n| !n.is_empty())
                            .unwrap_or_else(|| "Unnamed".to_string()),
                    ),
                    stream_type: Some("radio".to_string()),
                    canonical_url: url.clone(),
                    url,
                    language: Some(
                        station
                            .language
                            .map(|l| l.to_lowercase().trim().to_string())
                            .filter(|l| !l.is_empty())
                            .unwrap_or_else(|| language.to_string()),
                    ),
                    category: Some(
                        station
                            .tags
                            .and_then(StationTags::into_category)
                            .unwrap_or_else(|| "Radio".to_string()),
                    ),
                    ..Default::default()
                }
            })
            .collect();

        Ok(items)
    }
}

#[async_trait]
impl SourceAdapter for RadioBrowserAdapter {
    fn id(&self) -> &'static str {
        "radiobrowser"
    }

    async fn discover(&self, config: &Value) -> Vec<RawItem> {
        let config: RadioBrowserSourceConfig = match serde_json::from_value(config.clone()) {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    "Radio Browser source config unreadable, using defaults: {}",
                    err
                );
                RadioBrowserSourceConfig::default()
            }
        };

        match self.fetch_stations(&config).await {
            Ok(items) => {
                info!("Radio Browser discovered {} stations", items.len());
                items
            }
            Err(err) => {
                warn!("Radio Browser discovery failed, using fallback: {}", err);
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> Vec<RawItem> {
        create_fallback(FallbackItem {
            id: "demo-radio-1".to_string(),
            name: "Radio Demo".to_string(),
            stream_type: "radio".to_string(),
            language: "pt".to_string(),
            url: DEMO_RADIO_URL.to_string(),
            subtitles: Vec::new(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_fold_into_a_category() {
        let text = StationTags::Text("news, talk".to_string());
        assert_eq!(text.into_category().as_deref(), Some("news, talk"));

        let list = StationTags::List(vec!["fado".to_string(), "lisboa".to_string()]);
        assert_eq!(list.into_category().as_deref(), Some("fado, lisboa"));

        let empty = StationTags::Text("  ".to_string());
        assert_eq!(empty.into_category(), None);
    }

    #[test]
    fn station_payload_deserializes() {
        let station: Station = serde_json::from_str(
            r#"{"stationuuid": "u1", "name": "Radio Um", "url_resolved": "http://r/1", "language": "portuguese", "tags": "fado"}"#,
        )
        .unwrap();
        assert_eq!(station.stationuuid.as_deref(), Some("u1"));
        assert!(matches!(station.tags, Some(StationTags::Text(_))));
    }
}
