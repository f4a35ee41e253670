//! Pluto TV live-channel adapter
//!
//! Reads the channel guide API and maps each channel to a live item using
//! its first stitched stream URL. Same token gating as the VOD adapter.

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

pub struct PlutoLiveAdapter {
    client: Client,
    api_url: String,
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlutoLiveSourceConfig {
    limit: Option<usize>,
    language: Option<String>,
}

/// The guide endpoint answers either a bare channel array or an object
/// wrapping one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GuideResponse {
    List(Vec<LiveChannel>),
    Wrapped { channels: Vec<LiveChannel> },
}

#[derive(Debug, Deserialize)]
struct LiveChannel {
    id: Option<String>,
    name: Option<String>,
    language: Option<String>,
    category: Option<String>,
    stitched: Option<Stitched>,
}

#[derive(Debug, Deserialize)]
struct Stitched {
    #[serde(default)]
    urls: Vec<StitchedUrl>,
}

#[derive(Debug, Deserialize)]
struct StitchedUrl {
    url: Option<String>,
}

impl PlutoLiveAdapter {
    pub fn new(config: &AdapterConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DISCOVERY_TIMEOUT_SECS))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: config.pluto_live_api_url.clone(),
            token: config.pluto_api_token.clone(),
        }
    }

    async fn fetch_channels(
        &self,
        token: &str,
        config: &PlutoLiveSourceConfig,
    ) -> AppResult<Vec<RawItem>> {
        let limit = config.limit.unwrap_or(5);
        let language = config.language.as_deref().unwrap_or("en");

        let response = self
            .client
            .get(&self.api_url)
            .query(&[("lang", language)])
            .header("Accept", "application/json")
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(
                SourceError::http(response.status().as_u16(), "channel guide failed").into(),
            );
        }

        let channels = match response.json::<GuideResponse>().await? {
            GuideResponse::List(channels) => channels,
            GuideResponse::Wrapped { channels } => channels,
        };
        if channels.is_empty() {
            return Err(SourceError::empty_payload("pluto-live").into());
        }

        let items = channels
            .into_iter()
            .take(limit)
            .map(|channel| {
                let url = channel
                    .stitched
                    .and_then(|stitched| stitched.urls.into_iter().next())
                    .and_then(|stitched_url| stitched_url.url)
                    .map(|u| u.trim().to_string());
                RawItem {
                    id: channel.id.map(|id| id.trim().to_string()),
                    name: Some(
                        channel
                            .name
                            .map(|n| n.trim().to_string())
                            .filter(|n| !n.is_empty())
                            .unwrap_or_else(|| "Unnamed".to_string()),
                    ),
                    stream_type: Some("live".to_string()),
                    canonical_url: url.clone(),
                    url,
                    language: Some(
                        channel
                            .language
                            .map(|l| l.to_lowercase().trim().to_string())
                            .filter(|l| !l.is_empty())
                            .unwrap_or_else(|| language.to_string()),
                    ),
                    category: Some(
                        channel
                            .category
                            .map(|c| c.trim().to_string())
                            .filter(|c| !c.is_empty())
                            .unwrap_or_else(|| "Live".to_string()),
                    ),
                    ..Default::default()
                }
            })
            .collect();

        Ok(items)
    }
}

#[async_trait]
impl SourceAdapter for PlutoLiveAdapter {
    fn id(&self) -> &'static str {
        "pluto-live"
    }

    async fn discover(&self, config: &Value) -> Vec<RawItem> {
        let config: PlutoLiveSourceConfig = match serde_json::from_value(config.clone()) {
            Ok(config) => config,
            Err(err) => {
                warn!("Pluto Live source config unreadable, using defaults: {}", err);
                PlutoLiveSourceConfig::default()
            }
        };

        let Some(token) = self.token.clone() else {
            let missing = SourceError::missing_credentials("pluto-live", "PLUTO_API_TOKEN");
            warn!("{}, using fallback", missing);
            return self.fallback();
        };

        match self.fetch_channels(&token, &config).await {
            Ok(items) => {
                info!("Pluto Live discovered {} channels", items.len());
                items
            }
            Err(err) => {
                warn!("Pluto Live discovery failed, using fallback: {}", err);
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> Vec<RawItem> {
        create_fallback(FallbackItem {
            id: "demo-live-1".to_string(),
            name: "Pluto Live Demo".to_string(),
            stream_type: "live".to_string(),
            subtitles: Vec::new(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guide_response_accepts_both_shapes() {
        let bare: GuideResponse = serde_json::from_str(r#"[{"id": "c1", "name": "One"}]"#).unwrap();
        let wrapped: GuideResponse =
            serde_json::from_str(r#"{"channels": [{"id": "c2", "name": "Two"}]}"#).unwrap();
        let count = |resp: GuideResponse| match resp {
            GuideResponse::List(channels) => channels.len(),
            GuideResponse::Wrapped { channels } => channels.len(),
        };
        assert_eq!(count(bare), 1);
        assert_eq!(count(wrapped), 1);
    }

    #[test]
    fn missing_token_yields_live_fallback() {
        let adapter = PlutoLiveAdapter::new(&crate::config::Config::default().adapters);
        let items = tokio_test::block_on(adapter.discover(&serde_json::json!({})));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].stream_type.as_deref(), Some("live"));
    }
}
