//! RTP Play adapter
//!
//! Latest-episodes listing from the RTP Play API, no credentials. The
//! payload uses the broadcaster's own field names (titulo, urlVideo,
//! programa); episode ids arrive as numbers or strings depending on age.

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

const DEMO_RTP_URL: &str =
    "https://streaming-live.rtp.pt/liverepeater/smil:rtp1.smil/playlist.m3u8";

pub struct RtpPlayAdapter {
    client: Client,
    api_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RtpPlaySourceConfig {
    limit: Option<usize>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Episode {
    id: Option<Value>,
    titulo: Option<String>,
    #[serde(rename = "urlVideo")]
    url_video: Option<String>,
    programa: Option<String>,
}

impl Episode {
    fn id_string(&self) -> Option<String> {
        match &self.id {
            Some(Value::String(id)) => Some(id.trim().to_string()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        }
    }
}

impl RtpPlayAdapter {
    pub fn new(config: &AdapterConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DISCOVERY_TIMEOUT_SECS))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: config.rtp_play_api_url.clone(),
        }
    }

    async fn fetch_episodes(&self, config: &RtpPlaySourceConfig) -> AppResult<Vec<RawItem>> {
        let limit = config.limit.unwrap_or(5);
        let language = config
            .language
            .as_deref()
            .unwrap_or("pt")
            .to_lowercase()
            .trim()
            .to_string();

        let response = self
            .client
            .get(&self.api_url)
            .query(&[("limit", limit.to_string().as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(
                SourceError::http(response.status().as_u16(), "episode listing failed").into(),
            );
        }

        let episodes: Vec<Episode> = response.json().await?;
        if episodes.is_empty() {
            return Err(SourceError::empty_payload("rtp-play").into());
        }

        let items = episodes
            .into_iter()
            .take(limit)
            .map(|episode| {
                let id = episode.id_string();
                let url = episode.url_video.as_deref().map(|u| u.trim().to_string());
                RawItem {
                    id,
                    name: Some(
                        episode
                            .titulo
                            .map(|t| t.trim().to_string())
                            .filter(|t| !t.is_empty())
                            .unwrap_or_else(|| "Untitled".to_string()),
                    ),
                    stream_type: Some("vod".to_string()),
                    canonical_url: url.clone(),
                    url,
                    language: Some(language.clone()),
                    category: Some(
                        episode
                            .programa
                            .map(|p| p.trim().to_string())
                            .filter(|p| !p.is_empty())
                            .unwrap_or_else(|| "RTP Play".to_string()),
                    ),
                    ..Default::default()
                }
            })
            .collect();

        Ok(items)
    }
}

#[async_trait]
impl SourceAdapter for RtpPlayAdapter {
    fn id(&self) -> &'static str {
        "rtp-play"
    }

    async fn discover(&self, config: &Value) -> Vec<RawItem> {
        let config: RtpPlaySourceConfig = match serde_json::from_value(config.clone()) {
            Ok(config) => config,
            Err(err) => {
                warn!("RTP Play source config unreadable, using defaults: {}", err);
                RtpPlaySourceConfig::default()
            }
        };

        match self.fetch_episodes(&config).await {
            Ok(items) => {
                info!("RTP Play discovered {} episodes", items.len());
                items
            }
            Err(err) => {
                warn!("RTP Play discovery failed, using fallback: {}", err);
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> Vec<RawItem> {
        create_fallback(FallbackItem {
            id: "demo-rtp-1".to_string(),
            name: "RTP Play Demo".to_string(),
            language: "pt".to_string(),
            url: DEMO_RTP_URL.to_string(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episode_ids_accept_numbers_and_strings() {
        let numeric: Episode = serde_json::from_str(r#"{"id": 4821, "titulo": "Ep"}"#).unwrap();
        assert_eq!(numeric.id_string().as_deref(), Some("4821"));

        let text: Episode = serde_json::from_str(r#"{"id": "e4821", "titulo": "Ep"}"#).unwrap();
        assert_eq!(text.id_string().as_deref(), Some("e4821"));

        let missing: Episode = serde_json::from_str(r#"{"titulo": "Ep"}"#).unwrap();
        assert_eq!(missing.id_string(), None);
    }

    #[test]
    fn fallback_is_portuguese_vod() {
        let adapter = RtpPlayAdapter::new(&crate::config::Config::default().adapters);
        let items = adapter.fallback();
        assert_eq!(items[0].language.as_deref(), Some("pt"));
        assert_eq!(items[0].stream_type.as_deref(), Some("vod"));
    }
}
