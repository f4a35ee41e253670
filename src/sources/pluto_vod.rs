//! Pluto TV on-demand adapter
//!
//! Discovers items from one VOD category of the Pluto catalog API. The API
//! requires a bearer token; without one the adapter answers with its demo
//! fallback instead of failing the run.

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
use crate::models::{RawItem, SubtitleEntry};

pub struct PlutoVodAdapter {
    client: Client,
    api_url: String,
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlutoVodSourceConfig {
    limit: Option<usize>,
    language: Option<String>,
    category_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VodCategory {
    name: Option<String>,
    #[serde(default)]
    items: Vec<VodEpisode>,
}

#[derive(Debug, Deserialize)]
struct VodEpisode {
    id: Option<String>,
    name: Option<String>,
    language: Option<String>,
    clip: Option<VodClip>,
    #[serde(default)]
    subtitles: Vec<SubtitleEntry>,
}

#[derive(Debug, Deserialize)]
struct VodClip {
    url: Option<String>,
}

impl PlutoVodAdapter {
    pub fn new(config: &AdapterConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DISCOVERY_TIMEOUT_SECS))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: config.pluto_vod_api_url.clone(),
            token: config.pluto_api_token.clone(),
        }
    }

    async fn fetch_items(
        &self,
        token: &str,
        config: &PlutoVodSourceConfig,
    ) -> AppResult<Vec<RawItem>> {
        let limit = config.limit.unwrap_or(5);
        let language = config.language.as_deref().unwrap_or("en");

        let response = self
            .client
            .get(&self.api_url)
            .header("Accept", "application/json")
            .header("Accept-Language", format!("{language},en;q=0.9"))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(
                SourceError::http(response.status().as_u16(), "category listing failed").into(),
            );
        }

        let categories: Vec<VodCategory> = response.json().await?;
        if categories.is_empty() {
            return Err(SourceError::empty_payload("pluto-vod").into());
        }

        // Either the requested category or the first one that has items.
        let target = match config.category_name.as_deref() {
            Some(wanted) => categories.into_iter().find(|cat| {
                cat.name
                    .as_deref()
                    .map(|name| name.trim().eq_ignore_ascii_case(wanted.trim()))
                    .unwrap_or(false)
            }),
            None => categories.into_iter().find(|cat| !cat.items.is_empty()),
        };

        let Some(category) = target.filter(|cat| !cat.items.is_empty()) else {
            return Err(SourceError::empty_payload("pluto-vod").into());
        };

        let category_name = category.name.as_deref().unwrap_or("").trim().to_string();
        let items = category
            .items
            .into_iter()
            .take(limit)
            .map(|episode| {
                let url = episode
                    .clip
                    .and_then(|clip| clip.url)
                    .map(|u| u.trim().to_string());
                RawItem {
                    id: episode.id.map(|id| id.trim().to_string()),
                    name: Some(
                        episode
                            .name
                            .map(|n| n.trim().to_string())
                            .filter(|n| !n.is_empty())
                            .unwrap_or_else(|| "Untitled".to_string()),
                    ),
                    stream_type: Some("vod".to_string()),
                    canonical_url: url.clone(),
                    url,
                    language: Some(
                        episode
                            .language
                            .map(|l| l.to_lowercase().trim().to_string())
                            .filter(|l| !l.is_empty())
                            .unwrap_or_else(|| language.to_string()),
                    ),
                    category: Some(category_name.clone()),
                    subtitles: episode.subtitles,
                    ..Default::default()
                }
            })
            .collect();

        Ok(items)
    }
}

#[async_trait]
impl SourceAdapter for PlutoVodAdapter {
    fn id(&self) -> &'static str {
        "pluto-vod"
    }

    async fn discover(&self, config: &Value) -> Vec<RawItem> {
        let config: PlutoVodSourceConfig = match serde_json::from_value(config.clone()) {
            Ok(config) => config,
            Err(err) => {
                warn!("Pluto VOD source config unreadable, using defaults: {}", err);
                PlutoVodSourceConfig::default()
            }
        };

        let Some(token) = self.token.clone() else {
            let missing = SourceError::missing_credentials("pluto-vod", "PLUTO_API_TOKEN");
            warn!("{}, using fallback", missing);
            return self.fallback();
        };

        match self.fetch_items(&token, &config).await {
            Ok(items) => {
                info!("Pluto VOD discovered {} items", items.len());
                items
            }
            Err(err) => {
                warn!("Pluto VOD discovery failed, using fallback: {}", err);
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> Vec<RawItem> {
        create_fallback(FallbackItem {
            id: "demo-vod-1".to_string(),
            name: "Pluto VOD Demo".to_string(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn missing_token_yields_fallback() {
        let adapter = PlutoVodAdapter::new(&Config::default().adapters);
        let items = tokio_test::block_on(adapter.discover(&serde_json::json!({})));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_deref(), Some("demo-vod-1"));
        assert_eq!(items[0].stream_type.as_deref(), Some("vod"));
    }

    #[test]
    fn unreadable_source_config_still_discovers() {
        let adapter = PlutoVodAdapter::new(&Config::default().adapters);
        let items =
            tokio_test::block_on(adapter.discover(&serde_json::json!({"limit": "not-a-number"})));
        assert_eq!(items.len(), 1);
    }
}
