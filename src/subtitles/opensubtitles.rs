//! OpenSubtitles search provider
//!
//! Searches by stream name, constrained to the stream's own language
//! plus the Portuguese variants. Runs without credentials in a
//! degraded mode: no key means no results, never an error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::SubtitleProvider;
use crate::config::SubtitleConfig;
use crate::errors::SubtitleError;
use crate::models::{StreamRecord, SubtitleEntry};

pub struct OpenSubtitlesProvider {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    attributes: SearchAttributes,
}

#[derive(Debug, Deserialize)]
struct SearchAttributes {
    language: Option<String>,
    url: Option<String>,
    release: Option<String>,
    #[serde(default)]
    hearing_impaired: bool,
}

impl SearchAttributes {
    fn label(&self) -> Option<String> {
        match (&self.release, self.hearing_impaired) {
            (Some(release), true) => Some(format!("{} SDH", release)),
            (Some(release), false) => Some(release.clone()),
            (None, true) => Some("SDH".to_string()),
            (None, false) => None,
        }
    }
}

impl OpenSubtitlesProvider {
    pub fn new(config: &SubtitleConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: config.opensubtitles_api_url.clone(),
            api_key: config.opensubtitles_api_key.clone(),
        }
    }

    /// Search languages: the stream's declared language first, then the
    /// Portuguese variants, without duplicates.
    fn search_languages(stream: &StreamRecord) -> String {
        let mut languages: Vec<String> = Vec::new();
        if let Some(lang) = stream.language.as_deref() {
            let lang = lang.trim().to_lowercase();
            if !lang.is_empty() {
                languages.push(lang);
            }
        }
        for variant in ["pt", "pt-pt", "pt-br"] {
            if !languages.iter().any(|l| l == variant) {
                languages.push(variant.to_string());
            }
        }
        languages.join(",")
    }
}

#[async_trait]
impl SubtitleProvider for OpenSubtitlesProvider {
    fn name(&self) -> &'static str {
        "opensubtitles"
    }

    async fn find(&self, stream: &StreamRecord) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        if stream.name.trim().is_empty() {
            warn!("stream {} has no name, skipping subtitle search", stream.id);
            return Ok(Vec::new());
        }

        let Some(api_key) = &self.api_key else {
            warn!("OpenSubtitles API key not configured, skipping search");
            return Ok(Vec::new());
        };

        debug!("searching subtitles for '{}'", stream.name);

        let response = self
            .client
            .get(format!("{}/subtitles", self.api_url.trim_end_matches('/')))
            .header("Api-Key", api_key)
            .query(&[
                ("query", stream.name.as_str()),
                ("languages", Self::search_languages(stream).as_str()),
            ])
            .send()
            .await
            .map_err(|err| SubtitleError::provider("opensubtitles", err.to_string()))?;

        if !response.status().is_success() {
            return Err(SubtitleError::provider(
                "opensubtitles",
                format!("search failed with HTTP {}", response.status().as_u16()),
            ));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|err| SubtitleError::provider("opensubtitles", err.to_string()))?;

        let entries: Vec<SubtitleEntry> = payload
            .data
            .into_iter()
            .filter_map(|result| {
                let label = result.attributes.label();
                let lang = result.attributes.language?.trim().to_lowercase();
                let url = result.attributes.url?;
                Some(SubtitleEntry {
                    lang,
                    url,
                    source: Some("opensubtitles".to_string()),
                    label,
                    translated: false,
                    synced: false,
                })
            })
            .collect();

        info!("found {} subtitles for '{}'", entries.len(), stream.name);
        Ok(entries)
    }
}
