//! Machine-translation provider
//!
//! Downloads the source subtitle, sends the text to a configured
//! translation endpoint and stores the result as a new artifact. With
//! no endpoint configured the provider declines, which lets the
//! pipeline fall through to the next provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{SubtitleProvider, SubtitleStore};
use crate::config::SubtitleConfig;
use crate::errors::SubtitleError;
use crate::models::SubtitleEntry;

pub struct TranslatorProvider {
    client: Client,
    api_url: Option<String>,
    api_key: Option<String>,
    store: SubtitleStore,
}

#[derive(Debug, Deserialize)]
struct TranslationResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

impl TranslatorProvider {
    pub fn new(config: &SubtitleConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: config.translate_api_url.clone(),
            api_key: config.translate_api_key.clone(),
            store: SubtitleStore::new(&config.storage_path, config.public_base_url.clone()),
        }
    }

    async fn fetch_source(&self, url: &str) -> Result<String, SubtitleError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| SubtitleError::fetch(url, err.to_string()))?;
        if !response.status().is_success() {
            return Err(SubtitleError::fetch(
                url,
                format!("HTTP {}", response.status().as_u16()),
            ));
        }
        response
            .text()
            .await
            .map_err(|err| SubtitleError::fetch(url, err.to_string()))
    }
}

#[async_trait]
impl SubtitleProvider for TranslatorProvider {
    fn name(&self) -> &'static str {
        "translator"
    }

    async fn translate(
        &self,
        url: &str,
        target_lang: &str,
    ) -> Result<Option<SubtitleEntry>, SubtitleError> {
        let Some(api_url) = &self.api_url else {
            debug!("translation API not configured, declining");
            return Ok(None);
        };

        info!("translating {} to {}", url, target_lang);

        let source_text = self.fetch_source(url).await?;

        let mut request = self
            .client
            .post(api_url)
            .json(&json!({ "q": source_text, "target": target_lang }));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| SubtitleError::provider("translator", err.to_string()))?;
        if !response.status().is_success() {
            return Err(SubtitleError::provider(
                "translator",
                format!("translation failed with HTTP {}", response.status().as_u16()),
            ));
        }

        let payload: TranslationResponse = response
            .json()
            .await
            .map_err(|err| SubtitleError::provider("translator", err.to_string()))?;
        let Some(translated_text) = payload.translated_text.filter(|text| !text.is_empty()) else {
            warn!("translation endpoint returned no text for {}", url);
            return Ok(None);
        };

        let file_name = format!("{}-{}.srt", Uuid::new_v4(), target_lang.to_lowercase());
        let stored_url = self.store.store(&file_name, translated_text.as_bytes()).await?;

        Ok(Some(SubtitleEntry {
            lang: target_lang.to_string(),
            url: stored_url,
            source: Some("translator".to_string()),
            label: None,
            translated: true,
            synced: false,
        }))
    }
}
