//! HLS playlist probe
//!
//! Fetches the manifest, requires the playlist and media markers,
//! then fetches the first referenced segment and requires a minimum
//! byte size. A playlist that downloads fine can still point at dead
//! or truncated media. Manifest problems score 0, a live manifest
//! whose segment fails scores 50.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{transport_reason, StreamValidator};
use crate::models::{StreamRecord, ValidationResult};

pub struct HlsValidator {
    client: Client,
    min_segment_bytes: u64,
}

impl HlsValidator {
    pub fn new(client: Client, min_segment_bytes: u64) -> Self {
        Self {
            client,
            min_segment_bytes,
        }
    }

    async fn probe_segment(&self, segment_url: &str) -> ValidationResult {
        let response = match self.client.get(segment_url).send().await {
            Ok(response) => response,
            Err(err) => return ValidationResult::offline(0, transport_reason(&err)),
        };

        if !response.status().is_success() {
            return ValidationResult::offline(
                50,
                format!("segment HTTP {}", response.status().as_u16()),
            );
        }

        match response.bytes().await {
            Ok(body) if (body.len() as u64) < self.min_segment_bytes => {
                ValidationResult::offline(50, format!("segment too small ({} bytes)", body.len()))
            }
            Ok(_) => ValidationResult::online(100),
            Err(err) => ValidationResult::offline(0, transport_reason(&err)),
        }
    }
}

#[async_trait]
impl StreamValidator for HlsValidator {
    fn name(&self) -> &'static str {
        "hls"
    }

    async fn validate(&self, stream: &StreamRecord) -> ValidationResult {
        if stream.url.trim().is_empty() {
            return ValidationResult::offline(0, "missing URL");
        }

        debug!("probing playlist '{}' at {}", stream.name, stream.url);

        let response = match self.client.get(&stream.url).send().await {
            Ok(response) => response,
            Err(err) => return ValidationResult::offline(0, transport_reason(&err)),
        };

        if !response.status().is_success() {
            return ValidationResult::offline(
                0,
                format!("HTTP {}", response.status().as_u16()),
            );
        }

        let manifest = match response.text().await {
            Ok(manifest) => manifest,
            Err(err) => return ValidationResult::offline(0, transport_reason(&err)),
        };

        if !manifest.contains("#EXTM3U") || !manifest.contains("#EXTINF") {
            return ValidationResult::offline(0, "invalid HLS format");
        }

        let segment = manifest
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'));
        let Some(segment) = segment else {
            return ValidationResult::offline(0, "no media segments");
        };

        let segment_url = match resolve_segment(&stream.url, segment) {
            Some(url) => url,
            None => return ValidationResult::offline(0, "unresolvable segment URL"),
        };

        self.probe_segment(&segment_url).await
    }
}

/// Resolves a segment reference against its manifest URL. Absolute
/// references pass through unchanged.
fn resolve_segment(manifest_url: &str, segment: &str) -> Option<String> {
    let base = Url::parse(manifest_url).ok()?;
    base.join(segment).ok().map(|url| url.to_string())
}
