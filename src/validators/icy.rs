//! ICY audio-stream probe
//!
//! Negotiates Shoutcast metadata with `Icy-MetaData: 1`, scores by
//! how fast the server answers, and opportunistically reads the first
//! metadata block from the byte stream to log the current track.
//! Servers that ignore the negotiation or trickle data are tolerated,
//! the metadata read never changes the result.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info};

use super::{transport_reason, StreamValidator};
use crate::models::{StreamRecord, ValidationResult};

static STREAM_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"StreamTitle='([^']*)'").expect("stream title regex should compile"));

/// Metadata blocks are a length byte times 16, so 4080 bytes at most.
const MAX_METADATA_BLOCK: usize = 255 * 16;

pub struct IcyValidator {
    client: Client,
    slow_ms: u64,
    very_slow_ms: u64,
}

impl IcyValidator {
    pub fn new(client: Client, slow_ms: u64, very_slow_ms: u64) -> Self {
        Self {
            client,
            slow_ms,
            very_slow_ms,
        }
    }

    /// Reads just enough of the body to reach the first metadata block
    /// and pulls the stream title out of it. Bounded by a deadline so a
    /// slow source cannot stall the run.
    async fn read_stream_title(&self, response: reqwest::Response, meta_int: usize) -> Option<String> {
        let wanted = meta_int + 1 + MAX_METADATA_BLOCK;
        let deadline = Instant::now() + Duration::from_millis(self.very_slow_ms);

        let mut body = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        while buffer.len() < wanted {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, body.next()).await {
                Ok(Some(Ok(chunk))) => buffer.extend_from_slice(&chunk),
                _ => break,
            }
        }

        parse_stream_title(&buffer, meta_int)
    }
}

#[async_trait]
impl StreamValidator for IcyValidator {
    fn name(&self) -> &'static str {
        "icy"
    }

    async fn validate(&self, stream: &StreamRecord) -> ValidationResult {
        if stream.url.trim().is_empty() {
            return ValidationResult::offline(0, "missing URL");
        }

        debug!("probing audio stream '{}' at {}", stream.name, stream.url);

        let started = Instant::now();
        let response = match self
            .client
            .get(&stream.url)
            .header("Icy-MetaData", "1")
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return ValidationResult::offline(0, transport_reason(&err)),
        };

        if !response.status().is_success() {
            return ValidationResult::offline(
                0,
                format!("HTTP {}", response.status().as_u16()),
            );
        }

        let latency_ms = started.elapsed().as_millis() as u64;
        let score = if latency_ms < self.slow_ms {
            100
        } else if latency_ms < self.very_slow_ms {
            80
        } else {
            60
        };

        let icy_headers: Vec<String> = response
            .headers()
            .iter()
            .filter(|(name, _)| name.as_str().starts_with("icy-"))
            .map(|(name, value)| format!("{}={}", name, value.to_str().unwrap_or("?")))
            .collect();
        if !icy_headers.is_empty() {
            debug!("'{}' ICY headers: {}", stream.name, icy_headers.join(", "));
        }

        let meta_int = response
            .headers()
            .get("icy-metaint")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if meta_int > 0 {
            if let Some(title) = self.read_stream_title(response, meta_int).await {
                debug!("'{}' now playing: {}", stream.name, title);
            }
        }

        info!("'{}' online ({} ms)", stream.name, latency_ms);
        ValidationResult::online(score)
    }
}

/// Decodes the first Shoutcast metadata block: `meta_int` audio bytes,
/// one length byte, then length*16 bytes of `key='value';` text.
fn parse_stream_title(buffer: &[u8], meta_int: usize) -> Option<String> {
    let block_len = *buffer.get(meta_int)? as usize * 16;
    if block_len == 0 {
        return None;
    }

    let start = meta_int + 1;
    let end = (start + block_len).min(buffer.len());
    if start >= end {
        return None;
    }

    let block = String::from_utf8_lossy(&buffer[start..end]);
    STREAM_TITLE_RE
        .captures(&block)
        .and_then(|captures| captures.get(1))
        .map(|title| title.as_str().to_string())
        .filter(|title| !title.is_empty())
}
