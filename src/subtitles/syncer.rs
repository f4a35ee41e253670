//! Subtitle/audio alignment provider
//!
//! Two external tools per attempt: one extracts a bounded excerpt of
//! the stream audio as mono 16 kHz PCM, the other shifts the subtitle
//! timing against that excerpt. Every attempt works inside its own
//! scratch directory which is removed on all exit paths.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};
use uuid::Uuid;

use super::{SubtitleProvider, SubtitleStore};
use crate::config::SubtitleConfig;
use crate::errors::SubtitleError;
use crate::models::{StreamRecord, SyncOutcome};

pub struct SyncerProvider {
    client: Client,
    store: SubtitleStore,
    ffmpeg_command: String,
    ffsubsync_command: String,
    sync_excerpt_secs: u64,
    tool_timeout: Duration,
}

impl SyncerProvider {
    pub fn new(config: &SubtitleConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            store: SubtitleStore::new(&config.storage_path, config.public_base_url.clone()),
            ffmpeg_command: config.ffmpeg_command.clone(),
            ffsubsync_command: config.ffsubsync_command.clone(),
            sync_excerpt_secs: config.sync_excerpt_secs,
            tool_timeout: Duration::from_secs(config.tool_timeout_secs),
        }
    }

    async fn fetch_subtitle(&self, url: &str) -> Result<String, SubtitleError> {
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

    async fn run_tool(&self, name: &str, mut command: Command) -> Result<(), SubtitleError> {
        // A lapsed timeout drops the output future; the child has to
        // die with it.
        command.kill_on_drop(true);

        let output = tokio::time::timeout(self.tool_timeout, command.output())
            .await
            .map_err(|_| SubtitleError::ToolTimeout {
                tool: name.to_string(),
                seconds: self.tool_timeout.as_secs(),
            })?
            .map_err(|err| SubtitleError::tool(name, err.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().last().unwrap_or("no output").trim();
            return Err(SubtitleError::tool(
                name,
                format!("exit {}: {}", output.status, detail),
            ));
        }
        Ok(())
    }

    async fn extract_audio_excerpt(
        &self,
        stream_url: &str,
        audio_path: &Path,
    ) -> Result<(), SubtitleError> {
        let mut command = Command::new(&self.ffmpeg_command);
        command
            .arg("-y")
            .arg("-i")
            .arg(stream_url)
            .arg("-t")
            .arg(self.sync_excerpt_secs.to_string())
            .arg("-vn")
            .arg("-acodec")
            .arg("pcm_s16le")
            .arg("-ar")
            .arg("16000")
            .arg("-ac")
            .arg("1")
            .arg(audio_path);
        self.run_tool(&self.ffmpeg_command, command).await
    }

    async fn align_subtitle(
        &self,
        input_path: &Path,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<(), SubtitleError> {
        let mut command = Command::new(&self.ffsubsync_command);
        command
            .arg(input_path)
            .arg("--audio")
            .arg(audio_path)
            .arg("-o")
            .arg(output_path);
        self.run_tool(&self.ffsubsync_command, command).await
    }
}

#[async_trait]
impl SubtitleProvider for SyncerProvider {
    fn name(&self) -> &'static str {
        "syncer"
    }

    async fn sync(
        &self,
        subtitle_url: &str,
        stream: &StreamRecord,
    ) -> Result<Option<SyncOutcome>, SubtitleError> {
        if subtitle_url.trim().is_empty() || stream.canonical_url.trim().is_empty() {
            return Err(SubtitleError::provider(
                "syncer",
                "subtitle URL or stream URL missing",
            ));
        }

        info!(
            "aligning subtitle {} against audio of '{}'",
            subtitle_url, stream.name
        );

        let subtitle_text = self.fetch_subtitle(subtitle_url).await?;

        // Scratch area lives exactly as long as this attempt.
        let scratch = TempDir::new()?;
        let input_path = scratch.path().join("input.srt");
        let audio_path = scratch.path().join("audio.wav");
        let output_path = scratch.path().join("synced.srt");

        tokio::fs::write(&input_path, &subtitle_text).await?;

        self.extract_audio_excerpt(&stream.canonical_url, &audio_path)
            .await?;
        self.align_subtitle(&input_path, &audio_path, &output_path)
            .await?;

        let synced_text = tokio::fs::read(&output_path).await?;
        let file_name = format!("{}-synced.srt", Uuid::new_v4());
        let stored_url = self.store.store(&file_name, &synced_text).await?;

        debug!("aligned subtitle stored at {}", stored_url);
        Ok(Some(SyncOutcome {
            url: stored_url,
            synced: true,
        }))
    }
}
