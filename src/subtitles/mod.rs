//! Subtitle enrichment
//!
//! Three provider roles behind one trait: searching for existing
//! subtitles, translating a source subtitle into the target language,
//! and aligning subtitle timing against the stream's audio. A provider
//! implements any subset and declines the rest, the pipeline tries
//! providers in registration order and takes the first success per
//! stage.

use std::path::PathBuf;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;
use crate::models::{StreamRecord, SubtitleEntry, SyncOutcome};
use crate::policy;

pub mod opensubtitles;
pub mod pipeline;
pub mod syncer;
pub mod translator;

pub use opensubtitles::OpenSubtitlesProvider;
pub use pipeline::SubtitlePipeline;
pub use syncer::SyncerProvider;
pub use translator::TranslatorProvider;

static SDH_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)hearing|sdh|hi").expect("sdh label regex should compile"));

/// One role-capable subtitle provider. Default implementations decline
/// every operation, so a provider only overrides what it supports.
#[async_trait]
pub trait SubtitleProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Searches for existing subtitles matching the record.
    async fn find(&self, stream: &StreamRecord) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        let _ = stream;
        Ok(Vec::new())
    }

    /// Translates the subtitle at `url` into `target_lang`.
    async fn translate(
        &self,
        url: &str,
        target_lang: &str,
    ) -> Result<Option<SubtitleEntry>, SubtitleError> {
        let _ = (url, target_lang);
        Ok(None)
    }

    /// Aligns the subtitle at `subtitle_url` against the stream audio.
    async fn sync(
        &self,
        subtitle_url: &str,
        stream: &StreamRecord,
    ) -> Result<Option<SyncOutcome>, SubtitleError> {
        let _ = (subtitle_url, stream);
        Ok(None)
    }
}

fn pt_priority(lang: &str) -> u8 {
    match lang.to_lowercase().as_str() {
        "pt-pt" => 3,
        "pt-br" => 2,
        "pt" => 1,
        _ => 0,
    }
}

/// Best Portuguese entry in a list: `pt-pt` over `pt-br` over bare
/// `pt`, earlier entries win ties. Non-Portuguese entries are ignored.
pub fn pick_best_pt(entries: &[SubtitleEntry]) -> Option<&SubtitleEntry> {
    let mut best: Option<(&SubtitleEntry, u8)> = None;
    for entry in entries {
        if !policy::is_pt_lang(&entry.lang) {
            continue;
        }
        let priority = pt_priority(&entry.lang);
        match best {
            Some((_, current)) if priority <= current => {}
            _ => best = Some((entry, priority)),
        }
    }
    best.map(|(entry, _)| entry)
}

fn source_score(entry: &SubtitleEntry) -> i32 {
    let lang = entry.lang.to_lowercase();
    let mut score = 0;
    if matches!(lang.as_str(), "en" | "eng") {
        score += 3;
    }
    if matches!(lang.as_str(), "es" | "spa" | "es-la") {
        score += 2;
    }
    if matches!(lang.as_str(), "fr" | "fra") {
        score += 1;
    }
    if let Some(label) = &entry.label {
        if SDH_LABEL_RE.is_match(label) {
            score -= 2;
        }
    }
    score
}

/// Best candidate to translate from: English over Spanish over French,
/// hearing-impaired variants penalized, earlier entries win ties.
pub fn pick_best_source(entries: &[SubtitleEntry]) -> Option<&SubtitleEntry> {
    let mut best: Option<(&SubtitleEntry, i32)> = None;
    for entry in entries {
        let score = source_score(entry);
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((entry, score)),
        }
    }
    best.map(|(entry, _)| entry)
}

/// Filesystem-backed artifact storage. Files land under one root
/// directory and are addressed through a public base URL.
#[derive(Debug, Clone)]
pub struct SubtitleStore {
    root: PathBuf,
    public_base_url: String,
}

impl SubtitleStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Writes an artifact and returns the URL it will be served under.
    pub async fn store(&self, file_name: &str, contents: &[u8]) -> Result<String, SubtitleError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(file_name);
        tokio::fs::write(&path, contents).await?;
        Ok(format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            file_name
        ))
    }
}
