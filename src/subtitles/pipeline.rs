//! Find / translate / sync enrichment chain
//!
//! Works on one record at a time and never fails it: provider errors
//! are logged and the chain moves on. The record ends up with at most
//! one new Portuguese entry, synced when any provider managed to align
//! it, unsynced otherwise.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{pick_best_pt, pick_best_source, SubtitleProvider};
use crate::models::{StreamRecord, SubtitleEntry, SyncOutcome};

pub struct SubtitlePipeline {
    providers: Vec<Arc<dyn SubtitleProvider>>,
    target_lang: String,
}

impl SubtitlePipeline {
    pub fn new(providers: Vec<Arc<dyn SubtitleProvider>>, target_lang: impl Into<String>) -> Self {
        Self {
            providers,
            target_lang: target_lang.into(),
        }
    }

    /// Runs the full chain against one record, mutating its subtitle
    /// list in place.
    pub async fn enrich(&self, record: &mut StreamRecord) {
        let mut pt_subtitle = self.find_direct(record).await;

        match &pt_subtitle {
            Some(entry) => {
                if !record.subtitles.iter().any(|s| s.url == entry.url) {
                    record.subtitles.push(entry.clone());
                }
                info!(
                    event = "subtitle_found",
                    stream_id = %record.id,
                    lang = %entry.lang,
                    "subtitle found for '{}'", record.name
                );
            }
            None => {
                if let Some(entry) = self.translate_best_source(record).await {
                    info!(
                        event = "subtitle_translated",
                        stream_id = %record.id,
                        lang = %entry.lang,
                        "subtitle translated for '{}'", record.name
                    );
                    record.subtitles.push(entry.clone());
                    pt_subtitle = Some(entry);
                }
            }
        }

        let Some(entry) = pt_subtitle else {
            debug!("no Portuguese subtitle obtained for '{}'", record.name);
            return;
        };
        if entry.synced {
            return;
        }

        let outcome = self.sync_subtitle(&entry, record).await;
        if outcome.synced {
            for subtitle in &mut record.subtitles {
                if subtitle.url == entry.url {
                    subtitle.url = outcome.url.clone();
                    subtitle.synced = true;
                }
            }
            info!(
                event = "subtitle_synced",
                stream_id = %record.id,
                "subtitle synced for '{}'", record.name
            );
        } else {
            info!(
                event = "subtitle_sync_failed",
                stream_id = %record.id,
                "subtitle for '{}' kept unsynced", record.name
            );
        }
    }

    /// First provider whose search results contain a Portuguese entry
    /// wins; the best variant from that result set is taken.
    async fn find_direct(&self, record: &StreamRecord) -> Option<SubtitleEntry> {
        for provider in &self.providers {
            match provider.find(record).await {
                Ok(found) => {
                    if let Some(best) = pick_best_pt(&found) {
                        return Some(best.clone());
                    }
                }
                Err(err) => {
                    warn!(
                        "subtitle search via {} failed for '{}': {}",
                        provider.name(),
                        record.name,
                        err
                    );
                }
            }
        }
        None
    }

    /// Picks the best source among the record's existing entries and
    /// asks each provider in turn to translate it.
    async fn translate_best_source(&self, record: &StreamRecord) -> Option<SubtitleEntry> {
        let source = pick_best_source(&record.subtitles)?.clone();

        for provider in &self.providers {
            match provider.translate(&source.url, &self.target_lang).await {
                Ok(Some(translated)) => {
                    return Some(SubtitleEntry {
                        lang: self.target_lang.clone(),
                        url: translated.url,
                        source: Some(provider.name().to_string()),
                        label: translated.label,
                        translated: true,
                        synced: false,
                    });
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        "translation via {} failed for '{}': {}",
                        provider.name(),
                        record.name,
                        err
                    );
                }
            }
        }
        None
    }

    /// First provider reporting a successful alignment wins. Total
    /// failure keeps the original URL, marked unsynced.
    async fn sync_subtitle(&self, entry: &SubtitleEntry, record: &StreamRecord) -> SyncOutcome {
        for provider in &self.providers {
            match provider.sync(&entry.url, record).await {
                Ok(Some(outcome)) if outcome.synced => return outcome,
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        "subtitle alignment via {} failed for '{}': {}",
                        provider.name(),
                        record.name,
                        err
                    );
                }
            }
        }
        SyncOutcome {
            url: entry.url.clone(),
            synced: false,
        }
    }
}
