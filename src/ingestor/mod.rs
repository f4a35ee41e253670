//! Ingestion orchestration
//!
//! One run moves records through discover, normalize, dedupe, validate,
//! decide, enrich and persist, in that order, with no backward
//! transitions. Discovery and validation fan out and wait for every
//! outcome before the run advances; a single record's failure is counted
//! and never aborts the run.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::database::Database;
use crate::models::{
    IngestionSummary, RawItem, SourceConfig, StreamRecord, StreamType, ValidationResult,
};
use crate::normalizer::{dedupe_streams, normalize};
use crate::policy;
use crate::registry::Registry;
use crate::subtitles::pipeline::SubtitlePipeline;
use crate::validators::schema::validate_stream_schema;

pub mod scheduler;

pub struct IngestionRunner {
    database: Database,
    registry: Arc<Registry>,
    subtitles: SubtitlePipeline,
}

impl IngestionRunner {
    pub fn new(database: Database, registry: Arc<Registry>, config: &Config) -> Self {
        let subtitles = SubtitlePipeline::new(
            registry.subtitle_providers().to_vec(),
            config.subtitles.target_lang.clone(),
        );
        Self {
            database,
            registry,
            subtitles,
        }
    }

    pub async fn run(&self) -> Result<IngestionSummary> {
        let started = std::time::Instant::now();
        info!(event = "ingestion_start", "ingestion run starting");

        let sources = self.database.get_active_sources(None).await?;
        let discovered = join_all(sources.iter().map(|source| self.discover_source(source))).await;
        let raw_items: Vec<RawItem> = discovered.into_iter().flatten().collect();

        let normalized: Vec<StreamRecord> = raw_items.into_iter().map(normalize).collect();
        let mut streams = dedupe_streams(normalized);
        let total = streams.len();

        // Probe everything up front; decisions see final status and score.
        let results = join_all(streams.iter().map(|stream| self.validate_stream(stream))).await;
        for (stream, result) in streams.iter_mut().zip(results) {
            stream.status = result.status;
            stream.score = result.score;
        }

        let mut accepted = 0usize;
        let mut quarantined = 0usize;
        let mut rejected = 0usize;

        for mut stream in streams {
            let decision = policy::evaluate(&stream);
            if !decision.accept {
                match self
                    .database
                    .save_to_quarantine(&stream, &decision.reason, policy::POLICY_VERSION)
                    .await
                {
                    Ok(()) => quarantined += 1,
                    Err(err) => {
                        error!(stream = %stream.name, error = %err, "quarantine write failed");
                        rejected += 1;
                    }
                }
                continue;
            }

            // Enrichment is best-effort: an accepted record is persisted
            // with whatever subtitles it ends up holding.
            if stream.stream_type == StreamType::Vod {
                self.subtitles.enrich(&mut stream).await;
            }

            if let Err(reason) = validate_stream_schema(&stream) {
                warn!(stream = %stream.name, reason = %reason, "stream failed schema validation");
                rejected += 1;
                continue;
            }

            match self.database.insert_stream(&stream).await {
                Ok(()) => accepted += 1,
                Err(err) => {
                    error!(stream = %stream.name, error = %err, "stream insert failed");
                    rejected += 1;
                }
            }
        }

        let summary = IngestionSummary {
            accepted,
            quarantined,
            rejected,
            total,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            event = "ingestion_end",
            accepted = summary.accepted,
            quarantined = summary.quarantined,
            rejected = summary.rejected,
            total = summary.total,
            duration_ms = summary.duration_ms,
            "ingestion run finished"
        );
        Ok(summary)
    }

    async fn discover_source(&self, source: &SourceConfig) -> Vec<RawItem> {
        let Some(adapter) = self.registry.adapter(&source.adapter_id) else {
            warn!(
                source = %source.name,
                adapter_id = %source.adapter_id,
                "no adapter registered for source"
            );
            return Vec::new();
        };

        let items = adapter.discover(&source.config).await;
        info!(source = %source.name, items = items.len(), "source discovery finished");
        items
    }

    async fn validate_stream(&self, stream: &StreamRecord) -> ValidationResult {
        match self.registry.validator_for(stream) {
            Some(validator) => validator.validate(stream).await,
            None => {
                warn!(stream = %stream.name, "no validator registered for stream");
                ValidationResult::offline(0, "no validator registered")
            }
        }
    }
}
