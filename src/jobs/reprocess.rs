//! Quarantine reprocessing
//!
//! Drains the oldest quarantined VOD records in bounded batches, gives
//! each one a fresh enrichment attempt and a fresh policy decision, and
//! either releases it into the catalog or rewrites its quarantine entry.
//! A single item's failure is counted and never stops the run.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::{error, info};

use crate::config::Config;
use crate::database::Database;
use crate::models::{QuarantineRecord, ReprocessSummary, StreamRecord};
use crate::policy;
use crate::registry::Registry;
use crate::subtitles::pipeline::SubtitlePipeline;

enum Outcome {
    Released,
    Kept,
    Failed,
}

pub struct QuarantineReprocessor {
    database: Database,
    subtitles: SubtitlePipeline,
    max_per_run: usize,
    concurrency: usize,
}

impl QuarantineReprocessor {
    pub fn new(database: Database, registry: Arc<Registry>, config: &Config) -> Self {
        let subtitles = SubtitlePipeline::new(
            registry.subtitle_providers().to_vec(),
            config.subtitles.target_lang.clone(),
        );
        Self {
            database,
            subtitles,
            max_per_run: config.reprocess.max_per_run,
            concurrency: config.reprocess.concurrency,
        }
    }

    pub async fn run(&self) -> Result<ReprocessSummary> {
        let started = std::time::Instant::now();
        info!(event = "quarantine_reprocess_start", "quarantine reprocessing starting");

        let items = self
            .database
            .get_quarantine_items("vod", self.max_per_run as i64, 0)
            .await?;
        if items.is_empty() {
            info!(event = "no_items", "quarantine is empty, nothing to reprocess");
            return Ok(ReprocessSummary {
                duration_ms: started.elapsed().as_millis() as u64,
                ..Default::default()
            });
        }

        let total = items.len();
        let mut outcomes = Vec::with_capacity(total);
        for batch in items.chunks(self.concurrency.max(1)) {
            let batch_outcomes =
                join_all(batch.iter().map(|item| self.reprocess_item(item))).await;
            outcomes.extend(batch_outcomes);
        }

        let mut summary = ReprocessSummary {
            total,
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Released => {
                    summary.released += 1;
                    summary.processed += 1;
                }
                Outcome::Kept => {
                    summary.kept += 1;
                    summary.processed += 1;
                }
                Outcome::Failed => summary.failed += 1,
            }
        }
        summary.duration_ms = started.elapsed().as_millis() as u64;

        info!(
            event = "quarantine_reprocess_end",
            processed = summary.processed,
            released = summary.released,
            kept = summary.kept,
            failed = summary.failed,
            total = summary.total,
            duration_ms = summary.duration_ms,
            "quarantine reprocessing finished"
        );
        Ok(summary)
    }

    async fn reprocess_item(&self, item: &QuarantineRecord) -> Outcome {
        let item_start = std::time::Instant::now();
        let mut stream = item.stream.clone();

        self.subtitles.enrich(&mut stream).await;
        let decision = policy::evaluate(&stream);

        let result = if decision.accept {
            self.release(&stream).await
        } else {
            self.database
                .save_to_quarantine(&stream, &decision.reason, policy::POLICY_VERSION)
                .await
        };

        match result {
            Ok(()) if decision.accept => {
                info!(
                    event = "released",
                    stream_id = %stream.id,
                    stream = %stream.name,
                    reason = %decision.reason,
                    duration_ms = item_start.elapsed().as_millis() as u64,
                    "quarantined stream released into the catalog"
                );
                Outcome::Released
            }
            Ok(()) => {
                info!(
                    event = "kept",
                    stream_id = %stream.id,
                    stream = %stream.name,
                    reason = %decision.reason,
                    duration_ms = item_start.elapsed().as_millis() as u64,
                    "stream kept in quarantine"
                );
                Outcome::Kept
            }
            Err(err) => {
                error!(
                    stream_id = %stream.id,
                    stream = %stream.name,
                    error = %err,
                    "quarantine reprocessing failed for stream"
                );
                Outcome::Failed
            }
        }
    }

    // Insert first so a write failure leaves the record quarantined for
    // the next run instead of dropping it from both tables.
    async fn release(&self, stream: &StreamRecord) -> Result<()> {
        self.database.insert_stream(stream).await?;
        self.database.remove_from_quarantine(&stream.id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::models::{StreamStatus, StreamType, SubtitleEntry};
    use crate::subtitles::SubtitleProvider;
    use async_trait::async_trait;
    use chrono::Utc;

    struct PtFinder;

    #[async_trait]
    impl SubtitleProvider for PtFinder {
        fn name(&self) -> &'static str {
            "pt-finder"
        }

        async fn find(
            &self,
            stream: &StreamRecord,
        ) -> Result<Vec<SubtitleEntry>, crate::errors::SubtitleError> {
            Ok(vec![SubtitleEntry {
                lang: "pt-pt".to_string(),
                url: format!("http://subs/{}.pt.srt", stream.id),
                source: Some("pt-finder".to_string()),
                label: None,
                translated: false,
                synced: false,
            }])
        }
    }

    fn quarantined_vod(id: &str) -> StreamRecord {
        StreamRecord {
            id: id.to_string(),
            name: "Filme Quarentenado".to_string(),
            stream_type: StreamType::Vod,
            url: format!("http://ex/{id}.mp4"),
            canonical_url: format!("http://ex/{id}.mp4"),
            country: None,
            language: Some("en".to_string()),
            category: "movies".to_string(),
            media: serde_json::json!({}),
            subtitles: Vec::new(),
            status: StreamStatus::Online,
            score: 100,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn reprocessor_with(
        providers: Vec<Arc<dyn SubtitleProvider>>,
    ) -> (QuarantineReprocessor, Database) {
        let config = Config::default();
        let db_config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: Some(1),
        };
        let database = Database::new(&db_config).await.unwrap();
        database.migrate().await.unwrap();

        let registry = Arc::new(Registry::new(Vec::new(), Vec::new(), providers));
        let reprocessor = QuarantineReprocessor::new(database.clone(), registry, &config);
        (reprocessor, database)
    }

    #[tokio::test]
    async fn found_pt_subtitle_releases_the_record() {
        let (reprocessor, database) = reprocessor_with(vec![Arc::new(PtFinder)]).await;
        database
            .save_to_quarantine(
                &quarantined_vod("vod-r1"),
                "no PT audio or subtitles",
                policy::POLICY_VERSION,
            )
            .await
            .unwrap();

        let summary = reprocessor.run().await.unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.released, 1);
        assert_eq!(summary.kept, 0);
        assert_eq!(summary.failed, 0);

        let released = database.get_stream("vod-r1").await.unwrap().unwrap();
        assert!(released.subtitles.iter().any(|s| s.lang == "pt-pt"));
        assert!(database
            .get_quarantine_items("vod", 10, 0)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn unenrichable_record_stays_with_fresh_reason() {
        let (reprocessor, database) = reprocessor_with(Vec::new()).await;
        database
            .save_to_quarantine(&quarantined_vod("vod-r2"), "stale reason", "pt-first-vod@0.9.0")
            .await
            .unwrap();

        let summary = reprocessor.run().await.unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.kept, 1);
        assert_eq!(summary.released, 0);

        let held = database.get_quarantine_items("vod", 10, 0).await.unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].quarantine_reason, "no PT audio or subtitles");
        assert_eq!(held[0].policy_version, policy::POLICY_VERSION);
    }

    #[tokio::test]
    async fn empty_quarantine_short_circuits() {
        let (reprocessor, _database) = reprocessor_with(Vec::new()).await;
        let summary = reprocessor.run().await.unwrap();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.processed, 0);
    }
}
