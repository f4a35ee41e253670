use anyhow::Result;
use chrono::Utc;
use sqlx::Row;

use super::{parse_datetime, Database};
use crate::models::{QuarantineRecord, StreamRecord, StreamStatus, StreamType, SubtitleEntry};

impl Database {
    /// Stores the complete rejected record so reprocessing can re-evaluate
    /// it without going back to the provider. A repeat rejection rewrites
    /// the row in place with the fresh reason and policy version; only the
    /// first quarantine timestamp survives, keeping the drain order stable.
    pub async fn save_to_quarantine(
        &self,
        stream: &StreamRecord,
        reason: &str,
        policy_version: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO quarantine (id, name, type, url, canonical_url, country, language,
                                    category, status, score, media, subtitles,
                                    quarantine_reason, policy_version, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                type = excluded.type,
                url = excluded.url,
                canonical_url = excluded.canonical_url,
                country = excluded.country,
                language = excluded.language,
                category = excluded.category,
                status = excluded.status,
                score = excluded.score,
                media = excluded.media,
                subtitles = excluded.subtitles,
                quarantine_reason = excluded.quarantine_reason,
                policy_version = excluded.policy_version,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&stream.id)
        .bind(&stream.name)
        .bind(stream.stream_type.as_str())
        .bind(&stream.url)
        .bind(&stream.canonical_url)
        .bind(&stream.country)
        .bind(&stream.language)
        .bind(&stream.category)
        .bind(stream.status.as_str())
        .bind(stream.score)
        .bind(serde_json::to_string(&stream.media)?)
        .bind(serde_json::to_string(&stream.subtitles)?)
        .bind(reason)
        .bind(policy_version)
        .bind(Utc::now().to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn remove_from_quarantine(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM quarantine WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Pages through quarantined records of one type, oldest first.
    pub async fn get_quarantine_items(
        &self,
        stream_type: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<QuarantineRecord>> {
        let rows = sqlx::query(
            "SELECT id, name, type, url, canonical_url, country, language, category,
             status, score, media, subtitles, quarantine_reason, policy_version,
             created_at, updated_at
             FROM quarantine WHERE type = ?
             ORDER BY created_at ASC
             LIMIT ? OFFSET ?",
        )
        .bind(stream_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::new();
        for row in rows {
            let media_raw: String = row.get("media");
            let subtitles_raw: String = row.get("subtitles");
            let created_at = parse_datetime(&row.get::<String, _>("created_at"))?;
            let updated_at = parse_datetime(&row.get::<String, _>("updated_at"))?;

            let stream = StreamRecord {
                id: row.get("id"),
                name: row.get("name"),
                stream_type: StreamType::parse(&row.get::<String, _>("type")),
                url: row.get("url"),
                canonical_url: row.get("canonical_url"),
                country: row.get("country"),
                language: row.get("language"),
                category: row.get("category"),
                media: serde_json::from_str(&media_raw)
                    .unwrap_or_else(|_| serde_json::json!({})),
                subtitles: serde_json::from_str::<Vec<SubtitleEntry>>(&subtitles_raw)
                    .unwrap_or_default(),
                status: StreamStatus::parse(&row.get::<String, _>("status")),
                score: row.get("score"),
                created_at,
                updated_at,
            };

            items.push(QuarantineRecord {
                stream,
                quarantine_reason: row.get("quarantine_reason"),
                policy_version: row.get("policy_version"),
                created_at,
                updated_at,
            });
        }

        Ok(items)
    }
}
