use anyhow::Result;
use chrono::Utc;
use sqlx::Row;

use super::{parse_datetime, Database};
use crate::models::{StreamRecord, StreamStatus, StreamType, SubtitleEntry};

fn stream_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<StreamRecord> {
    let media_raw: String = row.get("media");
    let subtitles_raw: String = row.get("subtitles");

    Ok(StreamRecord {
        id: row.get("id"),
        name: row.get("name"),
        stream_type: StreamType::parse(&row.get::<String, _>("type")),
        url: row.get("url"),
        canonical_url: row.get("canonical_url"),
        country: row.get("country"),
        language: row.get("language"),
        category: row.get("category"),
        media: serde_json::from_str(&media_raw).unwrap_or_else(|_| serde_json::json!({})),
        subtitles: serde_json::from_str::<Vec<SubtitleEntry>>(&subtitles_raw).unwrap_or_default(),
        status: StreamStatus::parse(&row.get::<String, _>("status")),
        score: row.get("score"),
        created_at: parse_datetime(&row.get::<String, _>("created_at"))?,
        updated_at: parse_datetime(&row.get::<String, _>("updated_at"))?,
    })
}

impl Database {
    /// Upserts a catalog entry. An existing row keeps its original
    /// `created_at`; every other column follows the incoming record.
    pub async fn insert_stream(&self, stream: &StreamRecord) -> Result<()> {
        if stream.id.trim().is_empty() || stream.name.trim().is_empty() {
            anyhow::bail!("stream requires an id and a name");
        }

        sqlx::query(
            r#"
            INSERT INTO streams (id, name, type, url, canonical_url, country, language,
                                 category, status, score, media, subtitles, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
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
        .bind(stream.created_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_stream(&self, id: &str) -> Result<Option<StreamRecord>> {
        let row = sqlx::query(
            "SELECT id, name, type, url, canonical_url, country, language, category,
             status, score, media, subtitles, created_at, updated_at
             FROM streams WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(stream_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_streams(&self, stream_type: Option<&str>) -> Result<Vec<StreamRecord>> {
        let rows = match stream_type {
            Some(t) => {
                sqlx::query(
                    "SELECT id, name, type, url, canonical_url, country, language, category,
                     status, score, media, subtitles, created_at, updated_at
                     FROM streams WHERE type = ? ORDER BY name ASC",
                )
                .bind(t)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, name, type, url, canonical_url, country, language, category,
                     status, score, media, subtitles, created_at, updated_at
                     FROM streams ORDER BY name ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut streams = Vec::new();
        for row in rows {
            streams.push(stream_from_row(&row)?);
        }

        Ok(streams)
    }
}
