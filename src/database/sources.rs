use anyhow::Result;
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::models::SourceConfig;

impl Database {
    /// Active source registrations, optionally narrowed to one stream type.
    /// The ingestion run fans out over exactly this list.
    pub async fn get_active_sources(
        &self,
        stream_type: Option<&str>,
    ) -> Result<Vec<SourceConfig>> {
        let rows = match stream_type {
            Some(t) => {
                sqlx::query(
                    "SELECT id, name, adapter_id, config, is_active
                     FROM sources WHERE is_active = 1 AND type = ?
                     ORDER BY name ASC",
                )
                .bind(t)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, name, adapter_id, config, is_active
                     FROM sources WHERE is_active = 1
                     ORDER BY name ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut sources = Vec::new();
        for row in rows {
            let config_raw: String = row.get("config");
            sources.push(SourceConfig {
                id: Uuid::parse_str(&row.get::<String, _>("id"))?,
                name: row.get("name"),
                adapter_id: row.get("adapter_id"),
                config: serde_json::from_str(&config_raw)
                    .unwrap_or_else(|_| serde_json::json!({})),
                active: row.get("is_active"),
            });
        }

        Ok(sources)
    }
}
