use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub ingestion: IngestionConfig,
    pub validation: ValidationConfig,
    pub subtitles: SubtitleConfig,
    pub reprocess: ReprocessConfig,
    pub adapters: AdapterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Cron expression (with seconds field) for full ingestion runs.
    pub cron: String,
    pub run_on_startup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub probe_timeout_secs: u64,
    pub min_segment_bytes: u64,
    pub min_vod_bytes: u64,
    /// Latency bands for audio-stream scoring.
    pub slow_ms: u64,
    pub very_slow_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleConfig {
    pub target_lang: String,
    pub storage_path: PathBuf,
    /// Base URL under which stored subtitle artifacts are served.
    pub public_base_url: String,
    pub opensubtitles_api_url: String,
    pub opensubtitles_api_key: Option<String>,
    pub translate_api_url: Option<String>,
    pub translate_api_key: Option<String>,
    pub ffmpeg_command: String,
    pub ffsubsync_command: String,
    pub sync_excerpt_secs: u64,
    pub tool_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReprocessConfig {
    /// Cron expression (with seconds field) for quarantine reprocessing.
    pub cron: String,
    pub max_per_run: usize,
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub pluto_vod_api_url: String,
    pub pluto_live_api_url: String,
    pub pluto_api_token: Option<String>,
    pub radiobrowser_api_url: String,
    pub rtp_play_api_url: String,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://./omnicast.db".to_string(),
                max_connections: Some(10),
            },
            ingestion: IngestionConfig {
                cron: "0 0 */6 * * *".to_string(),
                run_on_startup: true,
            },
            validation: ValidationConfig {
                probe_timeout_secs: 5,
                min_segment_bytes: 1024,
                min_vod_bytes: 1024,
                slow_ms: 2000,
                very_slow_ms: 4000,
            },
            subtitles: SubtitleConfig {
                target_lang: "pt-PT".to_string(),
                storage_path: PathBuf::from("./data/subtitles"),
                public_base_url: "https://cdn.omnicast.local/subs".to_string(),
                opensubtitles_api_url: "https://api.opensubtitles.com/api/v1".to_string(),
                opensubtitles_api_key: None,
                translate_api_url: None,
                translate_api_key: None,
                ffmpeg_command: "ffmpeg".to_string(),
                ffsubsync_command: "ffsubsync".to_string(),
                sync_excerpt_secs: 60,
                tool_timeout_secs: 120,
                fetch_timeout_secs: 15,
            },
            reprocess: ReprocessConfig {
                cron: "0 0 3 * * *".to_string(),
                max_per_run: 250,
                concurrency: 5,
            },
            adapters: AdapterConfig {
                pluto_vod_api_url: "https://service-vod.clusters.pluto.tv/v4/vod/categories"
                    .to_string(),
                pluto_live_api_url: "https://service-channels.clusters.pluto.tv/v2/guide"
                    .to_string(),
                pluto_api_token: None,
                radiobrowser_api_url: "https://api.radio-browser.info/json/stations".to_string(),
                rtp_play_api_url: "https://www.rtp.pt/play/api/episodios/ultimos".to_string(),
                user_agent: format!("omnicast-ingest/{}", env!("CARGO_PKG_VERSION")),
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        let mut config = if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(&config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::create_dir_all(&default_config.subtitles.storage_path)?;
            std::fs::write(&config_file, contents)?;
            default_config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables take precedence over file values. This is the
    /// whole deployment-facing configuration surface: tokens, target
    /// language, and the reprocessing knobs.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(token) = std::env::var("PLUTO_API_TOKEN") {
            self.adapters.pluto_api_token = Some(token);
        }
        if let Ok(key) = std::env::var("OPENSUBTITLES_API_KEY") {
            self.subtitles.opensubtitles_api_key = Some(key);
        }
        if let Ok(lang) = std::env::var("SUBTITLE_TARGET_LANG") {
            self.subtitles.target_lang = lang;
        }
        if let Ok(cron) = std::env::var("REPROCESS_CRON") {
            self.reprocess.cron = cron;
        }
        if let Ok(max) = std::env::var("REPROCESS_MAX_PER_RUN") {
            if let Ok(max) = max.parse() {
                self.reprocess.max_per_run = max;
            }
        }
        if let Ok(concurrency) = std::env::var("REPROCESS_CONCURRENCY") {
            if let Ok(concurrency) = concurrency.parse() {
                self.reprocess.concurrency = concurrency;
            }
        }
    }
}
