//! Cron-driven execution of the ingestion run and the quarantine
//! reprocessing job. One-second tick; a job fires when the current time
//! passes the first schedule slot after its previous run.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio::time::{interval, Duration};
use tracing::{error, info, warn};

use super::IngestionRunner;
use crate::config::Config;
use crate::jobs::reprocess::QuarantineReprocessor;

struct ScheduledJob {
    name: &'static str,
    schedule: Option<Schedule>,
    last_run: DateTime<Utc>,
}

impl ScheduledJob {
    fn new(name: &'static str, cron_expr: &str, anchored_at: DateTime<Utc>) -> Self {
        let schedule = match Schedule::from_str(cron_expr) {
            Ok(schedule) => Some(schedule),
            Err(e) => {
                warn!(
                    "Job '{}' has invalid cron expression '{}': {}",
                    name, cron_expr, e
                );
                None
            }
        };

        Self {
            name,
            schedule,
            last_run: anchored_at,
        }
    }

    fn due(&self, now: DateTime<Utc>) -> bool {
        let Some(schedule) = &self.schedule else {
            return false;
        };
        match schedule.after(&self.last_run).next() {
            Some(next_time) => now >= next_time,
            None => false,
        }
    }

    fn log_next_run(&self) {
        if let Some(schedule) = &self.schedule {
            if let Some(next_time) = schedule.upcoming(Utc).next() {
                info!(
                    "Job '{}' - next scheduled run: {}",
                    self.name,
                    next_time.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
        }
    }
}

pub struct SchedulerService {
    runner: Arc<IngestionRunner>,
    reprocessor: Arc<QuarantineReprocessor>,
    config: Config,
}

impl SchedulerService {
    pub fn new(
        runner: Arc<IngestionRunner>,
        reprocessor: Arc<QuarantineReprocessor>,
        config: Config,
    ) -> Self {
        Self {
            runner,
            reprocessor,
            config,
        }
    }

    pub async fn start(self) -> Result<()> {
        info!("Starting scheduler service");
        let started = Utc::now();

        let mut ingestion = ScheduledJob::new("ingestion", &self.config.ingestion.cron, started);
        let mut reprocess = ScheduledJob::new("reprocess", &self.config.reprocess.cron, started);
        ingestion.log_next_run();
        reprocess.log_next_run();

        if self.config.ingestion.run_on_startup {
            info!("Running ingestion on startup");
            self.run_ingestion().await;
            ingestion.last_run = Utc::now();
        }

        let mut interval = interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            let now = Utc::now();

            if ingestion.due(now) {
                self.run_ingestion().await;
                ingestion.last_run = Utc::now();
                ingestion.log_next_run();
            }

            if reprocess.due(now) {
                self.run_reprocess().await;
                reprocess.last_run = Utc::now();
                reprocess.log_next_run();
            }
        }
    }

    async fn run_ingestion(&self) {
        if let Err(e) = self.runner.run().await {
            error!("Scheduled ingestion run failed: {}", e);
        }
    }

    async fn run_reprocess(&self) {
        if let Err(e) = self.reprocessor.run().await {
            error!("Scheduled quarantine reprocessing failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn job_fires_only_after_next_slot_passes() {
        let anchor = Utc::now();
        let job = ScheduledJob::new("every-second", "* * * * * *", anchor);

        assert!(!job.due(anchor));
        assert!(job.due(anchor + ChronoDuration::seconds(2)));
    }

    #[test]
    fn invalid_cron_never_fires() {
        let anchor = Utc::now();
        let job = ScheduledJob::new("broken", "not a cron line", anchor);

        assert!(job.schedule.is_none());
        assert!(!job.due(anchor + ChronoDuration::days(365)));
    }

    #[test]
    fn default_schedules_parse() {
        let config = Config::default();
        assert!(Schedule::from_str(&config.ingestion.cron).is_ok());
        assert!(Schedule::from_str(&config.reprocess.cron).is_ok());
    }
}
