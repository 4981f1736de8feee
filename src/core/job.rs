//! The unit of work a trigger runs.
//!
//! `Job::prepare` does all setup (config validation, secrets, HTTP clients)
//! and only the resulting `PreparedJob` can execute, so nothing reaches the
//! network before setup has succeeded. Manual and scheduled triggers both go
//! through `dispatch` with the same `Job`.

use crate::adapters::{ConsoleNotifier, LocalStorage, NseClient, TelegramNotifier, UpstoxClient};
use crate::app::pipelines::{IntradayPipeline, SwingPipeline};
use crate::config::secrets::{TelegramSecrets, UpstoxSecrets};
use crate::config::AppConfig;
use crate::core::etl::EtlEngine;
use crate::core::schedule::{describe_fire_time, parse_timezone, CronSchedule, Trigger};
use crate::domain::ports::{CandleSource, MarketData, Notifier};
use crate::utils::error::{PicksError, Result};
use crate::utils::validation::Validate;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum JobKind {
    /// NIFTY 100 momentum picks
    Intraday,
    /// 44-SMA swing scan over the symbols CSV
    Swing,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Intraday => f.write_str("intraday picks"),
            JobKind::Swing => f.write_str("swing scan"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    kind: JobKind,
    config: AppConfig,
    dry_run: bool,
}

impl Job {
    pub fn new(kind: JobKind, config: AppConfig) -> Self {
        Self {
            kind,
            config,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_output_path(mut self, output_path: Option<String>) -> Self {
        if output_path.is_some() {
            self.config.output.path = output_path;
        }
        self
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn prepare(&self) -> Result<PreparedJob> {
        self.prepare_with(|name| std::env::var(name).ok())
    }

    /// Setup with secrets read through `lookup` instead of the process environment.
    pub fn prepare_with<F>(&self, lookup: F) -> Result<PreparedJob>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.config.validate()?;
        let zone = parse_timezone(&self.config.schedule.display_timezone)?;

        let notifier: Arc<dyn Notifier> = if self.dry_run {
            Arc::new(ConsoleNotifier)
        } else {
            let secrets = TelegramSecrets::from_lookup(&lookup)?;
            Arc::new(TelegramNotifier::new(&self.config.telegram, secrets)?)
        };

        let source = match self.kind {
            JobKind::Intraday => JobSource::Nse(Arc::new(NseClient::new(&self.config.nse)?)),
            JobKind::Swing => {
                let secrets = UpstoxSecrets::from_lookup(&lookup)?;
                JobSource::Upstox(Arc::new(UpstoxClient::new(&self.config.swing, secrets)?))
            }
        };

        tracing::debug!("Prepared {} (dry run: {})", self.kind, self.dry_run);
        Ok(PreparedJob {
            kind: self.kind,
            config: self.config.clone(),
            notifier,
            source,
            zone,
        })
    }
}

enum JobSource {
    Nse(Arc<dyn MarketData>),
    Upstox(Arc<dyn CandleSource>),
}

pub struct PreparedJob {
    kind: JobKind,
    config: AppConfig,
    notifier: Arc<dyn Notifier>,
    source: JobSource,
    zone: Tz,
}

impl PreparedJob {
    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Runs for today's date in the display zone.
    pub async fn execute(&self) -> Result<String> {
        let today = Utc::now().with_timezone(&self.zone).date_naive();
        self.execute_on(today).await
    }

    pub async fn execute_on(&self, today: NaiveDate) -> Result<String> {
        let storage = self
            .config
            .output_path()
            .map(|path| LocalStorage::new(path.to_string()));

        match &self.source {
            JobSource::Nse(market) => {
                let mut pipeline = IntradayPipeline::new(
                    market.clone(),
                    self.notifier.clone(),
                    self.config.intraday.clone(),
                    today,
                )
                .with_concurrency(self.config.nse.concurrent_requests);
                if let Some(storage) = storage {
                    pipeline = pipeline.with_storage(storage);
                }
                EtlEngine::new(pipeline).run().await
            }
            JobSource::Upstox(candles) => {
                let mut pipeline =
                    SwingPipeline::new(candles.clone(), self.notifier.clone(), self.config.swing.clone(), today);
                if let Some(storage) = storage {
                    pipeline = pipeline.with_storage(storage);
                }
                EtlEngine::new(pipeline).run().await
            }
        }
    }
}

/// Setup, then the job itself. The trigger only affects logging.
pub async fn dispatch(job: &Job, trigger: Trigger) -> Result<String> {
    tracing::info!("▶️ Running {} ({})", job.kind(), trigger);
    let prepared = job.prepare()?;
    prepared.execute().await
}

/// Sleeps until each fire time and dispatches the job. A failed run is
/// logged and the loop waits for the next tick; Ctrl-C stops it.
pub async fn run_daemon(job: &Job, schedule: &CronSchedule) -> Result<()> {
    let zone = parse_timezone(&job.config().schedule.display_timezone)?;

    loop {
        let now = Utc::now();
        let next = schedule
            .next_after(now)
            .ok_or_else(|| PicksError::ScheduleError {
                expression: schedule.to_string(),
                reason: "schedule never fires".to_string(),
            })?;
        tracing::info!("⏰ Next {} run: {}", job.kind(), describe_fire_time(next, zone));

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("🛑 Received Ctrl-C, stopping scheduler");
                return Ok(());
            }
        }

        match dispatch(job, Trigger::Scheduled { at: next }).await {
            Ok(summary) => tracing::info!("✅ {}", summary),
            Err(e) => {
                tracing::error!(
                    "❌ Scheduled run failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            }
        }
    }
}
