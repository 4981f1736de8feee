use crate::config::AppConfig;
use crate::core::job::JobKind;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "nse-picks")]
#[command(about = "Scheduled NSE stock screens with Telegram alerts")]
pub struct CliConfig {
    /// Path to an optional TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit JSON log lines instead of the compact format
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a job once, as a manual dispatch
    Run {
        #[arg(value_enum, default_value = "intraday")]
        job: JobKind,

        /// Print the alert instead of sending it to Telegram
        #[arg(long)]
        dry_run: bool,

        /// Also write the picks as CSV under this directory
        #[arg(long)]
        output_path: Option<String>,
    },

    /// Show the next fire times of the configured schedule
    Schedule {
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
    },

    /// Stay resident and dispatch the job on every schedule tick
    Daemon {
        #[arg(value_enum, default_value = "intraday")]
        job: JobKind,

        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        output_path: Option<String>,
    },
}

impl CliConfig {
    /// No subcommand means the scheduled job itself: run the intraday picks.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run {
            job: JobKind::Intraday,
            dry_run: false,
            output_path: None,
        })
    }

    pub fn load_app_config(&self) -> Result<AppConfig> {
        match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                AppConfig::from_file(path)
            }
            None => Ok(AppConfig::default()),
        }
    }
}
