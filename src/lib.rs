pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{ConsoleNotifier, LocalStorage, NseClient, TelegramNotifier, UpstoxClient};
pub use config::AppConfig;
pub use core::{dispatch, etl::EtlEngine, CronSchedule, Job, JobKind, Trigger};
pub use utils::error::{PicksError, Result};
