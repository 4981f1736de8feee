#[cfg(feature = "cli")]
pub mod cli;
pub mod secrets;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};
pub use secrets::{Secret, TelegramSecrets, UpstoxSecrets};
pub use toml_config::AppConfig;
