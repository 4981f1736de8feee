use crate::config::secrets::TelegramSecrets;
use crate::config::toml_config::TelegramConfig;
use crate::domain::ports::Notifier;
use crate::utils::error::{PicksError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    parse_mode: String,
    secrets: TelegramSecrets,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, secrets: TelegramSecrets) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            parse_mode: config.parse_mode.clone(),
            secrets,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// A rejected message is logged and swallowed; only transport failures
    /// are errors. The URL carries the bot token and never reaches an error
    /// or a log line.
    async fn send_message(&self, text: &str) -> Result<()> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_base,
            self.secrets.bot_token.expose()
        );
        let form = [
            ("chat_id", self.secrets.chat_id.expose()),
            ("text", text),
            ("parse_mode", self.parse_mode.as_str()),
        ];

        tracing::debug!("Sending Telegram message ({} chars)", text.chars().count());
        let response = self
            .client
            .post(&url)
            .form(&form[..])
            .send()
            .await
            .map_err(|e| PicksError::NotificationError {
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("✅ Telegram message sent");
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("⚠️ Failed to send Telegram message ({}): {}", status, body);
        }

        Ok(())
    }
}

/// Prints alerts to stdout instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send_message(&self, text: &str) -> Result<()> {
        tracing::info!("🔍 DRY RUN - message not sent");
        println!("{}", text);
        Ok(())
    }
}
