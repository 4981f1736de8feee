mod common;

use chrono::NaiveDate;
use common::*;
use httpmock::prelude::*;
use nse_picks::config::{TelegramSecrets, UpstoxSecrets};
use nse_picks::{Job, JobKind};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("nse_picks=trace,info")
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

#[tokio::test]
async fn test_run_logs_never_contain_secrets() {
    let (logs, _guard) = capture();

    let nse = MockServer::start();
    let telegram = MockServer::start();
    mock_nse(&nse, "NIFTY 100", &banking_morning());
    telegram.mock(|when, then| {
        when.method(POST).path_contains("/sendMessage");
        then.status(400)
            .json_body(serde_json::json!({ "ok": false, "description": "Bad Request: chat not found" }));
    });

    let job = Job::new(JobKind::Intraday, config_for(&nse, &telegram));
    tracing::debug!("job: {:?}", job);
    let summary = job
        .prepare_with(secrets)
        .unwrap()
        .execute_on(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap())
        .await
        .unwrap();
    assert!(summary.starts_with("3 intraday pick(s)"));

    let text = logs.text();
    assert!(text.contains("Failed to send Telegram message"));
    assert!(!text.contains(BOT_TOKEN));
    assert!(!text.contains("test-bot-token"));
    assert!(!text.contains(CHAT_ID));
}

#[tokio::test]
async fn test_unreachable_telegram_error_hides_token() {
    let nse = MockServer::start();
    mock_nse(&nse, "NIFTY 100", &banking_morning());

    let mut config = config_for(&nse, &nse);
    config.telegram.api_base = "http://127.0.0.1:9".to_string();

    let err = Job::new(JobKind::Intraday, config)
        .prepare_with(secrets)
        .unwrap()
        .execute_on(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap())
        .await
        .unwrap_err();

    assert!(!err.to_string().contains("test-bot-token"));
    assert!(!format!("{:?}", err).contains("test-bot-token"));
    assert!(!err.user_friendly_message().contains("test-bot-token"));
}

#[test]
fn test_secret_types_redact_debug_output() {
    let telegram = TelegramSecrets::new(BOT_TOKEN, CHAT_ID);
    let upstox = UpstoxSecrets::new("upstox-test-token");

    let printed = format!("{:?} {:?}", telegram, upstox);
    assert!(!printed.contains("test-bot-token"));
    assert!(!printed.contains(CHAT_ID));
    assert!(!printed.contains("upstox-test-token"));
}
