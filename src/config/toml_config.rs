use crate::core::schedule::CronSchedule;
use crate::utils::error::{PicksError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SCHEDULE: &str = "32 3 * * 1-5";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub schedule: ScheduleConfig,
    pub nse: NseConfig,
    pub intraday: IntradayConfig,
    pub swing: SwingConfig,
    pub telegram: TelegramConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Five-field cron expression, evaluated in UTC.
    pub cron: String,
    /// Zone used when printing fire times and dating the alerts.
    pub display_timezone: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: DEFAULT_SCHEDULE.to_string(),
            display_timezone: "Asia/Kolkata".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NseConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub concurrent_requests: usize,
}

impl Default for NseConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.nseindia.com".to_string(),
            timeout_seconds: 10,
            concurrent_requests: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntradayConfig {
    pub index: String,
    /// Reference only; sizing uses `margin_per_trade`.
    pub capital_total: f64,
    pub margin_per_trade: f64,
    pub leverage: f64,
    pub max_symbols_per_day: usize,
    /// % change vs previous close, covering the pre-market and opening move.
    pub premarket_threshold: f64,
    pub oi_threshold: f64,
    pub sl_factor: f64,
    pub target_factor: f64,
    pub sector_min_count: usize,
}

impl Default for IntradayConfig {
    fn default() -> Self {
        Self {
            index: "NIFTY 100".to_string(),
            capital_total: 50_000.0,
            margin_per_trade: 15_000.0,
            leverage: 2.0,
            max_symbols_per_day: 3,
            premarket_threshold: 2.0,
            oi_threshold: 7.0,
            sl_factor: 0.015,
            target_factor: 0.03,
            sector_min_count: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingConfig {
    pub symbols_csv: String,
    pub base_url: String,
    pub ma_period: usize,
    pub rsi_period: usize,
    pub volume_period: usize,
    pub support_tolerance: f64,
    pub slope_lookback: usize,
    pub min_slope_angle: f64,
    pub rsi_min: f64,
    pub rsi_max: f64,
    pub min_candles: usize,
    pub history_days: i64,
    pub max_signals: usize,
    pub api_sleep_ms: u64,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            symbols_csv: "symbols_data.csv".to_string(),
            base_url: "https://api.upstox.com/v3/historical-candle".to_string(),
            ma_period: 44,
            rsi_period: 14,
            volume_period: 20,
            support_tolerance: 0.002,
            slope_lookback: 5,
            min_slope_angle: 2.0,
            rsi_min: 38.0,
            rsi_max: 60.0,
            min_candles: 50,
            history_days: 150,
            max_signals: 10,
            api_sleep_ms: 150,
            timeout_seconds: 15,
            retry_attempts: 3,
            retry_delay_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub api_base: String,
    pub parse_mode: String,
    pub timeout_seconds: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            parse_mode: "Markdown".to_string(),
            timeout_seconds: 20,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// When set, each run also writes its picks as CSV under this directory.
    pub path: Option<String>,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PicksError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PicksError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${NSE_BASE_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PicksError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn output_path(&self) -> Option<&str> {
        self.output.path.as_deref()
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("schedule.cron", &self.schedule.cron)?;
        CronSchedule::parse(&self.schedule.cron)?;
        self.schedule
            .display_timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| PicksError::InvalidConfigValueError {
                field: "schedule.display_timezone".to_string(),
                value: self.schedule.display_timezone.clone(),
                reason: e.to_string(),
            })?;

        validation::validate_url("nse.base_url", &self.nse.base_url)?;
        validation::validate_positive_number(
            "nse.concurrent_requests",
            self.nse.concurrent_requests,
            1,
        )?;

        let intraday = &self.intraday;
        validation::validate_non_empty_string("intraday.index", &intraday.index)?;
        validation::validate_positive_number(
            "intraday.max_symbols_per_day",
            intraday.max_symbols_per_day,
            1,
        )?;
        validation::validate_positive_number(
            "intraday.sector_min_count",
            intraday.sector_min_count,
            1,
        )?;
        validation::validate_range("intraday.sl_factor", intraday.sl_factor, 0.0, 1.0)?;
        validation::validate_range("intraday.target_factor", intraday.target_factor, 0.0, 10.0)?;
        validation::validate_range("intraday.leverage", intraday.leverage, 1.0, 20.0)?;
        if intraday.margin_per_trade <= 0.0 {
            return Err(PicksError::InvalidConfigValueError {
                field: "intraday.margin_per_trade".to_string(),
                value: intraday.margin_per_trade.to_string(),
                reason: "Margin must be positive".to_string(),
            });
        }

        let swing = &self.swing;
        validation::validate_path("swing.symbols_csv", &swing.symbols_csv)?;
        validation::validate_file_extensions("swing.symbols_csv", &[&swing.symbols_csv], &["csv"])?;
        validation::validate_url("swing.base_url", &swing.base_url)?;
        validation::validate_positive_number("swing.ma_period", swing.ma_period, 2)?;
        validation::validate_positive_number("swing.rsi_period", swing.rsi_period, 2)?;
        validation::validate_positive_number("swing.slope_lookback", swing.slope_lookback, 1)?;
        validation::validate_positive_number("swing.max_signals", swing.max_signals, 1)?;
        validation::validate_positive_number("swing.retry_attempts", swing.retry_attempts as usize, 1)?;
        validation::validate_range("swing.rsi_min", swing.rsi_min, 0.0, swing.rsi_max)?;
        validation::validate_range("swing.rsi_max", swing.rsi_max, swing.rsi_min, 100.0)?;
        // 至少要涵蓋均線與最後三根 K 線
        validation::validate_positive_number(
            "swing.min_candles",
            swing.min_candles,
            swing.ma_period.max(swing.slope_lookback) + 3,
        )?;

        validation::validate_url("telegram.api_base", &self.telegram.api_base)?;

        if let Some(path) = self.output_path() {
            validation::validate_path("output.path", path)?;
        }

        Ok(())
    }
}
