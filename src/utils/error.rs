use thiserror::Error;

#[derive(Error, Debug)]
pub enum PicksError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Market data error for {symbol}: {message}")]
    MarketDataError { symbol: String, message: String },

    #[error("Invalid schedule '{expression}': {reason}")]
    ScheduleError { expression: String, reason: String },

    #[error("Notification error: {message}")]
    NotificationError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Storage,
    Notification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PicksError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PicksError::ApiError(_) | PicksError::MarketDataError { .. } => ErrorCategory::Network,
            PicksError::ConfigError { .. }
            | PicksError::ConfigValidationError { .. }
            | PicksError::InvalidConfigValueError { .. }
            | PicksError::MissingConfigError { .. }
            | PicksError::ScheduleError { .. } => ErrorCategory::Configuration,
            PicksError::CsvError(_)
            | PicksError::ProcessingError { .. } => ErrorCategory::Data,
            PicksError::IoError(_) => ErrorCategory::Storage,
            PicksError::NotificationError { .. } => ErrorCategory::Notification,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路問題通常重跑即可
            ErrorCategory::Network | ErrorCategory::Notification => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Medium
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            PicksError::ApiError(_) => {
                "Check network connectivity and whether the upstream API is reachable, then re-run the job".to_string()
            }
            PicksError::MarketDataError { symbol, .. } => format!(
                "Market data for {} was unavailable; NSE may be rate limiting, retry in a few minutes",
                symbol
            ),
            PicksError::MissingConfigError { field } => {
                format!("Set the {} environment variable or config entry", field)
            }
            PicksError::ConfigError { .. }
            | PicksError::ConfigValidationError { .. }
            | PicksError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command line flags".to_string()
            }
            PicksError::ScheduleError { .. } => {
                "Use a five-field cron expression such as '32 3 * * 1-5'".to_string()
            }
            PicksError::CsvError(_) => {
                "Make sure the symbols CSV has an instrument_key column and a tradingsymbol or symbol column".to_string()
            }
            PicksError::IoError(_) => "Check file paths and permissions".to_string(),
            PicksError::NotificationError { .. } => {
                "Check that api.telegram.org is reachable and TELEGRAM_BOT_TOKEN is valid".to_string()
            }
            PicksError::ProcessingError { .. } => {
                "Run with --verbose to inspect the data that failed".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not fetch data: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Could not process data: {}", self),
            ErrorCategory::Storage => format!("File access failed: {}", self),
            ErrorCategory::Notification => format!("Could not deliver the alert: {}", self),
        }
    }

    /// 對應 CLI 的結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, PicksError>;
