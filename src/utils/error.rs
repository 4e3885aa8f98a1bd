use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Network request failed for {url}: {message}")]
    Network {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Rate limited by {url} (HTTP 429)")]
    RateLimited { url: String },

    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    #[error("Validation error in {context}: {message}")]
    Validation { context: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Storage error at {path}: {message}")]
    Storage { path: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },
}

/// 錯誤分類，讓呼叫端可以依原因判斷，而不只是判斷是否失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    RateLimit,
    Parse,
    Validation,
    Storage,
    Config,
}

impl HarvestError {
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::Network {
            url: url.into(),
            status: Some(status),
            message: format!("HTTP {}", status),
        }
    }

    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn validation(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => ErrorKind::Network,
            Self::RateLimited { .. } => ErrorKind::RateLimit,
            Self::Parse { .. } | Self::SerializationError(_) => ErrorKind::Parse,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::IoError(_) | Self::Storage { .. } => ErrorKind::Storage,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorKind::Config,
        }
    }

    /// 只有傳輸層的暫時性錯誤值得重試；結構錯誤重試也不會變好
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Network => "Check connectivity or raise the platform timeout",
            ErrorKind::RateLimit => "Lower the fetch frequency or raise retry_delay_ms",
            ErrorKind::Parse => "The source changed its payload shape; update the adapter",
            ErrorKind::Validation => "The source reported an application error; inspect the payload",
            ErrorKind::Storage => "Check permissions and free space of the output directories",
            ErrorKind::Config => "Fix the configuration file and run again",
        }
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;
