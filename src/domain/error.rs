//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for stockhunter.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("invalid configuration {key}: {reason}")]
    InvalidConfiguration { key: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("provider returned no {what} for {date}")]
    ProviderGap { what: String, date: NaiveDate },

    #[error("provider error: {reason}")]
    Provider { reason: String },

    #[error("invalid position {ticker}: {reason}")]
    InvalidPosition { ticker: String, reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScreenerError {
    pub fn invalid_config(key: &str, reason: impl Into<String>) -> Self {
        ScreenerError::InvalidConfiguration {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn provider(reason: impl Into<String>) -> Self {
        ScreenerError::Provider {
            reason: reason.into(),
        }
    }
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        let code: u8 = match err {
            ScreenerError::Io(_) | ScreenerError::InvalidPosition { .. } => 1,
            ScreenerError::InvalidConfiguration { .. }
            | ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigInvalid { .. } => 2,
            ScreenerError::Provider { .. } | ScreenerError::ProviderGap { .. } => 3,
            ScreenerError::Report { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
