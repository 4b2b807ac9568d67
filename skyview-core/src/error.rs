//! Error taxonomy shared by the location store and the weather gateway.
//!
//! Every failure carries an [`ErrorCategory`] fixed at the point where it was
//! detected. Callers pick what to show from [`WeatherError::user_message`]
//! instead of inspecting message text.

use std::borrow::Cow;

/// Stable failure categories surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    Network,
    Format,
    Upstream,
    NotFound,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Network => "network",
            ErrorCategory::Format => "format",
            ErrorCategory::Upstream => "upstream",
            ErrorCategory::NotFound => "not-found",
        }
    }

    pub const fn all() -> &'static [ErrorCategory] {
        &[
            ErrorCategory::Validation,
            ErrorCategory::Network,
            ErrorCategory::Format,
            ErrorCategory::Upstream,
            ErrorCategory::NotFound,
        ]
    }

    /// Fixed, non-technical message for this category.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "Please choose a location first.",
            ErrorCategory::Network => {
                "Unable to reach the weather service. Please check your connection and try again."
            }
            ErrorCategory::Format => {
                "The weather service sent an unexpected response. Please try again in a moment."
            }
            ErrorCategory::Upstream => {
                "The weather service could not complete the request. Please try again later."
            }
            ErrorCategory::NotFound => "That location is no longer available.",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ErrorCategory {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ErrorCategory::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == value)
            .ok_or_else(|| anyhow::anyhow!("Unknown error category '{value}'."))
    }
}

/// Failure of a store or gateway operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeatherError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    Format(String),

    #[error("weather service error: {0}")]
    Upstream(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Upstream text longer than this is replaced by the category message.
const MAX_VERBATIM_LEN: usize = 80;

impl WeatherError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WeatherError::Validation(_) => ErrorCategory::Validation,
            WeatherError::Network(_) => ErrorCategory::Network,
            WeatherError::Format(_) => ErrorCategory::Format,
            WeatherError::Upstream(_) => ErrorCategory::Upstream,
            WeatherError::NotFound(_) => ErrorCategory::NotFound,
        }
    }

    /// Detail recorded where the failure was detected.
    pub fn detail(&self) -> &str {
        match self {
            WeatherError::Validation(s)
            | WeatherError::Network(s)
            | WeatherError::Format(s)
            | WeatherError::Upstream(s)
            | WeatherError::NotFound(s) => s,
        }
    }

    /// Message suitable for a toast or inline error banner.
    ///
    /// Upstream text is passed through only when it already reads like a
    /// short sentence; everything else maps to the category message.
    pub fn user_message(&self) -> Cow<'static, str> {
        match self {
            WeatherError::Upstream(msg) if is_presentable(msg) => Cow::Owned(msg.trim().to_string()),
            other => Cow::Borrowed(other.category().message()),
        }
    }
}

fn is_presentable(msg: &str) -> bool {
    let msg = msg.trim();
    !msg.is_empty()
        && msg.len() <= MAX_VERBATIM_LEN
        && !msg.contains('\n')
        && !msg.contains(['{', '}', '<', '>', '[', ']'])
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;
