use slack_morphism::errors::SlackClientError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Slack error codes that mean the bot token itself is unusable.
const AUTH_ERROR_CODES: &[&str] = &[
    "invalid_auth",
    "not_authed",
    "account_inactive",
    "token_revoked",
    "token_expired",
];

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("Failed to parse Slack payload: {0}")]
    ParseError(String),

    #[error("Failed to access Slack API: {0}")]
    ApiError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Slack rejected the bot credentials: {0}")]
    AuthError(String),

    #[error("Slack real-time connection failed: {0}")]
    TransportError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("{0}")]
    GeneralError(String),
}

impl SlackError {
    /// Map a Slack `error` code from a `{"ok": false}` response.
    #[must_use]
    pub fn from_api_code(method: &str, code: &str) -> Self {
        if AUTH_ERROR_CODES.contains(&code) {
            SlackError::AuthError(format!("{method}: {code}"))
        } else {
            SlackError::ApiError(format!("{method} error: {code}"))
        }
    }

    /// Authentication failures end the process; nothing else does.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, SlackError::AuthError(_))
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SlackError::HttpError(_) | SlackError::TransportError(_)
        ) || matches!(self, SlackError::ApiError(msg) if msg.contains("ratelimited"))
    }
}

impl From<SlackClientError> for SlackError {
    fn from(error: SlackClientError) -> Self {
        let text = error.to_string();
        if AUTH_ERROR_CODES.iter().any(|code| text.contains(code)) {
            SlackError::AuthError(text)
        } else {
            SlackError::ApiError(text)
        }
    }
}

impl From<reqwest::Error> for SlackError {
    fn from(error: reqwest::Error) -> Self {
        SlackError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for SlackError {
    fn from(error: serde_json::Error) -> Self {
        SlackError::ParseError(error.to_string())
    }
}

impl From<tungstenite::Error> for SlackError {
    fn from(error: tungstenite::Error) -> Self {
        SlackError::TransportError(error.to_string())
    }
}

impl From<anyhow::Error> for SlackError {
    fn from(error: anyhow::Error) -> Self {
        SlackError::GeneralError(error.to_string())
    }
}
