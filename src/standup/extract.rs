//! Recognises standup messages addressed to the bot.

use std::borrow::Cow;

use regex::Regex;
use tracing::warn;

use crate::core::models::{MessageRecord, StatusMessage};
use crate::errors::SlackError;
use crate::utils::slack_ts::parse_slack_ts;

const MESSAGE_GROUP: &str = "msg";

/// The bot's own user, plus the pattern that finds lines addressed to it.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    id: String,
    name: String,
    pattern: Regex,
}

impl BotIdentity {
    /// # Errors
    ///
    /// Returns `GeneralError` if the mention pattern cannot be compiled.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, SlackError> {
        let id = id.into();
        // Each line starting with `<@BOTID>`, an optional colon, then the status text.
        let source = format!(
            r"(?m)^\s*<@{}>:?\s*(?P<{MESSAGE_GROUP}>.*)$",
            regex::escape(&id)
        );
        let pattern = Regex::new(&source).map_err(|e| {
            SlackError::GeneralError(format!("failed to compile mention pattern: {e}"))
        })?;

        Ok(Self {
            id,
            name: name.into(),
            pattern,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extracts the standup status from a raw message.
    ///
    /// Returns `None` for edits, joins and other subtyped messages, for messages
    /// that never address the bot at the start of a line, and for messages whose
    /// timestamp cannot be parsed. A returned status with empty text is a status
    /// request rather than an update.
    #[must_use]
    pub fn extract(&self, message: &MessageRecord) -> Option<StatusMessage> {
        if message.kind != "message" || !message.subtype.is_empty() {
            return None;
        }

        let replacement = format!("${{{MESSAGE_GROUP}}}");
        let text = match self.pattern.replace_all(&message.text, replacement.as_str()) {
            Cow::Borrowed(_) => return None,
            Cow::Owned(text) => text,
        };

        match parse_slack_ts(&message.ts) {
            Ok(timestamp) => Some(StatusMessage::new(timestamp, text)),
            Err(e) => {
                warn!("Can't parse timestamp of message from {}: {}", message.user, e);
                None
            }
        }
    }
}
