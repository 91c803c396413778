use async_trait::async_trait;

use crate::errors::SlackError;

/// Outbound side of the chat platform: name lookup and message delivery.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the user cannot be resolved.
    async fn user_name(&self, user_id: &str) -> Result<String, SlackError>;

    /// # Errors
    ///
    /// Returns an error when Slack refuses or cannot receive the message.
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), SlackError>;
}
