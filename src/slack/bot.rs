use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::gateway::ChatGateway;
use crate::core::models::{BotEvent, Conversation, MessageRecord, Retention, SelfIdentity};
use crate::errors::SlackError;
use crate::standup::format::{render_standup, status_recorded};
use crate::standup::{BotIdentity, StandupStore, retrieve_conversation_standup};

/// Kind of conversation, judged by the first character of its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationClass {
    /// Public channels (`C…`) and private groups (`G…`).
    Channel,
    /// Direct messages (`D…`).
    DirectMessage,
    Unsupported,
}

impl ConversationClass {
    #[must_use]
    pub fn of(conversation_id: &str) -> Self {
        match conversation_id.chars().next() {
            Some('C' | 'G') => ConversationClass::Channel,
            Some('D') => ConversationClass::DirectMessage,
            _ => ConversationClass::Unsupported,
        }
    }
}

#[derive(Debug)]
enum BotState {
    Uninitialized,
    Ready(BotIdentity),
    Terminated,
}

/// Routes connection and message events to the standup store.
///
/// Owns all standup state; events are handled one at a time.
pub struct StandupBot<G> {
    gateway: G,
    retention: Retention,
    state: BotState,
    standups: StandupStore,
}

impl<G: ChatGateway> StandupBot<G> {
    #[must_use]
    pub fn new(gateway: G, retention: Retention) -> Self {
        Self {
            gateway,
            retention,
            state: BotState::Uninitialized,
            standups: StandupStore::new(),
        }
    }

    #[must_use]
    pub fn identity(&self) -> Option<&BotIdentity> {
        match &self.state {
            BotState::Ready(identity) => Some(identity),
            _ => None,
        }
    }

    #[must_use]
    pub fn standups(&self) -> &StandupStore {
        &self.standups
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        matches!(self.state, BotState::Terminated)
    }

    /// Consumes events until the queue closes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` as soon as the connection reports rejected credentials.
    pub async fn run(mut self, mut events: mpsc::Receiver<BotEvent>) -> Result<(), SlackError> {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await?;
        }
        info!("Event queue closed, standup bot stopping");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AuthError` for `InvalidAuth` events; everything else is handled in place.
    pub async fn handle_event(&mut self, event: BotEvent) -> Result<(), SlackError> {
        if self.is_terminated() {
            warn!("Dropping event received after termination");
            return Ok(());
        }

        match event {
            BotEvent::Connected {
                identity,
                conversations,
            } => self.handle_connected(identity, &conversations).await?,
            BotEvent::Message { channel, message } => {
                self.handle_message(&channel, &message).await;
            }
            BotEvent::TransportError(reason) => error!("Slack connection error: {}", reason),
            BotEvent::InvalidAuth(reason) => {
                error!("Invalid credentials: {}", reason);
                self.state = BotState::Terminated;
                return Err(SlackError::AuthError(reason));
            }
        }
        Ok(())
    }

    async fn handle_connected(
        &mut self,
        identity: SelfIdentity,
        conversations: &[Conversation],
    ) -> Result<(), SlackError> {
        if !matches!(self.state, BotState::Uninitialized) {
            warn!("Received unexpected Connected event");
            return Ok(());
        }
        info!(
            "Connected as user {} ({}) to team {} ({})",
            identity.name, identity.id, identity.team_name, identity.team_id
        );

        let bot = BotIdentity::new(identity.id, identity.name)?;
        self.retrieve_standups(&bot, conversations).await;
        self.state = BotState::Ready(bot);
        Ok(())
    }

    /// Backfills every conversation in turn, keeping partial results of failed scans.
    async fn retrieve_standups(&mut self, identity: &BotIdentity, conversations: &[Conversation]) {
        for conversation in conversations {
            info!(
                "Retrieving standup for channel #{} ({}, {:?})",
                conversation.name, conversation.id, conversation.kind
            );
            let standup = match retrieve_conversation_standup(
                conversation,
                identity,
                self.retention,
                Utc::now(),
            )
            .await
            {
                Ok(standup) => standup,
                Err(e) => {
                    error!(
                        "Can't retrieve channel standup for channel #{}: {}",
                        conversation.name, e
                    );
                    e.partial
                }
            };
            info!(
                "Standup for channel #{} ({}) updated with {} statuses",
                conversation.name,
                conversation.id,
                standup.len()
            );
            debug!("Standup for {}: {:?}", conversation.id, standup);
            self.standups.backfill(&conversation.id, standup);
        }
    }

    async fn handle_message(&mut self, channel: &str, message: &MessageRecord) {
        debug!("Message received in {}: {:?}", channel, message);
        let BotState::Ready(identity) = &self.state else {
            warn!("Received message event before finishing initialization");
            return;
        };
        if channel.is_empty() {
            warn!("Received message with empty channel");
            return;
        }

        match ConversationClass::of(channel) {
            ConversationClass::Channel => {}
            ConversationClass::DirectMessage => {
                debug!("Ignoring direct message in {}", channel);
                return;
            }
            ConversationClass::Unsupported => return,
        }

        let Some(status) = identity.extract(message) else {
            return;
        };
        info!(
            "Received standup message in channel {} from {}: {:?}",
            channel, message.user, status.text
        );

        let now = Utc::now();
        let pruned = self.standups.prune_expired(channel, self.retention, now);
        if pruned > 0 {
            debug!("Pruned {} expired statuses in {}", pruned, channel);
        }

        if status.is_status_request() {
            let reply = render_standup(
                self.standups.snapshot(channel),
                &self.gateway,
                identity.name(),
                now,
            )
            .await;
            self.send(channel, &reply).await;
        } else if message.user.is_empty() {
            warn!("Dropping standup update without an author in {}", channel);
        } else {
            self.standups.upsert(channel, &message.user, status);
            self.send(channel, &status_recorded(&message.user)).await;
        }
    }

    async fn send(&self, channel: &str, text: &str) {
        if let Err(e) = self.gateway.send_message(channel, text).await {
            error!("Failed to send message to {}: {}", channel, e);
        }
    }
}
