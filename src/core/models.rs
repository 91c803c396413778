use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::SlackError;

/// A standup status addressed to the bot.
///
/// Empty `text` marks a status request (the bot was mentioned with nothing else).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

impl StatusMessage {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn is_status_request(&self) -> bool {
        self.text.is_empty()
    }
}

/// How far back standup messages stay relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    days: u32,
}

impl Retention {
    #[must_use]
    pub fn days(days: u32) -> Self {
        Self { days }
    }

    #[must_use]
    pub fn as_days(&self) -> u32 {
        self.days
    }

    #[must_use]
    pub fn window(&self) -> TimeDelta {
        TimeDelta::try_days(i64::from(self.days)).unwrap_or(TimeDelta::MAX)
    }

    /// Oldest instant still inside the window.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Raw Slack message as it appears in `conversations.history` pages and RTM frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subtype: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ts: String,
}

impl MessageRecord {
    /// Convenience constructor for a plain user message.
    #[must_use]
    pub fn user_message(user: &str, text: &str, ts: &str) -> Self {
        Self {
            kind: "message".to_string(),
            subtype: String::new(),
            user: user.to_string(),
            text: text.to_string(),
            ts: ts.to_string(),
        }
    }
}

/// Bounds for one `conversations.history` page. Bounds are Slack timestamp strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub oldest: String,
    pub latest: String,
    pub limit: u16,
    pub inclusive: bool,
}

/// One page of history, newest message first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPage {
    pub messages: Vec<MessageRecord>,
    pub has_more: bool,
}

pub type HistoryFuture = BoxFuture<'static, Result<HistoryPage, SlackError>>;
pub type HistoryFetcher = Arc<dyn Fn(HistoryQuery) -> HistoryFuture + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationKind {
    PublicChannel,
    PrivateGroup,
}

/// A joined conversation together with the call that reads its history.
#[derive(Clone)]
pub struct Conversation {
    pub id: String,
    pub name: String,
    pub kind: ConversationKind,
    history: HistoryFetcher,
}

impl Conversation {
    pub fn new<F, Fut>(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: ConversationKind,
        fetch: F,
    ) -> Self
    where
        F: Fn(HistoryQuery) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HistoryPage, SlackError>> + Send + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            history: Arc::new(move |query| fetch(query).boxed()),
        }
    }

    /// # Errors
    ///
    /// Propagates whatever the bound history call fails with.
    pub async fn fetch_history(&self, query: HistoryQuery) -> Result<HistoryPage, SlackError> {
        (self.history)(query).await
    }
}

impl fmt::Debug for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversation")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Who the bot is, as reported by the connection handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfIdentity {
    pub id: String,
    pub name: String,
    pub team_id: String,
    pub team_name: String,
}

/// Everything the connection manager hands to the dispatcher.
#[derive(Debug)]
pub enum BotEvent {
    Connected {
        identity: SelfIdentity,
        conversations: Vec<Conversation>,
    },
    Message {
        channel: String,
        message: MessageRecord,
    },
    TransportError(String),
    InvalidAuth(String),
}
