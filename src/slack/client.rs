//! Slack API client module
//!
//! Encapsulates all Slack API interactions with retry logic and error handling.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::prelude::{SlackApiChatPostMessageRequest, SlackApiUsersInfoRequest};
use slack_morphism::{
    SlackApiToken, SlackApiTokenValue, SlackChannelId, SlackMessageContent, SlackUserId,
};
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use crate::core::config::DEFAULT_API_BASE;
use crate::core::gateway::ChatGateway;
use crate::core::models::{
    Conversation, ConversationKind, HistoryPage, HistoryQuery, MessageRecord, SelfIdentity,
};
use crate::errors::SlackError;

// Build the Slack client connector safely without panicking.
// If connector construction fails, store None and surface a SlackError at call sites.
static SLACK_CLIENT: std::sync::LazyLock<Option<SlackHyperClient>> =
    std::sync::LazyLock::new(|| match SlackClientHyperConnector::new() {
        Ok(connector) => Some(SlackHyperClient::new(connector)),
        Err(e) => {
            warn!("Failed to create Slack HTTP connector: {}", e);
            None
        }
    });

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// Page size used when listing the bot's conversations.
const CONVERSATION_LIST_LIMIT: u16 = 200;

/// Result of `rtm.connect`: where to open the socket and who we are.
#[derive(Debug, Clone)]
pub struct RtmSession {
    pub url: String,
    pub identity: SelfIdentity,
}

/// A public channel or private group the bot belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: String,
    pub name: String,
    pub kind: ConversationKind,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RtmConnectResponse {
    url: String,
    #[serde(rename = "self")]
    bot: NamedRef,
    team: NamedRef,
}

#[derive(Debug, Deserialize)]
struct ConversationEntry {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_private: bool,
    #[serde(default)]
    is_group: bool,
    #[serde(default)]
    is_member: bool,
    #[serde(default)]
    is_archived: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct ConversationsListResponse {
    #[serde(default)]
    channels: Vec<ConversationEntry>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<MessageRecord>,
    #[serde(default)]
    has_more: bool,
}

/// Slack API client with retry logic and error handling
#[derive(Clone)]
pub struct SlackClient {
    token: SlackApiToken,
    api_base: String,
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl SlackClient {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Points the JSON endpoints (`rtm.connect`, `conversations.*`) at another base URL.
    #[must_use]
    pub fn with_api_base(token: String, api_base: &str) -> Self {
        Self {
            token: SlackApiToken::new(SlackApiTokenValue::new(token)),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, SlackError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, SlackError>> + Send,
        T: Send,
    {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(5);

        RetryIf::start(strategy, operation, |e: &SlackError| e.is_retryable()).await
    }

    fn session_client() -> Result<&'static SlackHyperClient, SlackError> {
        SLACK_CLIENT.as_ref().ok_or_else(|| {
            SlackError::GeneralError("Slack HTTP connector not initialized".to_string())
        })
    }

    /// GET a Web API method and decode its JSON body once `ok` is confirmed.
    async fn api_get<T>(&self, method: &str, params: &[(&str, String)]) -> Result<T, SlackError>
    where
        T: DeserializeOwned + Send,
    {
        self.with_retry(|| async move {
            let resp = HTTP_CLIENT
                .get(format!("{}/{method}", self.api_base))
                .bearer_auth(&self.token.token_value.0)
                .query(params)
                .send()
                .await?;

            let status = resp.status();
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(SlackError::HttpError(format!("{method} HTTP {status}")));
            }
            if !status.is_success() {
                return Err(SlackError::ApiError(format!("{method} HTTP {status}")));
            }

            let body: Value = resp.json().await?;
            if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
                return Err(SlackError::from_api_code(
                    method,
                    body.get("error")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown"),
                ));
            }

            Ok(serde_json::from_value(body)?)
        })
        .await
    }

    /// Starts an RTM session and returns its websocket URL and the bot identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` for rejected tokens and other `SlackError`s for transport failures.
    pub async fn rtm_connect(&self) -> Result<RtmSession, SlackError> {
        let resp: RtmConnectResponse = self.api_get("rtm.connect", &[]).await?;
        Ok(RtmSession {
            url: resp.url,
            identity: SelfIdentity {
                id: resp.bot.id,
                name: resp.bot.name,
                team_id: resp.team.id,
                team_name: resp.team.name,
            },
        })
    }

    /// Lists the non-archived public channels and private groups the bot is a member of.
    ///
    /// # Errors
    ///
    /// Returns an error if any page of `conversations.list` fails.
    pub async fn list_member_conversations(&self) -> Result<Vec<ConversationSummary>, SlackError> {
        let mut conversations = Vec::new();
        let mut cursor = String::new();

        loop {
            let mut params = vec![
                ("types", "public_channel,private_channel".to_string()),
                ("exclude_archived", "true".to_string()),
                ("limit", CONVERSATION_LIST_LIMIT.to_string()),
            ];
            if !cursor.is_empty() {
                params.push(("cursor", cursor.clone()));
            }

            let page: ConversationsListResponse =
                self.api_get("conversations.list", &params).await?;

            conversations.extend(
                page.channels
                    .into_iter()
                    .filter(|c| c.is_member && !c.is_archived)
                    .map(|c| ConversationSummary {
                        kind: if c.is_private || c.is_group {
                            ConversationKind::PrivateGroup
                        } else {
                            ConversationKind::PublicChannel
                        },
                        id: c.id,
                        name: c.name,
                    }),
            );

            cursor = page
                .response_metadata
                .map(|m| m.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                break;
            }
        }

        debug!("Bot is a member of {} conversations", conversations.len());
        Ok(conversations)
    }

    /// # Errors
    ///
    /// Returns an error if the history page cannot be fetched or decoded.
    pub async fn conversation_history(
        &self,
        channel_id: &str,
        query: &HistoryQuery,
    ) -> Result<HistoryPage, SlackError> {
        let params = [
            ("channel", channel_id.to_string()),
            ("oldest", query.oldest.clone()),
            ("latest", query.latest.clone()),
            ("limit", query.limit.to_string()),
            ("inclusive", query.inclusive.to_string()),
        ];
        let resp: HistoryResponse = self.api_get("conversations.history", &params).await?;

        Ok(HistoryPage {
            messages: resp.messages,
            has_more: resp.has_more,
        })
    }

    /// Binds a conversation to this client's history call.
    ///
    /// Public channels and private groups share `conversations.history`; the kind is
    /// carried along for logging.
    #[must_use]
    pub fn conversation(&self, summary: ConversationSummary) -> Conversation {
        let client = self.clone();
        let channel_id = summary.id.clone();
        Conversation::new(summary.id, summary.name, summary.kind, move |query| {
            let client = client.clone();
            let channel_id = channel_id.clone();
            async move { client.conversation_history(&channel_id, &query).await }
        })
    }

    /// Resolves a user's display name, falling back to the real name.
    ///
    /// # Errors
    ///
    /// Returns an error if `users.info` fails.
    pub async fn get_user_name(&self, user_id: &str) -> Result<String, SlackError> {
        self.with_retry(|| async move {
            let session = Self::session_client()?.open_session(&self.token);
            let user_info_req = SlackApiUsersInfoRequest::new(SlackUserId(user_id.to_string()));

            let info = session.users_info(&user_info_req).await?;
            let profile = info.user.profile.as_ref();
            let name = profile
                .and_then(|p| p.display_name.clone())
                .filter(|n| !n.trim().is_empty())
                .or_else(|| profile.and_then(|p| p.real_name.clone()))
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| user_id.to_string());

            Ok(name)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns an error if `chat.postMessage` fails after retries.
    pub async fn post_message(&self, channel_id: &str, message: &str) -> Result<(), SlackError> {
        self.with_retry(|| async move {
            let session = Self::session_client()?.open_session(&self.token);

            let post_req = SlackApiChatPostMessageRequest::new(
                SlackChannelId(channel_id.to_string()),
                SlackMessageContent::new().with_text(message.to_string()),
            );

            session.chat_post_message(&post_req).await?;

            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ChatGateway for SlackClient {
    async fn user_name(&self, user_id: &str) -> Result<String, SlackError> {
        self.get_user_name(user_id).await
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), SlackError> {
        self.post_message(channel_id, text).await
    }
}
