//! Slack text rendered by the bot.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::error;

use super::store::ConversationStandup;
use crate::core::gateway::ChatGateway;
use crate::core::models::StatusMessage;
use crate::utils::humanize::relative_time;

pub const DIGEST_HEADER: &str = "¡Ándale! ¡Ándale! here's the standup status :tada:";

#[must_use]
pub fn no_standup_prompt(bot_name: &str) -> String {
    format!(
        "No standup messages found\nType a message starting with *@{bot_name}* to record your standup message"
    )
}

#[must_use]
pub fn status_recorded(user_id: &str) -> String {
    format!("<@{user_id}>: ¡Yeppa! standup status recorded :taco:")
}

/// Placeholder shown when Slack can't tell us who an author is.
#[must_use]
pub fn fallback_user_name(user_id: &str) -> String {
    format!("id{user_id}")
}

#[must_use]
pub fn format_digest_line(user_name: &str, message: &StatusMessage, now: DateTime<Utc>) -> String {
    format!(
        "*{user_name}*: {} _({})_\n",
        message.text,
        relative_time(message.timestamp, now)
    )
}

/// Renders the reply to a status request: the digest, or the how-to prompt
/// when nothing has been recorded for the conversation.
pub async fn render_standup<G>(
    standup: Option<&ConversationStandup>,
    gateway: &G,
    bot_name: &str,
    now: DateTime<Utc>,
) -> String
where
    G: ChatGateway + ?Sized,
{
    match standup {
        Some(standup) if !standup.is_empty() => render_digest(standup, gateway, now).await,
        _ => no_standup_prompt(bot_name),
    }
}

/// Header plus one line per author, newest status first.
pub async fn render_digest<G>(standup: &ConversationStandup, gateway: &G, now: DateTime<Utc>) -> String
where
    G: ChatGateway + ?Sized,
{
    let ordered = standup.by_recency();
    let names = join_all(
        ordered
            .iter()
            .map(|(author, _)| resolve_user_name(gateway, author)),
    )
    .await;

    let mut text = format!("{DIGEST_HEADER}\n");
    for ((_, message), name) in ordered.iter().zip(names) {
        text.push_str(&format_digest_line(&name, message, now));
    }
    text
}

async fn resolve_user_name<G>(gateway: &G, user_id: &str) -> String
where
    G: ChatGateway + ?Sized,
{
    match gateway.user_name(user_id).await {
        Ok(name) => name,
        Err(e) => {
            error!("Couldn't get user information for user {}: {}", user_id, e);
            fallback_user_name(user_id)
        }
    }
}
