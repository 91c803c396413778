//! Rebuilds a conversation's standup from its message history.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use super::extract::BotIdentity;
use super::store::ConversationStandup;
use crate::core::models::{Conversation, HistoryQuery, MessageRecord, Retention};
use crate::errors::SlackError;
use crate::utils::slack_ts::format_slack_ts;

/// Largest page `conversations.history` will return.
pub const HISTORY_PAGE_SIZE: u16 = 1000;

/// A history scan that failed part way. `partial` holds what was read before the failure.
#[derive(Debug, Error)]
#[error("history of conversation {conversation} is incomplete: {source}")]
pub struct HistoryError {
    pub conversation: String,
    pub partial: ConversationStandup,
    #[source]
    pub source: SlackError,
}

/// Scans the conversation newest to oldest within the retention window and keeps
/// the first (most recent) non-empty status of each author.
///
/// # Errors
///
/// Returns `HistoryError` carrying the statuses collected so far when a page
/// cannot be fetched.
pub async fn retrieve_conversation_standup(
    conversation: &Conversation,
    identity: &BotIdentity,
    retention: Retention,
    now: DateTime<Utc>,
) -> Result<ConversationStandup, HistoryError> {
    let mut query = HistoryQuery {
        oldest: format_slack_ts(retention.cutoff(now)),
        latest: format_slack_ts(now),
        limit: HISTORY_PAGE_SIZE,
        inclusive: true,
    };
    let mut standup = ConversationStandup::new();

    loop {
        let page = match conversation.fetch_history(query.clone()).await {
            Ok(page) => page,
            Err(source) => {
                return Err(HistoryError {
                    conversation: conversation.id.clone(),
                    partial: standup,
                    source,
                });
            }
        };
        debug!(
            "Fetched {} messages of #{} before {} (has_more={})",
            page.messages.len(),
            conversation.name,
            query.latest,
            page.has_more
        );

        fold_page(&mut standup, identity, &page.messages);

        let Some(oldest) = page.messages.last() else {
            break;
        };
        if !page.has_more {
            break;
        }
        // The backend may still hold messages older than this page.
        query.latest = oldest.ts.clone();
        query.inclusive = false;
    }

    Ok(standup)
}

fn fold_page(standup: &mut ConversationStandup, identity: &BotIdentity, messages: &[MessageRecord]) {
    for message in messages {
        if message.user.is_empty() || standup.contains_author(&message.user) {
            continue;
        }
        if let Some(status) = identity.extract(message)
            && !status.is_status_request()
        {
            standup.record_if_absent(&message.user, status);
        }
    }
}
