//! In-memory standup state, one map of latest statuses per conversation.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::{DateTime, Utc};

use crate::core::models::{Retention, StatusMessage};

/// Latest status of each author in one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationStandup {
    entries: HashMap<String, StatusMessage>,
}

impl ConversationStandup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, author_id: &str) -> Option<&StatusMessage> {
        self.entries.get(author_id)
    }

    #[must_use]
    pub fn contains_author(&self, author_id: &str) -> bool {
        self.entries.contains_key(author_id)
    }

    /// Records `message` unless the author already has an entry.
    /// Returns whether it was recorded.
    pub fn record_if_absent(&mut self, author_id: &str, message: StatusMessage) -> bool {
        match self.entries.entry(author_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(message);
                true
            }
        }
    }

    /// Overwrites the author's entry regardless of timestamps.
    pub fn upsert(&mut self, author_id: &str, message: StatusMessage) {
        self.entries.insert(author_id.to_string(), message);
    }

    /// Drops every entry strictly older than `cutoff`, returning how many went.
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, message| message.timestamp >= cutoff);
        before - self.entries.len()
    }

    /// Entries newest first; equal timestamps fall back to author id order.
    #[must_use]
    pub fn by_recency(&self) -> Vec<(&str, &StatusMessage)> {
        let mut ordered: Vec<(&str, &StatusMessage)> = self
            .entries
            .iter()
            .map(|(author, message)| (author.as_str(), message))
            .collect();
        ordered.sort_by(|(a_author, a), (b_author, b)| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a_author.cmp(b_author))
        });
        ordered
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatusMessage)> {
        self.entries
            .iter()
            .map(|(author, message)| (author.as_str(), message))
    }
}

impl FromIterator<(String, StatusMessage)> for ConversationStandup {
    fn from_iter<I: IntoIterator<Item = (String, StatusMessage)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Standups of every conversation the bot knows about.
#[derive(Debug, Default)]
pub struct StandupStore {
    conversations: HashMap<String, ConversationStandup>,
}

impl StandupStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was known about the conversation.
    pub fn backfill(&mut self, conversation_id: &str, standup: ConversationStandup) {
        self.conversations
            .insert(conversation_id.to_string(), standup);
    }

    pub fn upsert(&mut self, conversation_id: &str, author_id: &str, message: StatusMessage) {
        self.conversations
            .entry(conversation_id.to_string())
            .or_default()
            .upsert(author_id, message);
    }

    /// Removes entries older than the retention window. Returns how many went.
    pub fn prune_expired(
        &mut self,
        conversation_id: &str,
        retention: Retention,
        now: DateTime<Utc>,
    ) -> usize {
        let cutoff = retention.cutoff(now);
        self.conversations
            .get_mut(conversation_id)
            .map_or(0, |standup| standup.prune_older_than(cutoff))
    }

    #[must_use]
    pub fn snapshot(&self, conversation_id: &str) -> Option<&ConversationStandup> {
        self.conversations.get(conversation_id)
    }

    #[must_use]
    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}
