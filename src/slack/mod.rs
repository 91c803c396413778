//! All Slack-specific functionality

pub mod bot;
pub mod client;
pub mod rtm;

// Re-export main types for convenience
pub use bot::{ConversationClass, StandupBot};
pub use client::{ConversationSummary, RtmSession, SlackClient};
pub use rtm::{ConnectionManager, EVENT_QUEUE_CAPACITY, spawn_connection_manager};
