//! Standup aggregation: extraction, history reconciliation, storage and rendering

pub mod extract;
pub mod format;
pub mod history;
pub mod store;

pub use extract::BotIdentity;
pub use history::{HISTORY_PAGE_SIZE, HistoryError, retrieve_conversation_standup};
pub use store::{ConversationStandup, StandupStore};
