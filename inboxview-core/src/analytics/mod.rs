//! Analytics for inboxview
//!
//! Aggregate statistics derived from a merged [`crate::types::Conversation`]:
//! message counts per sender, first and last activity, and a ranked view of
//! who talks most. Everything here is recomputed on demand from the
//! conversation; nothing is stored.

pub mod statistics;

pub use statistics::{ConversationStatistics, SenderShare};

use crate::types::Conversation;

/// Compute statistics for a conversation.
pub fn compute(conversation: &Conversation) -> ConversationStatistics {
    ConversationStatistics::compute(conversation)
}
