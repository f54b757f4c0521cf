//! Per-conversation message statistics.

use crate::types::Conversation;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregate counts for one conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationStatistics {
    /// Earliest message timestamp (ms), `None` for an empty conversation
    pub created_at: Option<i64>,
    /// Latest message timestamp (ms), 0 for an empty conversation
    pub last_sent: i64,
    /// Messages per sender, keyed by repaired sender name
    pub count_info: BTreeMap<String, usize>,
    pub total_count: usize,
    /// Number of listed participants, including ones who never wrote
    pub participant_count: usize,
}

/// One sender's share of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderShare {
    pub name: String,
    pub count: usize,
    /// Share of all messages, 0.0 to 100.0
    pub percent: f64,
}

impl ConversationStatistics {
    /// Compute statistics for a merged conversation.
    ///
    /// Every message counts once for its sender, whatever its kind.
    pub fn compute(conversation: &Conversation) -> Self {
        let mut count_info: BTreeMap<String, usize> = BTreeMap::new();
        for message in &conversation.messages {
            *count_info.entry(message.sender_name.clone()).or_insert(0) += 1;
        }

        let timestamps = conversation.messages.iter().map(|m| m.timestamp_ms);

        Self {
            created_at: timestamps.clone().min(),
            last_sent: timestamps.max().unwrap_or(0),
            count_info,
            total_count: conversation.messages.len(),
            participant_count: conversation.participants.len(),
        }
    }

    /// Senders ordered by message count, most active first.
    ///
    /// Ties are broken by name so the order is stable across runs.
    pub fn ranked(&self) -> Vec<SenderShare> {
        let mut shares: Vec<SenderShare> = self
            .count_info
            .iter()
            .map(|(name, &count)| SenderShare {
                name: name.clone(),
                count,
                percent: if self.total_count == 0 {
                    0.0
                } else {
                    count as f64 * 100.0 / self.total_count as f64
                },
            })
            .collect();

        shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        shares
    }

    /// `created_at` as a UTC timestamp.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    /// Time between the first and last message.
    pub fn span(&self) -> Option<chrono::Duration> {
        self.created_at
            .map(|first| chrono::Duration::milliseconds(self.last_sent - first))
    }
}
