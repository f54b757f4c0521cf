//! Grouping of messages for display
//!
//! A conversation is shown as a sequence of bursts: runs of consecutive
//! messages from the same sender. There is no time-gap threshold; a burst
//! only ends when the sender changes.

use crate::types::Message;

/// A non-empty run of consecutive messages from one sender.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MessageBurst<'a> {
    messages: &'a [Message],
}

impl<'a> MessageBurst<'a> {
    /// Sender shared by every message in the burst.
    pub fn sender(&self) -> &'a str {
        &self.messages[0].sender_name
    }

    pub fn messages(&self) -> &'a [Message] {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether the burst was sent by `owner`.
    pub fn is_from(&self, owner: &str) -> bool {
        self.sender() == owner
    }

    /// Time of the first message in the burst.
    pub fn started_at(&self) -> i64 {
        self.messages[0].timestamp_ms
    }
}

/// Split `messages` into sender bursts, in order.
///
/// Concatenating the returned bursts yields `messages` exactly.
pub fn group(messages: &[Message]) -> Vec<MessageBurst<'_>> {
    let mut bursts = Vec::new();
    let mut start = 0;

    for i in 1..messages.len() {
        if messages[i].sender_name != messages[start].sender_name {
            bursts.push(MessageBurst {
                messages: &messages[start..i],
            });
            start = i;
        }
    }
    if start < messages.len() {
        bursts.push(MessageBurst {
            messages: &messages[start..],
        });
    }

    bursts
}

/// Everyone who left the same reaction on a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionGroup<'a> {
    pub reaction: &'a str,
    pub actors: Vec<&'a str>,
}

impl ReactionGroup<'_> {
    pub fn count(&self) -> usize {
        self.actors.len()
    }
}

/// Group a message's reactions by emoji, in first-seen order.
pub fn group_reactions(message: &Message) -> Vec<ReactionGroup<'_>> {
    let mut groups: Vec<ReactionGroup<'_>> = Vec::new();
    for reaction in &message.reactions {
        // Reaction lists are a handful of entries; a linear scan is fine
        match groups.iter_mut().find(|g| g.reaction == reaction.reaction) {
            Some(group) => group.actors.push(&reaction.actor),
            None => groups.push(ReactionGroup {
                reaction: &reaction.reaction,
                actors: vec![&reaction.actor],
            }),
        }
    }
    groups
}
