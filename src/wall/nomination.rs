//! Deciding when a reacted message enters the wall.

use crate::wall::emoji::same_emoji;
use crate::wall::model::{ServerConfig, WallAuthor, WallItem};

/// One reaction type on a message and how many users added it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionTally {
    pub emoji: String,
    pub count: u64,
}

impl ReactionTally {
    pub fn new(emoji: impl Into<String>, count: u64) -> Self {
        Self {
            emoji: emoji.into(),
            count,
        }
    }
}

/// A reacted message, as seen when a reaction is added.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub content: String,
    pub author: WallAuthor,
    /// Creation time, epoch milliseconds.
    pub created_ms: i64,
    pub reactions: Vec<ReactionTally>,
}

/// Number of reaction types on the message that sit exactly at the threshold
/// with the server's nomination emoji.
///
/// A count that jumps past the threshold never matches.
pub fn nominations(config: &ServerConfig, reactions: &[ReactionTally]) -> usize {
    reactions
        .iter()
        .filter(|r| {
            r.count == u64::from(config.react_threshold)
                && same_emoji(&r.emoji, &config.react_emoji)
        })
        .count()
}

/// Build the wall entry for a nominated message.
pub fn wall_item(candidate: &Candidate, server_name: &str) -> WallItem {
    WallItem {
        message: candidate.content.clone(),
        author: candidate.author.clone(),
        timestamp: candidate.created_ms,
        upvotes: 0,
        downvotes: 0,
        server_name: server_name.to_string(),
    }
}
