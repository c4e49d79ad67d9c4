//! Conversation history trimming.
//!
//! Keeps the newest turns that fit the history budget. A turn is either
//! kept whole or dropped, and the kept turns are always a contiguous
//! suffix of the history.

use crate::context::token;
use cockpit_core::message::Message;

/// Default history budget in tokens.
pub const DEFAULT_HISTORY_BUDGET: usize = 4000;

/// Return the longest suffix of `history` whose estimated tokens fit `budget`.
///
/// Walks newest to oldest and stops at the first turn that would cross the
/// budget. Older turns that might still fit are not considered, so the
/// result stays contiguous.
pub fn trim_history(history: &[Message], budget: usize) -> &[Message] {
    let mut used = 0usize;
    let mut start = history.len();

    for (index, message) in history.iter().enumerate().rev() {
        let tokens = token::estimate_tokens(&message.content);
        if used + tokens > budget {
            break;
        }
        used += tokens;
        start = index;
    }

    if start > 0 {
        tracing::debug!(
            kept = history.len() - start,
            dropped = start,
            used,
            budget,
            "History trimmed"
        );
    }

    &history[start..]
}
