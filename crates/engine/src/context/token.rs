//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~3.5 characters per token. This is
//! deliberately conservative and backend-independent; no tokenizer is
//! consulted. All budgets in the engine are compared against these numbers.

use cockpit_core::message::Message;

/// Characters per token, expressed as the ratio 7/2 so the estimate stays
/// in integer arithmetic.
const CHARS_PER_TOKEN_NUM: usize = 7;
const CHARS_PER_TOKEN_DEN: usize = 2;

/// Estimate the token count for a string.
///
/// Heuristic: character count / 3.5, rounded down.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() * CHARS_PER_TOKEN_DEN / CHARS_PER_TOKEN_NUM
}

/// Estimate tokens for a slice of messages (content only, no overhead).
pub fn estimate_messages_tokens(messages: &[Message]) -> usize {
    messages.iter().map(|m| estimate_tokens(&m.content)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn three_chars_rounds_down_to_zero() {
        assert_eq!(estimate_tokens("abc"), 0);
    }

    #[test]
    fn seven_chars_is_two_tokens() {
        assert_eq!(estimate_tokens("abcdefg"), 2);
    }

    #[test]
    fn thousand_chars() {
        // 1000 / 3.5 = 285.71…
        assert_eq!(estimate_tokens(&"a".repeat(1000)), 285);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 7 two-byte characters
        assert_eq!(estimate_tokens("ääääääá"), 2);
    }

    #[test]
    fn multiple_messages() {
        let msgs = vec![
            Message::user("a".repeat(35)),      // 10
            Message::assistant("b".repeat(70)), // 20
        ];
        assert_eq!(estimate_messages_tokens(&msgs), 30);
    }
}
