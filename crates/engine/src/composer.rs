//! Request composition: preamble, trimmed history, context and question.

use chrono::{DateTime, Local};
use cockpit_core::message::Message;

/// Preamble used when no template is configured. `{time}` is replaced with
/// the local time of the request.
pub const DEFAULT_SYSTEM_TEMPLATE: &str = "You are a security-conscious AI assistant (Secure Cockpit).
Date/time: {time}
Context: You have access to local files. Use them for precise answers.
Style: technical, direct, no filler. Always put code in backticks with a language tag.";

/// Format used for the `{time}` placeholder.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Render the system preamble for `now`.
pub fn render_preamble(template: &str, now: DateTime<Local>) -> String {
    template.replace("{time}", &now.format(TIME_FORMAT).to_string())
}

/// Content of the final user message.
pub fn final_user_content(context: &str, query: &str) -> String {
    if context.is_empty() {
        query.to_string()
    } else {
        format!("{context}\n\nUser Question: {query}")
    }
}

/// Build the ordered message list handed to the backend.
///
/// Roles in `history` are preserved as recorded.
pub fn compose(preamble: String, history: &[Message], context: &str, query: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(preamble));
    messages.extend(history.iter().cloned());
    messages.push(Message::user(final_user_content(context, query)));
    messages
}
