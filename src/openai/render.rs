//! Message renderer: thread messages → `"{role}: {text}"` lines.

use crate::openai::api::ThreadMessage;

/// `$` is a math delimiter for markdown renderers; emit it literally.
pub fn escape_markup(text: &str) -> String {
    text.replace('$', "\\$")
}

pub fn render_message(message: &ThreadMessage) -> String {
    format!("{}: {}", message.role, escape_markup(&message.text))
}

/// Oldest first. Messages sharing a timestamp keep the order they were listed in.
pub fn render_messages(mut messages: Vec<ThreadMessage>) -> Vec<String> {
    messages.sort_by_key(|m| m.created_at);
    messages.iter().map(render_message).collect()
}
