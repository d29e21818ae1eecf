//! Canned reply shown when no provider could answer.

use crate::api::{ChatMessage, Role};
use crate::provider::ProviderId;

const ECHO_LIMIT: usize = 80;

/// Demo-mode text naming the provider and echoing the last user message
pub fn offline_reply(provider: ProviderId, messages: &[ChatMessage]) -> String {
    let last_user = messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.trim())
        .filter(|c| !c.is_empty());

    match last_user {
        Some(text) => format!(
            "I'm running in demo mode because {} is unavailable right now. \
             You asked: \"{}\". Please try again in a moment, or check that an API key is configured.",
            provider,
            clip(text)
        ),
        None => format!(
            "I'm running in demo mode because {} is unavailable right now. \
             Please try again in a moment, or check that an API key is configured.",
            provider
        ),
    }
}

fn clip(text: &str) -> String {
    if text.chars().count() <= ECHO_LIMIT {
        text.to_string()
    } else {
        let head: String = text.chars().take(ECHO_LIMIT).collect();
        format!("{}...", head)
    }
}
