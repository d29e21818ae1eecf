//! Chat API Types
//!
//! Provider-neutral messages and the result of a routed call.

use crate::provider::ProviderId;
use serde::{Deserialize, Serialize};

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A message in a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "user", "assistant" or "system"
    pub role: Role,

    /// Plain text content
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Outcome of one routed call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    /// Generated text
    pub content: String,

    /// Tokens reported by the provider (0 when it reports none)
    pub tokens: u64,

    /// Approximate cost in USD, for bookkeeping only
    pub cost_usd: f64,

    /// Provider that actually produced the content
    pub provider_used: ProviderId,

    /// Duration of the HTTP exchange
    pub response_time_ms: u64,

    /// True when the content came from the fallback provider or the offline reply
    #[serde(default)]
    pub fell_back: bool,
}

/// Join the system prompt with any `system` role messages into one preamble
pub(crate) fn system_preamble(messages: &[ChatMessage], system_prompt: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !system_prompt.trim().is_empty() {
        parts.push(system_prompt);
    }
    parts.extend(
        messages
            .iter()
            .filter(|m| m.role == Role::System && !m.content.trim().is_empty())
            .map(|m| m.content.as_str()),
    );
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_deserialization() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role": "assistant", "content": "Hello!"}"#).unwrap();
        assert_eq!(msg, ChatMessage::assistant("Hello!"));
        assert!(serde_json::from_str::<ChatMessage>(r#"{"role": "tool", "content": ""}"#).is_err());
    }

    #[test]
    fn test_call_result_uses_camel_case() {
        let result = CallResult {
            content: "hi".to_string(),
            tokens: 12,
            cost_usd: 0.5,
            provider_used: ProviderId::Claude,
            response_time_ms: 40,
            fell_back: false,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["costUsd"], 0.5);
        assert_eq!(json["providerUsed"], "claude");
        assert_eq!(json["responseTimeMs"], 40);
    }

    #[test]
    fn test_system_preamble() {
        let messages = vec![
            ChatMessage::system("Be brief."),
            ChatMessage::user("hi"),
            ChatMessage::system("   "),
        ];
        assert_eq!(
            system_preamble(&messages, "You are an interviewer."),
            "You are an interviewer.\n\nBe brief."
        );
        assert_eq!(system_preamble(&[ChatMessage::user("hi")], ""), "");
    }
}
