//! Provider Adapters
//!
//! Translates a generic chat request into each provider's wire format and
//! reads generated text and token usage back out of the reply.

pub mod claude;
pub mod gemini;
pub mod openai;

use crate::api::{CallResult, ChatMessage, Role};
use crate::client::HttpClient;
use crate::config::ProviderConfig;
use crate::error::{RelayError, Result};
use crate::router::Credential;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// The external AI services chatrelay can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    DeepSeek,
    Claude,
    OpenAi,
}

impl ProviderId {
    /// Every known provider, in display order
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Gemini,
        ProviderId::DeepSeek,
        ProviderId::Claude,
        ProviderId::OpenAi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini",
            ProviderId::DeepSeek => "deepseek",
            ProviderId::Claude => "claude",
            ProviderId::OpenAi => "openai",
        }
    }

    /// Wire format spoken by this provider
    pub fn wire_format(&self) -> WireFormat {
        match self {
            ProviderId::Gemini => WireFormat::Gemini,
            ProviderId::DeepSeek | ProviderId::OpenAi => WireFormat::OpenAiChat,
            ProviderId::Claude => WireFormat::Anthropic,
        }
    }

    /// Primary environment variable holding this provider's key
    pub fn default_key_env(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "GEMINI_API_KEY",
            ProviderId::DeepSeek => "DEEPSEEK_API_KEY",
            ProviderId::Claude => "ANTHROPIC_API_KEY",
            ProviderId::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderId::Gemini),
            "deepseek" => Ok(ProviderId::DeepSeek),
            "claude" | "anthropic" => Ok(ProviderId::Claude),
            "openai" => Ok(ProviderId::OpenAi),
            other => Err(RelayError::Config(format!(
                "Unknown provider '{}'. Expected one of: gemini, deepseek, claude, openai",
                other
            ))),
        }
    }
}

/// Request/response schema family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// `contents[].parts[].text`
    Gemini,
    /// OpenAI-style `messages[]`, also used by DeepSeek
    OpenAiChat,
    /// Anthropic Messages API with a separate `system` field
    Anthropic,
}

/// A fully built outbound HTTP request
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// Text and token usage extracted from a provider reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub tokens: u64,
}

/// Adapter for one configured provider
#[derive(Debug, Clone)]
pub struct ProviderAdapter {
    id: ProviderId,
    endpoint: String,
    config: ProviderConfig,
}

impl ProviderAdapter {
    /// Create an adapter, resolving the endpoint (env override included) once
    pub fn new(id: ProviderId, config: ProviderConfig) -> Self {
        Self {
            id,
            endpoint: config.get_endpoint(),
            config,
        }
    }

    pub fn id(&self) -> ProviderId {
        self.id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Build the provider-specific request
    pub fn build_request(
        &self,
        messages: &[ChatMessage],
        system_prompt: &str,
        credential: &Credential,
    ) -> Result<OutboundRequest> {
        if messages.is_empty() {
            return Err(RelayError::InvalidRequest(
                "at least one message is required".to_string(),
            ));
        }
        if messages.iter().all(|m| m.role == Role::System) {
            return Err(RelayError::InvalidRequest(
                "at least one user or assistant message is required".to_string(),
            ));
        }

        match self.id.wire_format() {
            WireFormat::Gemini => gemini::build_request(
                &self.endpoint,
                &self.config,
                messages,
                system_prompt,
                credential,
            ),
            WireFormat::OpenAiChat => openai::build_request(
                &self.endpoint,
                &self.config,
                messages,
                system_prompt,
                credential,
            ),
            WireFormat::Anthropic => claude::build_request(
                &self.endpoint,
                &self.config,
                messages,
                system_prompt,
                credential,
            ),
        }
    }

    /// Parse a successful reply body
    pub fn parse_response(&self, body: &str) -> Result<Completion> {
        match self.id.wire_format() {
            WireFormat::Gemini => gemini::parse_response(self.id, body),
            WireFormat::OpenAiChat => openai::parse_response(self.id, body),
            WireFormat::Anthropic => claude::parse_response(self.id, body),
        }
    }

    /// Send one request to the provider. No retries happen here.
    ///
    /// The returned result has `cost_usd` left at zero; pricing is applied by
    /// the router.
    pub async fn invoke(
        &self,
        http: &HttpClient,
        messages: &[ChatMessage],
        system_prompt: &str,
        credential: &Credential,
    ) -> Result<CallResult> {
        let request = self.build_request(messages, system_prompt, credential)?;

        let started = Instant::now();
        let body = http.send(self.id, &request).await?;
        let elapsed = started.elapsed();

        let completion = self.parse_response(&body)?;

        Ok(CallResult {
            content: completion.content,
            tokens: completion.tokens,
            cost_usd: 0.0,
            provider_used: self.id,
            response_time_ms: elapsed.as_millis() as u64,
            fell_back: false,
        })
    }
}

/// Parse a JSON body, mapping syntax errors to a response error
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    provider: ProviderId,
    body: &str,
) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        RelayError::response(
            provider,
            format!(
                "failed to parse response: {}. Body: {}",
                e,
                truncate(body, 500)
            ),
        )
    })
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_id() {
        assert_eq!("gemini".parse::<ProviderId>().unwrap(), ProviderId::Gemini);
        assert_eq!("DeepSeek".parse::<ProviderId>().unwrap(), ProviderId::DeepSeek);
        assert_eq!(" claude ".parse::<ProviderId>().unwrap(), ProviderId::Claude);
        assert_eq!("anthropic".parse::<ProviderId>().unwrap(), ProviderId::Claude);
        assert_eq!("openai".parse::<ProviderId>().unwrap(), ProviderId::OpenAi);
        assert!("mistral".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_provider_id_serde_names() {
        assert_eq!(
            serde_json::to_string(&ProviderId::OpenAi).unwrap(),
            "\"openai\""
        );
        let id: ProviderId = serde_json::from_str("\"deepseek\"").unwrap();
        assert_eq!(id, ProviderId::DeepSeek);
    }

    #[test]
    fn test_wire_formats() {
        assert_eq!(ProviderId::Gemini.wire_format(), WireFormat::Gemini);
        assert_eq!(ProviderId::DeepSeek.wire_format(), WireFormat::OpenAiChat);
        assert_eq!(ProviderId::OpenAi.wire_format(), WireFormat::OpenAiChat);
        assert_eq!(ProviderId::Claude.wire_format(), WireFormat::Anthropic);
    }

    #[test]
    fn test_empty_messages_rejected() {
        let adapter = ProviderAdapter::new(
            ProviderId::OpenAi,
            ProviderConfig::new("https://api.example.com/v1/chat/completions", "gpt-test"),
        );
        let credential = Credential::new("OPENAI_API_KEY", "sk-test");
        let err = adapter.build_request(&[], "", &credential).unwrap_err();
        assert!(matches!(err, RelayError::InvalidRequest(_)));
    }

    #[test]
    fn test_system_only_messages_rejected() {
        let credential = Credential::new("KEY", "secret");
        let messages = [ChatMessage::system("Be brief."), ChatMessage::system("")];

        for id in ProviderId::ALL {
            let adapter = ProviderAdapter::new(id, ProviderConfig::new("https://api.example.com", "m"));
            let err = adapter.build_request(&messages, "", &credential).unwrap_err();
            assert!(matches!(err, RelayError::InvalidRequest(_)), "{}", id);
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
