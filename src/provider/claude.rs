//! Anthropic Messages API wire format

use crate::api::chat::system_preamble;
use crate::api::{ChatMessage, Role};
use crate::config::ProviderConfig;
use crate::error::{RelayError, Result};
use crate::provider::{parse_json, Completion, OutboundRequest, ProviderId};
use crate::router::Credential;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

/// Version header sent when the config does not pin one
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Option<Vec<ContentBlock>>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// Build a Messages API request; `system` is carried outside `messages`
pub fn build_request(
    endpoint: &str,
    config: &ProviderConfig,
    messages: &[ChatMessage],
    system_prompt: &str,
    credential: &Credential,
) -> Result<OutboundRequest> {
    let system = system_preamble(messages, system_prompt);

    let body = MessagesRequest {
        model: &config.model,
        max_tokens: config.generation.max_output_tokens,
        system: &system,
        messages: messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
    };

    let version = config.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION);

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-api-key"),
        HeaderValue::from_str(credential.secret())
            .map_err(|e| RelayError::Config(format!("Invalid API key format: {}", e)))?,
    );
    headers.insert(
        HeaderName::from_static("anthropic-version"),
        HeaderValue::from_str(version)
            .map_err(|e| RelayError::Config(format!("Invalid anthropic-version: {}", e)))?,
    );

    Ok(OutboundRequest {
        url: endpoint.to_string(),
        query: Vec::new(),
        headers,
        body: serde_json::to_value(&body)
            .map_err(|e| RelayError::InvalidRequest(format!("unserializable body: {}", e)))?,
    })
}

/// Read `content[0].text`; tokens are input plus output
pub fn parse_response(provider: ProviderId, body: &str) -> Result<Completion> {
    let response: MessagesResponse = parse_json(provider, body)?;

    let content = response
        .content
        .and_then(|blocks| blocks.into_iter().next())
        .and_then(|b| b.text)
        .ok_or_else(|| RelayError::response(provider, "missing `content[0].text`"))?;

    let tokens = response
        .usage
        .map(|u| u.input_tokens.saturating_add(u.output_tokens))
        .unwrap_or(0);

    Ok(Completion { content, tokens })
}
