//! OpenAI-style chat completions, spoken by OpenAI and DeepSeek

use crate::api::chat::system_preamble;
use crate::api::{ChatMessage, Role};
use crate::config::ProviderConfig;
use crate::error::{RelayError, Result};
use crate::provider::{parse_json, Completion, OutboundRequest, ProviderId};
use crate::router::Credential;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<Choice>>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

/// Build a chat completions request with a bearer token
pub fn build_request(
    endpoint: &str,
    config: &ProviderConfig,
    messages: &[ChatMessage],
    system_prompt: &str,
    credential: &Credential,
) -> Result<OutboundRequest> {
    let preamble = system_preamble(messages, system_prompt);

    let mut wire = Vec::with_capacity(messages.len() + 1);
    if !preamble.is_empty() {
        wire.push(WireMessage {
            role: Role::System.as_str(),
            content: &preamble,
        });
    }
    wire.extend(
        messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: &m.content,
            }),
    );

    let body = ChatCompletionRequest {
        model: &config.model,
        messages: wire,
        temperature: config.generation.temperature,
        max_tokens: config.generation.max_output_tokens,
        stream: false,
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", credential.secret()))
            .map_err(|e| RelayError::Config(format!("Invalid API key format: {}", e)))?,
    );

    Ok(OutboundRequest {
        url: endpoint.to_string(),
        query: Vec::new(),
        headers,
        body: serde_json::to_value(&body)
            .map_err(|e| RelayError::InvalidRequest(format!("unserializable body: {}", e)))?,
    })
}

/// Read `choices[0].message.content` and `usage.total_tokens`
pub fn parse_response(provider: ProviderId, body: &str) -> Result<Completion> {
    let response: ChatCompletionResponse = parse_json(provider, body)?;

    let content = response
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| RelayError::response(provider, "missing `choices[0].message.content`"))?;

    let tokens = response.usage.map(|u| u.total_tokens).unwrap_or(0);

    Ok(Completion { content, tokens })
}
