//! Gemini `generateContent` wire format

use crate::api::chat::system_preamble;
use crate::api::{ChatMessage, Role};
use crate::config::ProviderConfig;
use crate::error::{RelayError, Result};
use crate::provider::{parse_json, Completion, OutboundRequest, ProviderId};
use crate::router::Credential;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: u64,
}

/// Build a `generateContent` request. The key travels as a `key` query parameter.
pub fn build_request(
    endpoint: &str,
    config: &ProviderConfig,
    messages: &[ChatMessage],
    system_prompt: &str,
    credential: &Credential,
) -> Result<OutboundRequest> {
    let preamble = system_preamble(messages, system_prompt);
    let mut contents: Vec<Content> = Vec::with_capacity(messages.len());

    for message in messages.iter().filter(|m| m.role != Role::System) {
        let role = match message.role {
            Role::Assistant => "model",
            _ => "user",
        };
        contents.push(Content {
            role,
            parts: vec![Part {
                text: message.content.clone(),
            }],
        });
    }

    // Gemini has no system role here; fold the preamble into the first user turn
    if !preamble.is_empty() {
        match contents.iter_mut().find(|c| c.role == "user") {
            Some(first_user) => {
                let text = &mut first_user.parts[0].text;
                *text = format!("{}\n\n{}", preamble, text);
            }
            None => contents.insert(
                0,
                Content {
                    role: "user",
                    parts: vec![Part { text: preamble }],
                },
            ),
        }
    }

    let generation = &config.generation;
    let body = GenerateContentRequest {
        contents,
        generation_config: GenerationConfig {
            temperature: generation.temperature,
            top_k: generation.top_k,
            top_p: generation.top_p,
            max_output_tokens: generation.max_output_tokens,
        },
    };

    Ok(OutboundRequest {
        url: endpoint.to_string(),
        query: vec![("key", credential.secret().to_string())],
        headers: HeaderMap::new(),
        body: serde_json::to_value(&body)
            .map_err(|e| RelayError::InvalidRequest(format!("unserializable body: {}", e)))?,
    })
}

/// Read `candidates[0].content.parts[0].text` and `usageMetadata.totalTokenCount`
pub fn parse_response(provider: ProviderId, body: &str) -> Result<Completion> {
    let response: GenerateContentResponse = parse_json(provider, body)?;

    let candidates = response
        .candidates
        .ok_or_else(|| RelayError::response(provider, "missing `candidates`"))?;

    let content = candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| {
            RelayError::response(provider, "missing `candidates[0].content.parts[0].text`")
        })?;

    let tokens = response
        .usage_metadata
        .map(|u| u.total_token_count)
        .unwrap_or(0);

    Ok(Completion { content, tokens })
}
