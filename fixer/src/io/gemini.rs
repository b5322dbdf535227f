//! Gemini `generateContent` adapter for the [`Model`] trait.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::core::conversation::{Part, Role, ToolCall, Turn};
use crate::io::config::ModelConfig;
use crate::io::model::{Model, ModelRequest, ModelTurn, Usage};
use crate::tools::schema::ToolDeclaration;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    tools: Vec<ToolGroup>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ContentPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolGroup {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// Blocking client for the Gemini REST API.
pub struct GeminiModel {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    max_output_tokens: u32,
}

impl GeminiModel {
    pub fn new(config: &ModelConfig, api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("build http client")?;
        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.api_base_url.trim_end_matches('/'),
            config.name
        );
        Ok(Self {
            client,
            endpoint,
            api_key,
            max_output_tokens: config.max_output_tokens,
        })
    }
}

impl Model for GeminiModel {
    #[instrument(skip_all, fields(turns = request.conversation.len()))]
    fn generate(&self, request: &ModelRequest<'_>) -> Result<ModelTurn> {
        let body = build_request(request, self.max_output_tokens);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .context("send generateContent request")?;
        let status = response.status();
        let text = response.text().context("read generateContent response")?;

        if !status.is_success() {
            warn!(%status, "model request failed");
            if let Ok(err_resp) = serde_json::from_str::<ErrorResponse>(&text) {
                return Err(anyhow!("API error {}: {}", status, err_resp.error.message));
            }
            return Err(anyhow!("API error {}: {}", status, text));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse response: {}\n{}", e, text))?;
        let turn = into_model_turn(parsed);
        debug!(
            calls = turn.tool_calls.len(),
            text_parts = turn.text.len(),
            "model responded"
        );
        Ok(turn)
    }
}

fn build_request(request: &ModelRequest<'_>, max_output_tokens: u32) -> GenerateRequest {
    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: vec![ContentPart {
                text: Some(request.system.to_string()),
                ..ContentPart::default()
            }],
        },
        contents: to_contents(request.conversation.turns()),
        tools: vec![ToolGroup {
            function_declarations: request.tools.iter().map(to_declaration).collect(),
        }],
        generation_config: GenerationConfig { max_output_tokens },
    }
}

/// Consecutive tool turns answer the calls of one model turn, so their
/// `functionResponse` parts travel together in a single content.
fn to_contents(turns: &[Turn]) -> Vec<Content> {
    let mut contents: Vec<Content> = Vec::with_capacity(turns.len());
    let mut previous_role = None;
    for turn in turns {
        let content = to_content(turn);
        match contents.last_mut() {
            Some(last) if turn.role == Role::Tool && previous_role == Some(Role::Tool) => {
                last.parts.extend(content.parts);
            }
            _ => contents.push(content),
        }
        previous_role = Some(turn.role);
    }
    contents
}

fn to_content(turn: &Turn) -> Content {
    let role = match turn.role {
        Role::User | Role::Tool => "user",
        Role::Model => "model",
    };
    let parts = turn
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => ContentPart {
                text: Some(text.clone()),
                ..ContentPart::default()
            },
            Part::ToolCall(call) => ContentPart {
                function_call: Some(FunctionCall {
                    name: call.name.clone(),
                    args: call.args.clone(),
                }),
                ..ContentPart::default()
            },
            Part::ToolResponse { name, response } => ContentPart {
                function_response: Some(FunctionResponse {
                    name: name.clone(),
                    response: serde_json::to_value(response).unwrap_or(Value::Null),
                }),
                ..ContentPart::default()
            },
        })
        .collect();
    Content {
        role: Some(role.to_string()),
        parts,
    }
}

fn to_declaration(decl: &ToolDeclaration) -> FunctionDeclaration {
    FunctionDeclaration {
        name: decl.name.to_string(),
        description: decl.description.clone(),
        parameters: provider_schema(&decl.parameters),
    }
}

/// Gemini expects upper-case OpenAPI type names (`OBJECT`, `STRING`, …).
fn provider_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let converted = match (key.as_str(), value) {
                        ("type", Value::String(ty)) => Value::String(ty.to_uppercase()),
                        _ => provider_schema(value),
                    };
                    (key.clone(), converted)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(provider_schema).collect()),
        other => other.clone(),
    }
}

/// Only the first candidate is used; a response without one is an empty turn.
fn into_model_turn(response: GenerateResponse) -> ModelTurn {
    let usage = response.usage_metadata.map(|meta| Usage {
        prompt_tokens: meta.prompt_token_count,
        response_tokens: meta.candidates_token_count,
    });
    let mut turn = ModelTurn {
        usage,
        ..ModelTurn::default()
    };
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default();
    for part in parts {
        if let Some(text) = part.text {
            turn.text.push(text);
        }
        if let Some(call) = part.function_call {
            turn.tool_calls.push(ToolCall {
                name: call.name,
                args: call.args,
            });
        }
    }
    turn
}
