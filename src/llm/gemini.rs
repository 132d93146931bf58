//! Gemini `generateContent` client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    LlmClient, LlmError, Message, ModelReply, ModelRequest, Part, Role, TokenUsage,
    ToolDeclaration, ToolInvocation, ToolPayload,
};
use crate::config::Config;

/// Client for the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client from the agent configuration.
    ///
    /// A missing API key is not rejected here; the first call fails instead.
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn generate_content_url(&self, model: &str) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{base}/models/{model}:generateContent")
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelReply, LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let url = self.generate_content_url(request.model);
        let body = build_generate_content_body(&request);

        tracing::debug!(
            model = request.model,
            messages = request.messages.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::HttpStatus {
                status: status.as_u16(),
                body: raw,
            });
        }

        parse_generate_content_response(&raw)
    }
}

fn build_generate_content_body(request: &ModelRequest<'_>) -> Value {
    let mut body = json!({
        "contents": to_gemini_contents(request.messages),
    });

    if !request.system_instruction.trim().is_empty() {
        body["systemInstruction"] = json!({
            "parts": [{ "text": request.system_instruction }],
        });
    }

    if !request.tools.is_empty() {
        body["tools"] = json!([{
            "functionDeclarations": request
                .tools
                .iter()
                .map(to_gemini_function_declaration)
                .collect::<Vec<_>>(),
        }]);
    }

    body
}

fn to_gemini_function_declaration(tool: &ToolDeclaration) -> Value {
    json!({
        "name": tool.name,
        "description": tool.description,
        "parameters": tool.parameters,
    })
}

/// Convert the conversation into Gemini `contents`.
///
/// Tool results travel as `user` contents of `functionResponse` parts, and
/// consecutive results are merged so one model turn gets one response turn.
fn to_gemini_contents(messages: &[Message]) -> Value {
    let mut contents: Vec<Value> = Vec::new();
    let mut last_was_tool = false;

    for message in messages {
        let parts: Vec<Value> = message.parts.iter().filter_map(to_gemini_part).collect();
        if parts.is_empty() {
            continue;
        }

        match message.role {
            Role::User => {
                contents.push(json!({ "role": "user", "parts": parts }));
                last_was_tool = false;
            }
            Role::Model => {
                contents.push(json!({ "role": "model", "parts": parts }));
                last_was_tool = false;
            }
            Role::Tool => {
                if last_was_tool {
                    if let Some(Value::Array(existing)) = contents
                        .last_mut()
                        .and_then(|content| content.get_mut("parts"))
                    {
                        existing.extend(parts);
                        continue;
                    }
                }
                contents.push(json!({ "role": "user", "parts": parts }));
                last_was_tool = true;
            }
        }
    }

    Value::Array(contents)
}

fn to_gemini_part(part: &Part) -> Option<Value> {
    match part {
        Part::Text { text } => {
            if text.is_empty() {
                None
            } else {
                Some(json!({ "text": text }))
            }
        }
        Part::ToolCall { invocation } => Some(json!({
            "functionCall": {
                "name": invocation.name,
                "args": invocation.arguments,
            }
        })),
        Part::ToolResponse { result } => {
            let response = match &result.payload {
                ToolPayload::Success(output) => json!({ "result": output }),
                ToolPayload::Error(message) => json!({ "error": message }),
            };
            Some(json!({
                "functionResponse": {
                    "name": result.name,
                    "response": response,
                }
            }))
        }
    }
}

fn parse_generate_content_response(raw: &str) -> Result<ModelReply, LlmError> {
    let parsed: GenerateContentResponse = serde_json::from_str(raw)?;

    let usage = parsed.usage_metadata.map(|usage| TokenUsage {
        prompt_tokens: usage.prompt_token_count.unwrap_or(0),
        response_tokens: usage.candidates_token_count.unwrap_or(0),
        total_tokens: usage.total_token_count.unwrap_or(0),
    });

    let Some(candidate) = parsed
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
    else {
        let reason = parsed
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .map(|reason| format!("prompt was blocked: {reason}"))
            .unwrap_or_else(|| "response contained no candidates".to_string());
        return Err(LlmError::InvalidResponse(reason));
    };

    let mut parts = Vec::new();
    for part in candidate
        .content
        .and_then(|content| content.parts)
        .unwrap_or_default()
    {
        if let Some(text) = part.text {
            if !text.is_empty() {
                parts.push(Part::Text { text });
            }
        }
        if let Some(function_call) = part.function_call {
            parts.push(Part::ToolCall {
                invocation: ToolInvocation::new(
                    function_call.name,
                    function_call.args.unwrap_or_else(|| json!({})),
                ),
            });
        }
    }

    Ok(ModelReply {
        message: Message::model(parts),
        usage,
        finish_reason: candidate.finish_reason,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<GenerateContentCandidate>>,
    usage_metadata: Option<GenerateContentUsage>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentCandidate {
    content: Option<GenerateContentContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentContent {
    parts: Option<Vec<GenerateContentPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentPart {
    text: Option<String>,
    function_call: Option<GenerateContentFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentFunctionCall {
    name: String,
    args: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentUsage {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
    total_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}
