//! Conversation and tool-call types shared by the agent, the tools and the model client.

use serde_json::{Map, Value};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
    Tool,
}

/// A model-requested tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Outcome of a tool call: a success string or an error string, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolPayload {
    Success(String),
    Error(String),
}

/// Result of one tool invocation, tagged with the tool name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub name: String,
    pub payload: ToolPayload,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: ToolPayload::Success(output.into()),
        }
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: ToolPayload::Error(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.payload, ToolPayload::Error(_))
    }

    /// The payload text regardless of outcome.
    pub fn content(&self) -> &str {
        match &self.payload {
            ToolPayload::Success(text) | ToolPayload::Error(text) => text,
        }
    }
}

/// One piece of a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text { text: String },
    ToolCall { invocation: ToolInvocation },
    ToolResponse { result: ToolResult },
}

/// A single conversation message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self::model(vec![Part::Text { text: text.into() }])
    }

    pub fn model_tool_calls(invocations: Vec<ToolInvocation>) -> Self {
        Self::model(
            invocations
                .into_iter()
                .map(|invocation| Part::ToolCall { invocation })
                .collect(),
        )
    }

    pub fn tool_result(result: ToolResult) -> Self {
        Self {
            role: Role::Tool,
            parts: vec![Part::ToolResponse { result }],
        }
    }

    /// Concatenated text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool invocations in the order the model emitted them.
    pub fn tool_invocations(&self) -> Vec<&ToolInvocation> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::ToolCall { invocation } => Some(invocation),
                _ => None,
            })
            .collect()
    }

    pub fn tool_results(&self) -> Vec<&ToolResult> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::ToolResponse { result } => Some(result),
                _ => None,
            })
            .collect()
    }
}

/// Tool declaration sent to the model with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Token accounting reported by the model API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub response_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.response_tokens += other.response_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Everything a model call needs.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub model: &'a str,
    pub system_instruction: &'a str,
    pub tools: &'a [ToolDeclaration],
    pub messages: &'a [Message],
}

/// The model's reply to one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub message: Message,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

impl ModelReply {
    pub fn new(message: Message) -> Self {
        Self {
            message,
            usage: None,
            finish_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invocation_drops_non_object_arguments() {
        let invocation = ToolInvocation::new("get_files_info", json!("oops"));
        assert!(invocation.arguments.is_empty());

        let invocation = ToolInvocation::new("get_files_info", json!({"directory": "pkg"}));
        assert_eq!(invocation.arguments["directory"], json!("pkg"));
    }

    #[test]
    fn message_splits_text_and_calls() {
        let message = Message::model(vec![
            Part::Text {
                text: "Let me look. ".to_string(),
            },
            Part::ToolCall {
                invocation: ToolInvocation::new("get_files_info", json!({})),
            },
            Part::Text {
                text: "Done.".to_string(),
            },
        ]);

        assert_eq!(message.text(), "Let me look. Done.");
        assert_eq!(message.tool_invocations().len(), 1);
        assert!(message.tool_results().is_empty());
    }

    #[test]
    fn tool_result_content_ignores_outcome() {
        let ok = ToolResult::success("write_file", "written");
        let err = ToolResult::error("write_file", "Error: nope");
        assert!(!ok.is_error());
        assert!(err.is_error());
        assert_eq!(ok.content(), "written");
        assert_eq!(err.content(), "Error: nope");
    }
}
