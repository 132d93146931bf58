use std::sync::Arc;

use ai_agent::agent::{Agent, AgentFault, LoopOutcome};
use ai_agent::config::Config;
use ai_agent::llm::{
    GeminiClient, LlmClient, LlmError, Message, ModelRequest, ToolDeclaration, ToolInvocation,
    ToolResult,
};
use httpmock::prelude::*;
use serde_json::json;

fn config(api_base: String, api_key: &str) -> (tempfile::TempDir, Config) {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = Config::new(api_key.to_string(), dir.path().to_path_buf());
    config.api_base = api_base;
    config.model = "gemini-2.0-flash-001".to_string();
    (dir, config)
}

fn declarations() -> Vec<ToolDeclaration> {
    vec![ToolDeclaration {
        name: "get_files_info".to_string(),
        description: "List files".to_string(),
        parameters: json!({"type": "object", "properties": {"directory": {"type": "string"}}}),
    }]
}

#[tokio::test]
async fn gemini_client_sends_expected_http_request() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/models/gemini-2.0-flash-001:generateContent")
            .query_param("key", "test-gemini-key")
            .json_body_includes(
                json!({
                    "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                    "systemInstruction": {"parts": [{"text": "system"}]},
                    "tools": [{"functionDeclarations": [{"name": "get_files_info"}]}]
                })
                .to_string(),
            );

        then.status(200).json_body(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"functionCall": {"name": "get_files_info", "args": {"directory": "pkg"}}}
                    ]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 9,
                "candidatesTokenCount": 5,
                "totalTokenCount": 14
            }
        }));
    });

    let (_dir, config) = config(server.base_url(), "test-gemini-key");
    let client = GeminiClient::new(&config).expect("gemini client should be created");

    let messages = vec![Message::user("hello")];
    let tools = declarations();
    let reply = client
        .generate(ModelRequest {
            model: &config.model,
            system_instruction: "system",
            tools: &tools,
            messages: &messages,
        })
        .await
        .expect("gemini completion should succeed");

    mock.assert();
    let calls = reply.message.tool_invocations();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "get_files_info");
    assert_eq!(calls[0].arguments["directory"], json!("pkg"));
    assert_eq!(reply.usage.map(|u| u.total_tokens), Some(14));
}

#[tokio::test]
async fn gemini_client_sends_function_responses_as_user_turn() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/models/gemini-2.0-flash-001:generateContent")
            .json_body_includes(
                json!({
                    "contents": [
                        {"role": "user"},
                        {"role": "model", "parts": [{"functionCall": {"name": "get_files_info"}}]},
                        {"role": "user", "parts": [{
                            "functionResponse": {
                                "name": "get_files_info",
                                "response": {"result": "- main.py: file_size=1 bytes, is_dir=false"}
                            }
                        }]}
                    ]
                })
                .to_string(),
            );

        then.status(200).json_body(json!({
            "candidates": [{"content": {"parts": [{"text": "Only main.py."}]}}]
        }));
    });

    let (_dir, config) = config(server.base_url(), "test-gemini-key");
    let client = GeminiClient::new(&config).expect("gemini client should be created");

    let messages = vec![
        Message::user("what is here?"),
        Message::model_tool_calls(vec![ToolInvocation::new("get_files_info", json!({}))]),
        Message::tool_result(ToolResult::success(
            "get_files_info",
            "- main.py: file_size=1 bytes, is_dir=false",
        )),
    ];
    let tools = declarations();
    let reply = client
        .generate(ModelRequest {
            model: &config.model,
            system_instruction: "system",
            tools: &tools,
            messages: &messages,
        })
        .await
        .expect("gemini completion should succeed");

    mock.assert();
    assert_eq!(reply.message.text(), "Only main.py.");
    assert!(reply.usage.is_none());
}

#[tokio::test]
async fn gemini_client_surfaces_http_errors() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/models/gemini-2.0-flash-001:generateContent");
        then.status(400)
            .body(r#"{"error":{"message":"API key not valid"}}"#);
    });

    let (_dir, config) = config(server.base_url(), "bad-key");
    let client = GeminiClient::new(&config).expect("gemini client should be created");
    let messages = vec![Message::user("hello")];

    let err = client
        .generate(ModelRequest {
            model: &config.model,
            system_instruction: "",
            tools: &[],
            messages: &messages,
        })
        .await
        .expect_err("bad key should fail");

    mock.assert_hits(1);
    match err {
        LlmError::HttpStatus { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("API key not valid"));
        }
        other => panic!("expected HTTP status error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_api_key_faults_first_iteration_without_request() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST);
        then.status(200);
    });

    let (_dir, config) = config(server.base_url(), "");
    let client = GeminiClient::new(&config).expect("client builds without a key");
    let agent = Agent::new(config, Arc::new(client)).expect("agent");

    let run = agent.run("hello").await;

    assert!(matches!(
        run.outcome,
        LoopOutcome::Faulted {
            iteration: 1,
            reason: AgentFault::Model(LlmError::MissingApiKey)
        }
    ));
    mock.assert_hits(0);
}

#[tokio::test]
async fn agent_completes_against_gemini_server() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/models/gemini-2.0-flash-001:generateContent");
        then.status(200).json_body(json!({
            "candidates": [{"content": {"parts": [{"text": "Hello from Gemini."}]}}],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 4, "totalTokenCount": 7}
        }));
    });

    let (_dir, config) = config(server.base_url(), "test-gemini-key");
    let client = GeminiClient::new(&config).expect("gemini client should be created");
    let agent = Agent::new(config, Arc::new(client)).expect("agent");

    let run = agent.run("Say hello").await;

    mock.assert_hits(1);
    match run.outcome {
        LoopOutcome::Completed { text, iterations } => {
            assert_eq!(text, "Hello from Gemini.");
            assert_eq!(iterations, 1);
        }
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(run.conversation.len(), 2);
    assert_eq!(run.usage.total_tokens, 7);
}
