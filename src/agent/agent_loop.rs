//! Core agent loop implementation.

use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;
use crate::llm::{
    LlmClient, LlmError, Message, ModelRequest, TokenUsage, ToolDeclaration, ToolInvocation,
    ToolResult,
};
use crate::tools::ToolRegistry;

use super::conversation::Conversation;
use super::prompt::build_system_prompt;

/// Why a run stopped without an answer.
#[derive(Debug, Error)]
pub enum AgentFault {
    #[error("model API call failed: {0}")]
    Model(#[from] LlmError),

    #[error("model returned neither text nor tool calls (finish reason: {finish_reason})")]
    EmptyReply { finish_reason: String },
}

/// How a run ended.
#[derive(Debug)]
pub enum LoopOutcome {
    /// The model answered in text.
    Completed { text: String, iterations: usize },
    /// The iteration ceiling was reached without an answer.
    Exhausted { iterations: usize },
    /// A model call failed or returned nothing usable.
    Faulted { iteration: usize, reason: AgentFault },
}

/// Result of [`Agent::run`].
#[derive(Debug)]
pub struct AgentRun {
    pub outcome: LoopOutcome,
    pub conversation: Conversation,
    pub usage: TokenUsage,
}

/// Progress notifications emitted while a run is in flight.
#[derive(Debug)]
pub enum AgentEvent<'a> {
    ModelReplied {
        iteration: usize,
        usage: Option<&'a TokenUsage>,
    },
    ToolCalled {
        invocation: &'a ToolInvocation,
    },
    ToolFinished {
        result: &'a ToolResult,
    },
}

/// Callback invoked for every [`AgentEvent`].
pub type EventHandler = Arc<dyn Fn(&AgentEvent<'_>) + Send + Sync>;

/// The agent: a model, the sandboxed tools, and the loop that joins them.
pub struct Agent {
    config: Config,
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    system_prompt: String,
    declarations: Vec<ToolDeclaration>,
    on_event: Option<EventHandler>,
}

impl Agent {
    /// Create a new agent that talks to `llm` with the given configuration.
    pub fn new(config: Config, llm: Arc<dyn LlmClient>) -> anyhow::Result<Self> {
        let tools = ToolRegistry::new(&config)?;
        let system_prompt = build_system_prompt(&tools);
        let declarations = tools.declarations();

        tracing::debug!(
            "Agent ready: model={}, sandbox={}",
            config.model,
            tools.sandbox().path().display()
        );

        Ok(Self {
            config,
            llm,
            tools,
            system_prompt,
            declarations,
            on_event: None,
        })
    }

    /// Register a callback for progress events.
    pub fn on_event(mut self, handler: EventHandler) -> Self {
        self.on_event = Some(handler);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run the prompt to completion, exhaustion or failure.
    pub async fn run(&self, prompt: &str) -> AgentRun {
        let mut conversation = Conversation::new(prompt);
        let mut usage = TokenUsage::default();
        let outcome = self.drive(&mut conversation, &mut usage).await;

        match &outcome {
            LoopOutcome::Completed { iterations, .. } => {
                tracing::info!("Agent completed after {} iterations", iterations)
            }
            LoopOutcome::Exhausted { iterations } => {
                tracing::info!("Max iterations ({}) reached without completion", iterations)
            }
            LoopOutcome::Faulted { iteration, reason } => {
                tracing::info!("Agent iteration {} failed: {}", iteration, reason)
            }
        }

        AgentRun {
            outcome,
            conversation,
            usage,
        }
    }

    async fn drive(&self, conversation: &mut Conversation, usage: &mut TokenUsage) -> LoopOutcome {
        for iteration in 1..=self.config.max_iterations {
            tracing::debug!("Agent iteration {}", iteration);

            let request = ModelRequest {
                model: &self.config.model,
                system_instruction: &self.system_prompt,
                tools: &self.declarations,
                messages: conversation.messages(),
            };

            let reply = match self.llm.generate(request).await {
                Ok(reply) => reply,
                Err(e) => {
                    return LoopOutcome::Faulted {
                        iteration,
                        reason: AgentFault::Model(e),
                    }
                }
            };

            if let Some(reply_usage) = &reply.usage {
                usage.add(reply_usage);
            }
            self.emit(&AgentEvent::ModelReplied {
                iteration,
                usage: reply.usage.as_ref(),
            });

            let finish_reason = reply.finish_reason;
            let text = reply.message.text();
            let invocations: Vec<ToolInvocation> = reply
                .message
                .tool_invocations()
                .into_iter()
                .cloned()
                .collect();
            conversation.push(reply.message);

            if !text.trim().is_empty() {
                return LoopOutcome::Completed {
                    text,
                    iterations: iteration,
                };
            }

            if invocations.is_empty() {
                return LoopOutcome::Faulted {
                    iteration,
                    reason: AgentFault::EmptyReply {
                        finish_reason: finish_reason.unwrap_or_else(|| "unspecified".to_string()),
                    },
                };
            }

            // Sequential, in the order the model asked.
            for invocation in &invocations {
                self.emit(&AgentEvent::ToolCalled { invocation });
                let result = self.tools.dispatch(invocation).await;
                self.emit(&AgentEvent::ToolFinished { result: &result });
                conversation.push(Message::tool_result(result));
            }
        }

        LoopOutcome::Exhausted {
            iterations: self.config.max_iterations,
        }
    }

    fn emit(&self, event: &AgentEvent<'_>) {
        if let Some(handler) = &self.on_event {
            handler(event);
        }
    }
}
