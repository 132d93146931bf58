//! Agent module - the core agent logic.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Seed the conversation with the user prompt
//! 2. Call the model with the available tools
//! 3. If the model requests tool calls, execute them and feed the results back
//! 4. Repeat until the model answers in text, fails, or the iteration ceiling is hit

mod agent_loop;
mod conversation;
mod prompt;

pub use agent_loop::{Agent, AgentEvent, AgentFault, AgentRun, EventHandler, LoopOutcome};
pub use conversation::Conversation;
pub use prompt::build_system_prompt;
