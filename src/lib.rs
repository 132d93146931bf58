//! # AI Agent
//!
//! A small command-line coding agent backed by Gemini.
//!
//! This library provides:
//! - A tool-based agent loop that relays a prompt to the model
//! - Four sandboxed tools (list, read, write, run a script) confined to one directory
//! - A Gemini `generateContent` client behind the [`llm::LlmClient`] trait
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Seed the conversation with the user prompt
//! 2. Send it to the model with the system instruction and tool declarations
//! 3. Execute any tool calls the model asks for and append their results
//! 4. Repeat until the model answers in text or the iteration ceiling is hit
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ai_agent::{agent::Agent, config::Config, llm::GeminiClient};
//!
//! let config = Config::from_env()?;
//! let llm = Arc::new(GeminiClient::new(&config)?);
//! let agent = Agent::new(config, llm)?;
//! let run = agent.run("What files are in the root?").await;
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod progress;
pub mod tools;

pub use config::Config;
