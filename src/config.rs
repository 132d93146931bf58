//! Configuration management for the agent.
//!
//! Configuration can be set via environment variables (a `geminiapi.env` or
//! `.env` file in the current directory is loaded first by the binary):
//! - `GEMINI_API_KEY` - Required by the model client. A missing key is reported
//!   on the first model call, not at startup.
//! - `GEMINI_MODEL` - Optional. The model to use. Defaults to `gemini-2.0-flash-001`.
//! - `GEMINI_API_BASE` - Optional. API base URL. Defaults to the public v1beta endpoint.
//! - `GEMINI_REQUEST_TIMEOUT_SECS` - Optional. HTTP timeout per model call. Defaults to `120`.
//!
//! The sandbox root, iteration ceiling, read cap and script timeout are fixed
//! for the CLI; tests build a [`Config`] with [`Config::new`] and override them.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Directory every tool is confined to, relative to the process working directory.
pub const DEFAULT_WORKING_DIR: &str = "./calculator";

/// Model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";

/// Public Gemini REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Maximum number of characters `get_file_content` returns.
pub const MAX_CHARS: usize = 10_000;

/// Maximum number of model round-trips per run.
pub const MAX_ITERATIONS: usize = 20;

/// Wall-clock limit for `run_python_file`.
pub const SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Interpreter used by the script runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInterpreter {
    /// Program invoked as `program <file> [args...]`
    pub program: String,

    /// File extension (without the dot) a script must carry
    pub extension: String,

    /// Human-readable language name used in error messages
    pub language: String,
}

impl Default for ScriptInterpreter {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            extension: "py".to_string(),
            language: "Python".to_string(),
        }
    }
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key (may be empty; the client rejects it on first use)
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// API base URL
    pub api_base: String,

    /// Timeout for a single model request
    pub request_timeout: Duration,

    /// Sandbox root for every tool call
    pub working_dir: PathBuf,

    /// Maximum iterations for the agent loop
    pub max_iterations: usize,

    /// Character cap for file reads
    pub max_chars: usize,

    /// Timeout for script execution
    pub script_timeout: Duration,

    /// Interpreter for script execution
    pub interpreter: ScriptInterpreter,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `GEMINI_REQUEST_TIMEOUT_SECS` is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();

        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let api_base =
            std::env::var("GEMINI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let request_timeout_secs: u64 = std::env::var("GEMINI_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("GEMINI_REQUEST_TIMEOUT_SECS".to_string(), format!("{}", e))
            })?;

        Ok(Self {
            api_key,
            model,
            api_base,
            request_timeout: Duration::from_secs(request_timeout_secs.max(1)),
            ..Self::new(String::new(), PathBuf::from(DEFAULT_WORKING_DIR))
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, working_dir: PathBuf) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(120),
            working_dir,
            max_iterations: MAX_ITERATIONS,
            max_chars: MAX_CHARS,
            script_timeout: SCRIPT_TIMEOUT,
            interpreter: ScriptInterpreter::default(),
        }
    }
}
