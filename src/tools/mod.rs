//! Tools the model can call, all confined to one sandbox directory.
//!
//! The registry is a fixed set of four tools. Names the model makes up are
//! answered with an error result instead of a fault, and every tool error is
//! rendered as `Error: ...` text so the model can react to it.

mod file_content;
mod files_info;
mod sandbox;
mod script;
mod write_file;

pub use file_content::GetFileContent;
pub use files_info::GetFilesInfo;
pub use sandbox::SandboxRoot;
pub use script::RunPythonFile;
pub use write_file::WriteFile;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::llm::{ToolDeclaration, ToolInvocation, ToolResult};

/// Argument key the model is never allowed to set.
const WORKING_DIRECTORY_ARG: &str = "working_directory";

/// Failures a tool reports back to the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Cannot {action} \"{path}\" as it is outside the permitted working directory")]
    PathEscape { action: &'static str, path: String },

    #[error("\"{0}\" is not a file")]
    NotAFile(String),

    #[error("\"{0}\" is not a directory")]
    NotADirectory(String),

    #[error("File \"{0}\" not found.")]
    NotFound(String),

    #[error("\"{path}\" is not a {language} file.")]
    WrongExtension { path: String, language: String },

    #[error("executing {language} file: Process timed out after {} seconds", .timeout.as_secs_f64())]
    Timeout { language: String, timeout: Duration },

    #[error("write action unsuccessful.")]
    WriteFailure,

    #[error("creating directories: {0}")]
    CreateDirectories(#[source] std::io::Error),

    #[error("\"{0}\" is not valid UTF-8 text")]
    NotText(String),

    #[error("Unknown function: {0}")]
    UnknownTool(String),

    #[error("Missing '{0}' argument")]
    MissingArgument(&'static str),

    #[error("Invalid '{name}' argument: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("executing {language} file: {source}")]
    Spawn {
        language: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// A tool that can be executed by the agent.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to call this tool.
    fn name(&self) -> &str;

    /// Description shown to the model.
    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. Paths in `args` are relative to `sandbox`.
    async fn execute(&self, args: Value, sandbox: &SandboxRoot) -> Result<String, ToolError>;
}

/// The four tools the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    GetFilesInfo,
    GetFileContent,
    RunPythonFile,
    WriteFile,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::GetFilesInfo,
        ToolKind::GetFileContent,
        ToolKind::RunPythonFile,
        ToolKind::WriteFile,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::GetFilesInfo => "get_files_info",
            ToolKind::GetFileContent => "get_file_content",
            ToolKind::RunPythonFile => "run_python_file",
            ToolKind::WriteFile => "write_file",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Dispatches tool invocations to the sandboxed tools.
pub struct ToolRegistry {
    sandbox: SandboxRoot,
    files_info: GetFilesInfo,
    file_content: GetFileContent,
    run_python_file: RunPythonFile,
    write_file: WriteFile,
}

impl ToolRegistry {
    /// Create a registry rooted at `config.working_dir`.
    pub fn new(config: &Config) -> std::io::Result<Self> {
        Ok(Self {
            sandbox: SandboxRoot::new(&config.working_dir)?,
            files_info: GetFilesInfo,
            file_content: GetFileContent::new(config.max_chars),
            run_python_file: RunPythonFile::new(
                config.interpreter.clone(),
                config.script_timeout,
            ),
            write_file: WriteFile,
        })
    }

    pub fn sandbox(&self) -> &SandboxRoot {
        &self.sandbox
    }

    fn tool(&self, kind: ToolKind) -> &dyn Tool {
        match kind {
            ToolKind::GetFilesInfo => &self.files_info,
            ToolKind::GetFileContent => &self.file_content,
            ToolKind::RunPythonFile => &self.run_python_file,
            ToolKind::WriteFile => &self.write_file,
        }
    }

    /// Declarations sent to the model with every request.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        ToolKind::ALL
            .into_iter()
            .map(|kind| {
                let tool = self.tool(kind);
                ToolDeclaration {
                    name: tool.name().to_string(),
                    description: tool.description().to_string(),
                    parameters: tool.parameters_schema(),
                }
            })
            .collect()
    }

    /// Execute one invocation. Always yields exactly one result; never fails.
    pub async fn dispatch(&self, invocation: &ToolInvocation) -> ToolResult {
        let name = invocation.name.as_str();

        let Some(kind) = ToolKind::from_name(name) else {
            tracing::warn!("Model requested unknown tool: {}", name);
            return ToolResult::error(name, render_error(&ToolError::UnknownTool(name.to_string())));
        };

        let mut args = invocation.arguments.clone();
        if args.remove(WORKING_DIRECTORY_ARG).is_some() {
            tracing::debug!("Discarded model-supplied working directory for {}", name);
        }

        tracing::info!("Executing tool: {}", name);

        match self.tool(kind).execute(Value::Object(args), &self.sandbox).await {
            Ok(output) => ToolResult::success(name, output),
            Err(e) => {
                tracing::debug!("Tool {} failed: {}", name, e);
                ToolResult::error(name, render_error(&e))
            }
        }
    }
}

fn render_error(error: &ToolError) -> String {
    format!("Error: {}", error)
}

/// Fetch a required string argument.
fn required_str<'a>(args: &'a Value, name: &'static str) -> Result<&'a str, ToolError> {
    optional_str(args, name)?.ok_or(ToolError::MissingArgument(name))
}

/// Fetch an optional string argument; `null` counts as absent.
fn optional_str<'a>(args: &'a Value, name: &'static str) -> Result<Option<&'a str>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ToolError::InvalidArgument {
            name,
            reason: format!("expected a string, got {}", other),
        }),
    }
}

/// Fetch an optional array of scalar arguments as strings.
fn optional_string_list(args: &Value, name: &'static str) -> Result<Vec<String>, ToolError> {
    let items = match args.get(name) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ToolError::InvalidArgument {
                name,
                reason: format!("expected an array, got {}", other),
            })
        }
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(ToolError::InvalidArgument {
                name,
                reason: format!("unsupported item {}", other),
            }),
        })
        .collect()
}
