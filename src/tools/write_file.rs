//! File writing tool.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{required_str, SandboxRoot, Tool, ToolError};

/// Write or overwrite a file, creating parent directories as needed.
pub struct WriteFile;

#[async_trait]
impl Tool for WriteFile {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Writes or overwrites content to a file, constrained to the working directory."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The path to the file to write, relative to the working directory."
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file."
                }
            },
            "required": ["file_path", "content"]
        })
    }

    async fn execute(&self, args: Value, sandbox: &SandboxRoot) -> Result<String, ToolError> {
        let file_path = required_str(&args, "file_path")?;
        let content = required_str(&args, "content")?;
        let path = sandbox.resolve(file_path, "write to")?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(ToolError::CreateDirectories)?;
        }

        // The model only sees the generic message.
        if let Err(e) = tokio::fs::write(&path, content).await {
            tracing::warn!("Failed to write {}: {}", path.display(), e);
            return Err(ToolError::WriteFailure);
        }

        Ok(format!(
            "Successfully wrote to \"{}\" ({} characters written)",
            file_path,
            content.chars().count()
        ))
    }
}
