//! Directory listing tool.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{optional_str, SandboxRoot, Tool, ToolError};

/// List the entries of a directory with their size and type.
pub struct GetFilesInfo;

#[async_trait]
impl Tool for GetFilesInfo {
    fn name(&self) -> &str {
        "get_files_info"
    }

    fn description(&self) -> &str {
        "Lists files in the specified directory along with their sizes, constrained to the working directory."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "The directory to list files from, relative to the working directory. If not provided, lists files in the working directory itself."
                }
            }
        })
    }

    async fn execute(&self, args: Value, sandbox: &SandboxRoot) -> Result<String, ToolError> {
        let directory = optional_str(&args, "directory")?.unwrap_or(".");
        let path = sandbox.resolve(directory, "list")?;

        let is_dir = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(ToolError::NotADirectory(directory.to_string()));
        }

        // Entry order is whatever the OS yields.
        let mut entries = tokio::fs::read_dir(&path).await?;
        let mut lines = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            match tokio::fs::metadata(entry.path()).await {
                Ok(meta) => lines.push(format!(
                    "- {}: file_size={} bytes, is_dir={}",
                    name,
                    meta.len(),
                    meta.is_dir()
                )),
                Err(e) => lines.push(format!("- {}: Error: {}", name, e)),
            }
        }

        tracing::debug!("Listed {} entries in {}", lines.len(), directory);
        Ok(lines.join("\n"))
    }
}
