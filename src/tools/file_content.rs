//! File reading tool with a character cap.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;

use super::{required_str, SandboxRoot, Tool, ToolError};

/// Widest UTF-8 encoding of a single character.
const MAX_UTF8_WIDTH: u64 = 4;

/// Read a file, truncating it to `max_chars` characters.
pub struct GetFileContent {
    max_chars: usize,
}

impl GetFileContent {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

#[async_trait]
impl Tool for GetFileContent {
    fn name(&self) -> &str {
        "get_file_content"
    }

    fn description(&self) -> &str {
        "Reads and returns the contents of a file, constrained to the working directory."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The path to the file to read, relative to the working directory."
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: Value, sandbox: &SandboxRoot) -> Result<String, ToolError> {
        let file_path = required_str(&args, "file_path")?;
        let path = sandbox.resolve(file_path, "read")?;

        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(ToolError::NotAFile(file_path.to_string()));
        }

        // Enough bytes for max_chars + 1 characters, never the whole file.
        let byte_limit = (self.max_chars as u64 + 1) * MAX_UTF8_WIDTH;
        let file = tokio::fs::File::open(&path).await?;
        let mut buf = Vec::new();
        file.take(byte_limit).read_to_end(&mut buf).await?;

        let text = decode_prefix(&buf, buf.len() as u64 == byte_limit)
            .ok_or_else(|| ToolError::NotText(file_path.to_string()))?;

        match text.char_indices().nth(self.max_chars) {
            Some((cut, _)) => {
                tracing::debug!("Truncated {} at {} characters", file_path, self.max_chars);
                Ok(format!(
                    "{}[...File \"{}\" truncated at {} characters]",
                    &text[..cut],
                    file_path,
                    self.max_chars
                ))
            }
            None => Ok(text.to_string()),
        }
    }
}

/// Decode `buf` as UTF-8. When the read stopped at the byte limit, a
/// character split by the cut is dropped instead of rejected.
fn decode_prefix(buf: &[u8], hit_limit: bool) -> Option<&str> {
    match std::str::from_utf8(buf) {
        Ok(text) => Some(text),
        Err(e) if hit_limit && e.error_len().is_none() => {
            std::str::from_utf8(&buf[..e.valid_up_to()]).ok()
        }
        Err(_) => None,
    }
}
