//! Script execution tool.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use super::{optional_string_list, required_str, SandboxRoot, Tool, ToolError};
use crate::config::ScriptInterpreter;

/// Run a script file with the configured interpreter.
pub struct RunPythonFile {
    interpreter: ScriptInterpreter,
    timeout: Duration,
}

impl RunPythonFile {
    pub fn new(interpreter: ScriptInterpreter, timeout: Duration) -> Self {
        Self {
            interpreter,
            timeout,
        }
    }

    fn has_expected_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.interpreter.extension)
    }
}

#[async_trait]
impl Tool for RunPythonFile {
    fn name(&self) -> &str {
        "run_python_file"
    }

    fn description(&self) -> &str {
        "Executes a Python file with optional command-line arguments, constrained to the working directory."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The path to the Python file to execute, relative to the working directory."
                },
                "args": {
                    "type": "array",
                    "description": "Optional command-line arguments to pass to the Python file.",
                    "items": { "type": "string" }
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: Value, sandbox: &SandboxRoot) -> Result<String, ToolError> {
        let file_path = required_str(&args, "file_path")?;
        let script_args = optional_string_list(&args, "args")?;
        let path = sandbox.resolve(file_path, "execute")?;

        if tokio::fs::metadata(&path).await.is_err() {
            return Err(ToolError::NotFound(file_path.to_string()));
        }
        if !self.has_expected_extension(&path) {
            return Err(ToolError::WrongExtension {
                path: file_path.to_string(),
                language: self.interpreter.language.clone(),
            });
        }

        tracing::info!(
            "Executing script: {} {} {:?}",
            self.interpreter.program,
            file_path,
            script_args
        );

        let mut command = Command::new(&self.interpreter.program);
        command
            .arg(file_path)
            .args(&script_args)
            .current_dir(sandbox.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let spawn_error = |source| ToolError::Spawn {
            language: self.interpreter.language.clone(),
            source,
        };
        let mut child = command.spawn().map_err(spawn_error)?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let run = async {
            let (status, out, err) =
                tokio::join!(child.wait(), read_pipe(stdout), read_pipe(stderr));
            Ok::<_, std::io::Error>((status?, out?, err?))
        };

        let (status, out, err) = match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result.map_err(spawn_error)?,
            Err(_) => {
                terminate(&mut child).await;
                return Err(ToolError::Timeout {
                    language: self.interpreter.language.clone(),
                    timeout: self.timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&out);
        let stderr = String::from_utf8_lossy(&err);

        let mut lines = Vec::new();
        if !stdout.trim().is_empty() {
            lines.push(format!("STDOUT: {}", stdout.trim()));
        }
        if !stderr.trim().is_empty() {
            lines.push(format!("STDERR: {}", stderr.trim()));
        }
        if !status.success() {
            lines.push(format!(
                "Process exited with code {}",
                status.code().unwrap_or(-1)
            ));
        }

        if lines.is_empty() {
            Ok("No output produced.".to_string())
        } else {
            Ok(lines.join("\n"))
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Kill the child (and anything it spawned) and reap it.
async fn terminate(child: &mut Child) {
    kill_process_group(child);
    if let Err(e) = child.kill().await {
        tracing::warn!("Failed to kill timed out script: {}", e);
    }
}

#[cfg(unix)]
fn kill_process_group(child: &Child) {
    if let Some(pid) = child.id() {
        // SAFETY: `kill` has no memory-safety preconditions; the negative pid
        // targets the group created by `process_group(0)` at spawn.
        unsafe {
            libc::kill(-(pid as libc::pid_t), libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}
