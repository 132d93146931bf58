//! System instruction for the agent.

use crate::tools::ToolRegistry;

/// Build the system instruction, listing the available tools.
pub fn build_system_prompt(tools: &ToolRegistry) -> String {
    let tool_descriptions = tools
        .declarations()
        .iter()
        .map(|t| format!("- {}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a helpful AI coding agent.

When a user asks a question or makes a request, make a function call plan. You can perform the following operations:

{tool_descriptions}

All paths you provide should be relative to the working directory. You do not need to specify the working directory in your function calls as it is automatically injected for security reasons.

When you have gathered enough information, answer the user directly in plain text."#,
        tool_descriptions = tool_descriptions
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn lists_every_tool() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tools = ToolRegistry::new(&Config::new(String::new(), dir.path().to_path_buf()))
            .expect("registry");
        let prompt = build_system_prompt(&tools);

        for name in [
            "get_files_info",
            "get_file_content",
            "run_python_file",
            "write_file",
        ] {
            assert!(prompt.contains(&format!("- {}: ", name)), "{name} missing");
        }
        assert!(prompt.contains("relative to the working directory"));
    }
}
