//! Tool declarations advertised to the model.
//!
//! None of the schemas mention the sandbox root; it is injected server-side.

use serde::Serialize;
use serde_json::{Value, json};

use super::SandboxLimits;
use crate::core::types::ToolName;

/// Name, description and JSON Schema parameters of one tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDeclaration {
    pub name: &'static str,
    pub description: String,
    pub parameters: Value,
}

/// Declarations for every [`ToolName`], in declaration order.
pub fn declarations(limits: &SandboxLimits) -> Vec<ToolDeclaration> {
    ToolName::ALL
        .into_iter()
        .map(|tool| declaration(tool, limits))
        .collect()
}

fn declaration(tool: ToolName, limits: &SandboxLimits) -> ToolDeclaration {
    let (description, parameters) = match tool {
        ToolName::ListDir => (
            "Lists files in the specified directory along with their sizes, constrained to the working directory.".to_string(),
            json!({
                "type": "object",
                "properties": {
                    "directory": {
                        "type": "string",
                        "description": "The directory to list files from, relative to the working directory. If not provided, lists files in the working directory itself."
                    }
                }
            }),
        ),
        ToolName::ReadFile => (
            format!(
                "Reads the content of a specified file, constrained to the working directory. Truncates files longer than {} characters and appends a truncation message.",
                limits.read_limit_chars
            ),
            json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path to the file to read, relative to the working directory."
                    }
                },
                "required": ["file_path"]
            }),
        ),
        ToolName::WriteFile => (
            "Writes or overwrites content to a file within the working directory. Creates the file and any necessary parent directories if they do not exist.".to_string(),
            json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path to the file to write, relative to the working directory."
                    },
                    "content": {
                        "type": "string",
                        "description": "The string content to write to the file."
                    }
                },
                "required": ["file_path", "content"]
            }),
        ),
        ToolName::RunScript => (
            format!(
                "Executes a .{} script within the working directory, capturing its standard output and error. The execution is limited to {} seconds.",
                limits.script_extension,
                limits.script_timeout.as_secs()
            ),
            json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path to the script to execute, relative to the working directory."
                    },
                    "args": {
                        "type": "array",
                        "description": "Optional list of string arguments to pass to the script.",
                        "items": { "type": "string" }
                    }
                },
                "required": ["file_path"]
            }),
        ),
    };

    ToolDeclaration {
        name: tool.as_str(),
        description,
        parameters,
    }
}
