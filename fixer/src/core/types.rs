//! Shared tool contracts: names, typed requests, failures and envelopes.
//!
//! Tools return `Result<String, ToolError>`. Text rendering happens only when
//! the dispatcher builds a [`ToolResponse`] for the model.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of tools the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    ListDir,
    ReadFile,
    WriteFile,
    RunScript,
}

impl ToolName {
    pub const ALL: [ToolName; 4] = [
        ToolName::ListDir,
        ToolName::ReadFile,
        ToolName::WriteFile,
        ToolName::RunScript,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::ListDir => "list_dir",
            ToolName::ReadFile => "read_file",
            ToolName::WriteFile => "write_file",
            ToolName::RunScript => "run_script",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    /// Whether a call to this tool counts as a verification run.
    pub fn is_verification(self) -> bool {
        self == ToolName::RunScript
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool invocation with its arguments bound to typed fields.
///
/// The sandbox root never appears here; the dispatcher supplies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    ListDir { directory: Option<String> },
    ReadFile { file_path: String },
    WriteFile { file_path: String, content: String },
    RunScript { file_path: String, args: Vec<String> },
}

impl ToolRequest {
    pub fn name(&self) -> ToolName {
        match self {
            ToolRequest::ListDir { .. } => ToolName::ListDir,
            ToolRequest::ReadFile { .. } => ToolName::ReadFile,
            ToolRequest::WriteFile { .. } => ToolName::WriteFile,
            ToolRequest::RunScript { .. } => ToolName::RunScript,
        }
    }
}

/// Failure category, one per row of the tool-layer error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Containment,
    NotFound,
    ResourceExceeded,
    OsFailure,
    Protocol,
}

/// Recoverable tool failure. The message is fed back to the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Cannot {verb} \"{path}\" as it is outside the permitted working directory")]
    OutsideSandbox { verb: &'static str, path: String },

    #[error("{0}")]
    NotFound(String),

    #[error("Execution of '{path}' timed out after {secs} seconds.")]
    TimedOut { path: String, secs: u64 },

    #[error("{0}")]
    Os(String),

    #[error("Unknown function: {0}")]
    UnknownTool(String),

    #[error("Error executing {tool}: {detail}")]
    Execution { tool: String, detail: String },
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::OutsideSandbox { .. } => ErrorKind::Containment,
            ToolError::NotFound(_) => ErrorKind::NotFound,
            ToolError::TimedOut { .. } => ErrorKind::ResourceExceeded,
            ToolError::Os(_) => ErrorKind::OsFailure,
            ToolError::UnknownTool(_) | ToolError::Execution { .. } => ErrorKind::Protocol,
        }
    }
}

/// Result type shared by the four tool operations.
pub type ToolResult = Result<String, ToolError>;

/// Envelope handed back to the model: `{"result": …}` or `{"error": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolResponse {
    Result(String),
    Error(String),
}

impl ToolResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, ToolResponse::Error(_))
    }

    pub fn text(&self) -> &str {
        match self {
            ToolResponse::Result(text) | ToolResponse::Error(text) => text,
        }
    }
}

/// Tool failures carry an `Error: ` prefix; dispatcher-level protocol
/// failures already read as errors and are passed through as-is.
impl From<ToolResult> for ToolResponse {
    fn from(result: ToolResult) -> Self {
        match result {
            Ok(text) => ToolResponse::Result(text),
            Err(err) if err.kind() == ErrorKind::Protocol => ToolResponse::Error(err.to_string()),
            Err(err) => ToolResponse::Error(format!("Error: {err}")),
        }
    }
}
