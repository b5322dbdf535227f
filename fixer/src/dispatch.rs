//! Binding of model tool calls to sandboxed tool operations.
//!
//! This is the only place where untyped call arguments become a
//! [`ToolRequest`]. Whatever happens below it, the caller receives a
//! [`ToolResponse`] envelope.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::core::conversation::ToolCall;
use crate::core::types::{ToolError, ToolName, ToolRequest, ToolResponse, ToolResult};
use crate::tools::Sandbox;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListDirArgs {
    #[serde(default)]
    directory: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReadFileArgs {
    file_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WriteFileArgs {
    file_path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RunScriptArgs {
    file_path: String,
    #[serde(default)]
    args: Vec<String>,
}

/// Turn a raw tool call into a typed request.
///
/// Missing or `null` arguments are treated as an empty object.
pub fn bind(call: &ToolCall) -> Result<ToolRequest, ToolError> {
    let tool =
        ToolName::parse(&call.name).ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;
    let request = match tool {
        ToolName::ListDir => {
            let args: ListDirArgs = parse_args(tool, &call.args)?;
            ToolRequest::ListDir {
                directory: args.directory,
            }
        }
        ToolName::ReadFile => {
            let args: ReadFileArgs = parse_args(tool, &call.args)?;
            ToolRequest::ReadFile {
                file_path: args.file_path,
            }
        }
        ToolName::WriteFile => {
            let args: WriteFileArgs = parse_args(tool, &call.args)?;
            ToolRequest::WriteFile {
                file_path: args.file_path,
                content: args.content,
            }
        }
        ToolName::RunScript => {
            let args: RunScriptArgs = parse_args(tool, &call.args)?;
            ToolRequest::RunScript {
                file_path: args.file_path,
                args: args.args,
            }
        }
    };
    Ok(request)
}

fn parse_args<T: DeserializeOwned>(tool: ToolName, args: &Value) -> Result<T, ToolError> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args.clone()
    };
    serde_json::from_value(args).map_err(|e| ToolError::Execution {
        tool: tool.to_string(),
        detail: e.to_string(),
    })
}

/// Routes tool calls into one [`Sandbox`].
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    sandbox: Sandbox,
}

impl ToolDispatcher {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// Bind and execute `call`, converting every failure into an error envelope.
    #[instrument(skip_all, fields(tool = %call.name))]
    pub fn dispatch(&self, call: &ToolCall) -> ToolResponse {
        let result = bind(call).and_then(|request| self.execute_guarded(&request));
        if let Err(err) = &result {
            debug!(kind = ?err.kind(), err = %err, "tool call failed");
        }
        ToolResponse::from(result)
    }

    /// Execute an already-bound request against the sandbox.
    pub fn execute(&self, request: &ToolRequest) -> ToolResult {
        match request {
            ToolRequest::ListDir { directory } => {
                self.sandbox.list_dir(directory.as_deref().unwrap_or("."))
            }
            ToolRequest::ReadFile { file_path } => self.sandbox.read_file(file_path),
            ToolRequest::WriteFile { file_path, content } => {
                self.sandbox.write_file(file_path, content)
            }
            ToolRequest::RunScript { file_path, args } => self.sandbox.run_script(file_path, args),
        }
    }

    fn execute_guarded(&self, request: &ToolRequest) -> ToolResult {
        catch_unwind(AssertUnwindSafe(|| self.execute(request))).unwrap_or_else(|payload| {
            let detail = panic_message(payload.as_ref());
            error!(tool = %request.name(), detail = %detail, "tool panicked");
            Err(ToolError::Execution {
                tool: request.name().to_string(),
                detail,
            })
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "tool panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestSandbox;
    use serde_json::json;

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall {
            name: name.to_string(),
            args,
        }
    }

    #[test]
    fn unknown_tool_names_the_identifier() {
        let sandbox = TestSandbox::new();
        let response = sandbox.dispatcher().dispatch(&call("delete_everything", json!({})));
        assert_eq!(
            response,
            ToolResponse::Error("Unknown function: delete_everything".to_string())
        );
    }

    #[test]
    fn binds_optional_arguments() {
        assert_eq!(
            bind(&call("list_dir", Value::Null)).expect("bind"),
            ToolRequest::ListDir { directory: None }
        );
        assert_eq!(
            bind(&call("run_script", json!({"file_path": "main.py"}))).expect("bind"),
            ToolRequest::RunScript {
                file_path: "main.py".to_string(),
                args: Vec::new()
            }
        );
    }

    #[test]
    fn missing_required_argument_is_execution_error() {
        let err = bind(&call("read_file", json!({}))).unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Error executing read_file: missing field `file_path`")
        );
    }

    #[test]
    fn model_cannot_smuggle_a_root_argument() {
        let err = bind(&call(
            "read_file",
            json!({"file_path": "x", "working_directory": "/"}),
        ))
        .unwrap_err();
        assert!(err.to_string().contains("unknown field `working_directory`"));
    }

    #[test]
    fn successful_call_is_wrapped_as_result() {
        let sandbox = TestSandbox::new();
        sandbox.write("hello.txt", "hi");
        let response = sandbox
            .dispatcher()
            .dispatch(&call("read_file", json!({"file_path": "hello.txt"})));
        assert_eq!(response, ToolResponse::Result("hi".to_string()));
    }

    #[test]
    fn tool_failure_becomes_error_envelope() {
        let sandbox = TestSandbox::new();
        let response = sandbox
            .dispatcher()
            .dispatch(&call("list_dir", json!({"directory": "../.."})));
        assert!(response.is_error());
        assert!(response.text().starts_with("Error: Cannot list"));
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "tool panicked");
    }
}
