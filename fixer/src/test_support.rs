//! Test-only helpers: a throwaway sandbox and a scripted model.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde_json::Value;
use tempfile::TempDir;

use crate::core::conversation::{Conversation, ToolCall};
use crate::dispatch::ToolDispatcher;
use crate::io::model::{Model, ModelRequest, ModelTurn};
use crate::tools::{Sandbox, SandboxLimits};

/// A sandbox rooted in a fresh temp directory.
///
/// Scripts run with `sh` and use the `.sh` extension so tests need nothing
/// beyond a POSIX shell.
pub struct TestSandbox {
    temp: TempDir,
    dispatcher: ToolDispatcher,
}

impl TestSandbox {
    pub fn new() -> Self {
        Self::with_limits(shell_limits())
    }

    pub fn with_script_timeout(timeout: Duration) -> Self {
        Self::with_limits(SandboxLimits {
            script_timeout: timeout,
            ..shell_limits()
        })
    }

    pub fn with_interpreter(interpreter: &str) -> Self {
        Self::with_limits(SandboxLimits {
            interpreter: interpreter.into(),
            ..shell_limits()
        })
    }

    pub fn with_limits(limits: SandboxLimits) -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let sandbox = Sandbox::new(temp.path(), limits).expect("sandbox");
        Self {
            temp,
            dispatcher: ToolDispatcher::new(sandbox),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn tools(&self) -> &Sandbox {
        self.dispatcher.sandbox()
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.temp.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(path, contents).expect("write fixture");
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.temp.path().join(relative)).expect("read fixture")
    }
}

impl Default for TestSandbox {
    fn default() -> Self {
        Self::new()
    }
}

fn shell_limits() -> SandboxLimits {
    SandboxLimits {
        interpreter: "sh".into(),
        script_extension: "sh".to_string(),
        ..SandboxLimits::default()
    }
}

/// Model that replays queued turns and records what it was shown.
///
/// An `Err` entry is returned as a transport failure. Running past the end of
/// the script is also a transport failure.
pub struct ScriptedModel {
    turns: RefCell<VecDeque<Result<ModelTurn, String>>>,
    seen: RefCell<Vec<Conversation>>,
}

impl ScriptedModel {
    pub fn new(turns: Vec<Result<ModelTurn, String>>) -> Self {
        Self {
            turns: RefCell::new(turns.into()),
            seen: RefCell::new(Vec::new()),
        }
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.seen.borrow().len()
    }

    /// Snapshot of the conversation passed to each call.
    pub fn seen(&self) -> Vec<Conversation> {
        self.seen.borrow().clone()
    }
}

impl Model for ScriptedModel {
    fn generate(&self, request: &ModelRequest<'_>) -> Result<ModelTurn> {
        self.seen.borrow_mut().push(request.conversation.clone());
        match self.turns.borrow_mut().pop_front() {
            Some(Ok(turn)) => Ok(turn),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted model has no more turns")),
        }
    }
}

/// A turn consisting of a single text fragment.
pub fn text_turn(text: &str) -> ModelTurn {
    ModelTurn {
        text: vec![text.to_string()],
        ..ModelTurn::default()
    }
}

/// A turn consisting of a single tool call.
pub fn call_turn(name: &str, args: Value) -> ModelTurn {
    ModelTurn {
        tool_calls: vec![ToolCall {
            name: name.to_string(),
            args,
        }],
        ..ModelTurn::default()
    }
}
