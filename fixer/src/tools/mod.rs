//! Sandboxed filesystem and process tools.
//!
//! A [`Sandbox`] owns the canonical root and the resource limits. Each tool is
//! a method on it, so the root is injected by construction and never comes
//! from model-supplied arguments.

mod list_dir;
mod read_file;
mod run_script;
pub mod schema;
mod write_file;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::core::path::resolve_within;
use crate::core::types::ToolError;

/// Maximum characters returned by `read_file`.
pub const DEFAULT_READ_LIMIT_CHARS: usize = 10_000;
/// Wall-clock bound for `run_script`.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);
/// Per-stream bound on captured script output.
pub const DEFAULT_SCRIPT_OUTPUT_LIMIT_BYTES: usize = 1_000_000;

/// Resource limits and interpreter settings for one sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxLimits {
    pub read_limit_chars: usize,
    pub script_timeout: Duration,
    pub script_output_limit_bytes: usize,
    /// Program used to execute scripts, e.g. `python3`.
    pub interpreter: PathBuf,
    /// Recognized script extension without the leading dot, e.g. `py`.
    pub script_extension: String,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            read_limit_chars: DEFAULT_READ_LIMIT_CHARS,
            script_timeout: DEFAULT_SCRIPT_TIMEOUT,
            script_output_limit_bytes: DEFAULT_SCRIPT_OUTPUT_LIMIT_BYTES,
            interpreter: PathBuf::from("python3"),
            script_extension: "py".to_string(),
        }
    }
}

/// The fixed directory every tool operation is confined to.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
    limits: SandboxLimits,
}

impl Sandbox {
    /// Canonicalize `root` and bind it to `limits`.
    ///
    /// Fails if the root does not exist or is not a directory.
    pub fn new(root: &Path, limits: SandboxLimits) -> Result<Self> {
        let root = fs::canonicalize(root)
            .with_context(|| format!("resolve sandbox root {}", root.display()))?;
        if !root.is_dir() {
            bail!("sandbox root {} is not a directory", root.display());
        }
        debug!(root = %root.display(), "sandbox ready");
        Ok(Self { root, limits })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn limits(&self) -> &SandboxLimits {
        &self.limits
    }

    /// Resolve a model-supplied path or reject it as a containment violation.
    ///
    /// `verb` names the attempted action in the rejection message.
    fn resolve(&self, relative: &str, verb: &'static str) -> Result<PathBuf, ToolError> {
        resolve_within(&self.root, relative).ok_or_else(|| {
            debug!(path = relative, verb, "rejected path outside sandbox");
            ToolError::OutsideSandbox {
                verb,
                path: relative.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_missing_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = Sandbox::new(&temp.path().join("missing"), SandboxLimits::default())
            .unwrap_err();
        assert!(err.to_string().contains("resolve sandbox root"));
    }

    #[test]
    fn new_rejects_file_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("file.txt");
        fs::write(&file, "x").expect("write");
        let err = Sandbox::new(&file, SandboxLimits::default()).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn root_is_canonical() {
        let temp = tempfile::tempdir().expect("tempdir");
        let nested = temp.path().join("a");
        fs::create_dir(&nested).expect("mkdir");
        let sandbox =
            Sandbox::new(&nested.join("..").join("a"), SandboxLimits::default()).expect("sandbox");
        assert_eq!(
            sandbox.root(),
            fs::canonicalize(&nested).expect("canonical")
        );
    }

    #[test]
    fn resolve_reports_verb_and_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let sandbox = Sandbox::new(temp.path(), SandboxLimits::default()).expect("sandbox");
        let err = sandbox.resolve("../x", "list").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot list \"../x\" as it is outside the permitted working directory"
        );
    }
}
