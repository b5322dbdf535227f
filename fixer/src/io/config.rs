//! Agent configuration stored in `fixer.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::tools::{
    DEFAULT_READ_LIMIT_CHARS, DEFAULT_SCRIPT_OUTPUT_LIMIT_BYTES, DEFAULT_SCRIPT_TIMEOUT,
    SandboxLimits,
};

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_PATH: &str = "fixer.toml";

/// Agent configuration (TOML).
///
/// Missing fields default to the fixed limits the agent was designed around.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FixerConfig {
    pub model: ModelConfig,
    pub sandbox: SandboxConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    /// Provider model identifier.
    pub name: String,
    pub max_output_tokens: u32,
    /// Turn budget for one run.
    pub max_turns: u32,
    pub api_base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-2.0-flash-001".to_string(),
            max_output_tokens: 2048,
            max_turns: 20,
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            request_timeout_secs: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SandboxConfig {
    /// Directory all tool calls are confined to. Relative paths resolve
    /// against the process working directory.
    pub root: PathBuf,
    pub read_limit_chars: usize,
    pub script_timeout_secs: u64,
    /// Per-stream cap on captured script stdout/stderr.
    pub script_output_limit_bytes: usize,
    pub interpreter: PathBuf,
    /// Script extension without the leading dot.
    pub script_extension: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./calculator"),
            read_limit_chars: DEFAULT_READ_LIMIT_CHARS,
            script_timeout_secs: DEFAULT_SCRIPT_TIMEOUT.as_secs(),
            script_output_limit_bytes: DEFAULT_SCRIPT_OUTPUT_LIMIT_BYTES,
            interpreter: PathBuf::from("python3"),
            script_extension: "py".to_string(),
        }
    }
}

impl SandboxConfig {
    pub fn limits(&self) -> SandboxLimits {
        SandboxLimits {
            read_limit_chars: self.read_limit_chars,
            script_timeout: Duration::from_secs(self.script_timeout_secs),
            script_output_limit_bytes: self.script_output_limit_bytes,
            interpreter: self.interpreter.clone(),
            script_extension: self.script_extension.clone(),
        }
    }
}

impl FixerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model.name.trim().is_empty() {
            return Err(anyhow!("model.name must be non-empty"));
        }
        if self.model.max_turns == 0 {
            return Err(anyhow!("model.max_turns must be > 0"));
        }
        if self.model.max_output_tokens == 0 {
            return Err(anyhow!("model.max_output_tokens must be > 0"));
        }
        if self.model.request_timeout_secs == 0 {
            return Err(anyhow!("model.request_timeout_secs must be > 0"));
        }
        if self.model.api_key_env.trim().is_empty() {
            return Err(anyhow!("model.api_key_env must be non-empty"));
        }
        if self.sandbox.read_limit_chars == 0 {
            return Err(anyhow!("sandbox.read_limit_chars must be > 0"));
        }
        if self.sandbox.script_timeout_secs == 0 {
            return Err(anyhow!("sandbox.script_timeout_secs must be > 0"));
        }
        if self.sandbox.script_output_limit_bytes == 0 {
            return Err(anyhow!("sandbox.script_output_limit_bytes must be > 0"));
        }
        if self.sandbox.interpreter.as_os_str().is_empty() {
            return Err(anyhow!("sandbox.interpreter must be non-empty"));
        }
        let ext = &self.sandbox.script_extension;
        if ext.is_empty() || ext.contains('.') {
            return Err(anyhow!(
                "sandbox.script_extension must be non-empty and must not contain '.'"
            ));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `FixerConfig::default()`.
pub fn load_config(path: &Path) -> Result<FixerConfig> {
    if !path.exists() {
        let cfg = FixerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: FixerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
