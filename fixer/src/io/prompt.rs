//! System instruction rendering.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::types::ToolName;
use crate::tools::SandboxLimits;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

#[derive(Debug, Serialize)]
struct ToolNames {
    list: &'static str,
    read: &'static str,
    write: &'static str,
    run: &'static str,
}

/// Render the fixed system instruction for a sandbox configured with `limits`.
pub fn render_system_prompt(limits: &SandboxLimits) -> Result<String> {
    let env = Environment::new();
    let template = env
        .template_from_str(SYSTEM_TEMPLATE)
        .context("parse system prompt template")?;
    let rendered = template
        .render(context! {
            tools => ToolNames {
                list: ToolName::ListDir.as_str(),
                read: ToolName::ReadFile.as_str(),
                write: ToolName::WriteFile.as_str(),
                run: ToolName::RunScript.as_str(),
            },
            interpreter => limits.interpreter.display().to_string(),
            script_extension => limits.script_extension.as_str(),
        })
        .context("render system prompt")?;
    Ok(rendered.trim().to_string())
}
