use std::io::ErrorKind as IoErrorKind;
use std::process::Command;

use tracing::{info, instrument, warn};

use super::Sandbox;
use crate::core::types::{ToolError, ToolResult};
use crate::io::process::{CommandOutput, run_command_with_timeout};

impl Sandbox {
    /// Run a script with the configured interpreter, rooted at the sandbox.
    ///
    /// `args` are passed as discrete arguments; no shell is involved. Fails
    /// without spawning anything when the file is missing or does not carry
    /// the configured extension.
    #[instrument(skip(self))]
    pub fn run_script(&self, file_path: &str, args: &[String]) -> ToolResult {
        let target = self.resolve(file_path, "execute")?;
        if !target.is_file() {
            return Err(ToolError::NotFound(format!("File \"{file_path}\" not found.")));
        }
        let extension = &self.limits.script_extension;
        if !has_extension(file_path, extension) {
            return Err(ToolError::NotFound(format!(
                "\"{file_path}\" is not a {extension} script."
            )));
        }

        let mut cmd = Command::new(&self.limits.interpreter);
        cmd.arg(&target).args(args).current_dir(&self.root);

        info!(interpreter = %self.limits.interpreter.display(), "running script");
        let output = run_command_with_timeout(
            cmd,
            self.limits.script_timeout,
            self.limits.script_output_limit_bytes,
        )
        .map_err(|err| {
            let not_found = err
                .chain()
                .filter_map(|cause| cause.downcast_ref::<std::io::Error>())
                .any(|io_err| io_err.kind() == IoErrorKind::NotFound);
            if not_found {
                ToolError::Os(format!("Interpreter or file \"{file_path}\" not found."))
            } else {
                ToolError::Os(format!("executing script: {err:#}"))
            }
        })?;

        if output.timed_out {
            warn!("script timed out");
            return Err(ToolError::TimedOut {
                path: file_path.to_string(),
                secs: self.limits.script_timeout.as_secs(),
            });
        }

        Ok(render_report(&output))
    }
}

/// Case-insensitive suffix check against `.{extension}`.
fn has_extension(file_path: &str, extension: &str) -> bool {
    file_path
        .to_lowercase()
        .ends_with(&format!(".{}", extension.to_lowercase()))
}

fn render_report(output: &CommandOutput) -> String {
    let mut lines = Vec::new();
    if !output.stdout.is_empty() || output.stdout_truncated > 0 {
        lines.push("STDOUT:".to_string());
        lines.push(output.stdout_text().trim().to_string());
        if output.stdout_truncated > 0 {
            lines.push(format!("[stdout truncated {} bytes]", output.stdout_truncated));
        }
    }
    if !output.stderr.is_empty() || output.stderr_truncated > 0 {
        lines.push("STDERR:".to_string());
        lines.push(output.stderr_text().trim().to_string());
        if output.stderr_truncated > 0 {
            lines.push(format!("[stderr truncated {} bytes]", output.stderr_truncated));
        }
    }
    match output.status.code() {
        Some(0) => {}
        Some(code) => lines.push(format!("Process exited with code {code}")),
        None => lines.push("Process terminated by signal".to_string()),
    }

    if lines.is_empty() {
        return "No output produced.".to_string();
    }
    lines.join("\n")
}
