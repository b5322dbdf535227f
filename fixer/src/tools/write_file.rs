use std::fs;

use tracing::{debug, instrument};

use super::Sandbox;
use crate::core::types::{ToolError, ToolResult};

impl Sandbox {
    /// Overwrite `file_path` with `content`, creating missing parent directories.
    #[instrument(skip(self, content))]
    pub fn write_file(&self, file_path: &str, content: &str) -> ToolResult {
        let target = self.resolve(file_path, "write to")?;
        let os_error = |e: std::io::Error| {
            ToolError::Os(format!(
                "An OS error occurred while writing to \"{file_path}\": {e}"
            ))
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(os_error)?;
        }
        fs::write(&target, content).map_err(os_error)?;

        let written = content.chars().count();
        debug!(path = %target.display(), chars = written, "wrote file");
        Ok(format!(
            "Successfully wrote to \"{file_path}\" ({written} characters written)"
        ))
    }
}
