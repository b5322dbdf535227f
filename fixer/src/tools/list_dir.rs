use std::fs;

use tracing::{debug, instrument};

use super::Sandbox;
use crate::core::types::{ToolError, ToolResult};

impl Sandbox {
    /// List direct children of `directory`, sorted by name.
    ///
    /// Each entry renders as `- name: file_size=N bytes, is_dir=BOOL`. A size
    /// that cannot be read degrades to 0 instead of failing the listing.
    #[instrument(skip(self))]
    pub fn list_dir(&self, directory: &str) -> ToolResult {
        let target = self.resolve(directory, "list")?;
        if !target.is_dir() {
            return Err(ToolError::NotFound(format!(
                "\"{directory}\" is not a directory"
            )));
        }

        let entries = fs::read_dir(&target)
            .map_err(|e| ToolError::Os(format!("An OS error occurred: {e}")))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ToolError::Os(format!("An OS error occurred: {e}")))?;
            names.push(entry.file_name());
        }
        names.sort();

        let lines: Vec<String> = names
            .iter()
            .map(|name| {
                let path = target.join(name);
                let is_dir = path.is_dir();
                let size = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
                format!(
                    "- {}: file_size={size} bytes, is_dir={is_dir}",
                    name.to_string_lossy()
                )
            })
            .collect();

        debug!(entries = lines.len(), "listed directory");
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use crate::core::types::{ErrorKind, ToolError};
    use crate::test_support::TestSandbox;

    #[test]
    fn lists_sorted_entries_with_metadata() {
        let sandbox = TestSandbox::new();
        sandbox.write("main.py", "print('hi')\n");
        sandbox.write("pkg/calculator.py", "");
        sandbox.write("B.txt", "12");

        let listing = sandbox.tools().list_dir(".").expect("list");
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "- B.txt: file_size=2 bytes, is_dir=false");
        assert_eq!(lines[1], "- main.py: file_size=12 bytes, is_dir=false");
        assert!(lines[2].starts_with("- pkg: file_size="));
        assert!(lines[2].ends_with("is_dir=true"));
    }

    #[test]
    fn is_not_recursive() {
        let sandbox = TestSandbox::new();
        sandbox.write("pkg/inner/deep.py", "");
        let listing = sandbox.tools().list_dir("pkg").expect("list");
        assert!(listing.starts_with("- inner:"));
        assert!(!listing.contains("deep.py"));
    }

    #[test]
    fn empty_directory_lists_nothing() {
        let sandbox = TestSandbox::new();
        assert_eq!(sandbox.tools().list_dir("").expect("list"), "");
    }

    #[test]
    fn rejects_file_target() {
        let sandbox = TestSandbox::new();
        sandbox.write("main.py", "");
        let err = sandbox.tools().list_dir("main.py").unwrap_err();
        assert_eq!(err, ToolError::NotFound("\"main.py\" is not a directory".to_string()));
    }

    #[test]
    fn rejects_escape() {
        let sandbox = TestSandbox::new();
        let err = sandbox.tools().list_dir("../").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Containment);
        assert!(err.to_string().starts_with("Cannot list \"../\""));
    }
}
