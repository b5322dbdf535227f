use std::fs::File;
use std::io::{self, ErrorKind as IoErrorKind, Read};

use tracing::{debug, instrument};

use super::Sandbox;
use crate::core::types::{ToolError, ToolResult};

/// Worst-case UTF-8 width of one character.
const MAX_CHAR_BYTES: usize = 4;

impl Sandbox {
    /// Read a UTF-8 file, keeping at most `read_limit_chars` characters.
    ///
    /// Only a bounded prefix is read from disk. Longer files are cut at the
    /// limit and a marker naming the file and the limit is appended; bytes
    /// past the cut are never decoded.
    #[instrument(skip(self))]
    pub fn read_file(&self, file_path: &str) -> ToolResult {
        let target = self.resolve(file_path, "read")?;
        if !target.is_file() {
            return Err(not_a_file(file_path));
        }

        let limit = self.limits.read_limit_chars;
        let byte_budget = limit.saturating_add(1).saturating_mul(MAX_CHAR_BYTES);
        let mut bytes = Vec::new();
        File::open(&target)
            .and_then(|file| {
                file.take(u64::try_from(byte_budget).unwrap_or(u64::MAX))
                    .read_to_end(&mut bytes)
            })
            .map_err(|e| read_error(file_path, &e))?;

        let text = decode_prefix(&bytes, limit).map_err(|e| {
            ToolError::Os(format!(
                "An unexpected error occurred while reading \"{file_path}\": {e}"
            ))
        })?;

        match text.char_indices().nth(limit) {
            Some((cut, _)) => {
                debug!(limit, "truncating file content");
                let mut kept = text[..cut].to_string();
                kept.push_str(&format!(
                    "[...File \"{file_path}\" truncated at {limit} characters]"
                ));
                Ok(kept)
            }
            None => Ok(text.to_string()),
        }
    }
}

/// Decode the bounded prefix.
///
/// Invalid UTF-8 is tolerated only once more than `limit` valid characters
/// precede it, since everything from there on is cut anyway.
fn decode_prefix(bytes: &[u8], limit: usize) -> Result<&str, std::str::Utf8Error> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let valid = &bytes[..err.valid_up_to()];
            // `valid` is well-formed by construction.
            let text = std::str::from_utf8(valid)?;
            if text.chars().nth(limit).is_some() {
                Ok(text)
            } else {
                Err(err)
            }
        }
    }
}

fn read_error(file_path: &str, e: &io::Error) -> ToolError {
    match e.kind() {
        IoErrorKind::NotFound | IoErrorKind::IsADirectory => not_a_file(file_path),
        IoErrorKind::PermissionDenied => {
            ToolError::Os(format!("Permission denied to read file: \"{file_path}\""))
        }
        _ => ToolError::Os(format!(
            "An unexpected error occurred while reading \"{file_path}\": {e}"
        )),
    }
}

fn not_a_file(file_path: &str) -> ToolError {
    ToolError::NotFound(format!(
        "File not found or is not a regular file: \"{file_path}\""
    ))
}

#[cfg(test)]
mod tests {
    use crate::core::types::{ErrorKind, ToolError};
    use crate::test_support::TestSandbox;

    #[test]
    fn returns_small_file_verbatim() {
        let sandbox = TestSandbox::new();
        sandbox.write("pkg/calculator.py", "def add(a, b):\n    return a + b\n");
        assert_eq!(
            sandbox.tools().read_file("pkg/calculator.py").expect("read"),
            "def add(a, b):\n    return a + b\n"
        );
    }

    #[test]
    fn exactly_at_limit_is_not_truncated() {
        let sandbox = TestSandbox::new();
        let body = "x".repeat(10_000);
        sandbox.write("big.txt", &body);
        assert_eq!(sandbox.tools().read_file("big.txt").expect("read"), body);
    }

    #[test]
    fn one_past_limit_is_truncated_with_marker() {
        let sandbox = TestSandbox::new();
        sandbox.write("big.txt", &"x".repeat(10_001));
        let content = sandbox.tools().read_file("big.txt").expect("read");
        let marker = "[...File \"big.txt\" truncated at 10000 characters]";
        assert!(content.ends_with(marker));
        assert_eq!(content.len() - marker.len(), 10_000);
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let sandbox = TestSandbox::new();
        sandbox.write("wide.txt", &"é".repeat(10_000));
        let content = sandbox.tools().read_file("wide.txt").expect("read");
        assert_eq!(content.chars().count(), 10_000);
    }

    #[test]
    fn repeated_reads_are_identical() {
        let sandbox = TestSandbox::new();
        sandbox.write("big.txt", &"ab".repeat(6_000));
        let first = sandbox.tools().read_file("big.txt").expect("read");
        let second = sandbox.tools().read_file("big.txt").expect("read");
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_directory_and_missing_file() {
        let sandbox = TestSandbox::new();
        sandbox.write("pkg/a.py", "");
        let dir_err = sandbox.tools().read_file("pkg").unwrap_err();
        assert_eq!(
            dir_err,
            ToolError::NotFound("File not found or is not a regular file: \"pkg\"".to_string())
        );
        let missing = sandbox.tools().read_file("nope.py").unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn rejects_invalid_utf8() {
        let sandbox = TestSandbox::new();
        std::fs::write(sandbox.path().join("blob.bin"), [0xff, 0xfe, 0x00]).expect("write");
        let err = sandbox.tools().read_file("blob.bin").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OsFailure);
        assert!(
            err.to_string()
                .starts_with("An unexpected error occurred while reading \"blob.bin\"")
        );
    }

    #[test]
    fn invalid_byte_past_the_limit_is_cut_off() {
        let sandbox = TestSandbox::new();
        let mut blob = b"x".repeat(200_000);
        blob.push(0xff);
        std::fs::write(sandbox.path().join("log.txt"), blob).expect("write");
        let content = sandbox.tools().read_file("log.txt").expect("read");
        assert_eq!(
            content,
            format!(
                "{}[...File \"log.txt\" truncated at 10000 characters]",
                "x".repeat(10_000)
            )
        );
    }

    #[test]
    fn multibyte_character_split_at_the_read_bound() {
        let sandbox = TestSandbox::new();
        // 3-byte characters never line up with the 4-byte-per-char budget.
        sandbox.write("wide.txt", &"€".repeat(20_000));
        let content = sandbox.tools().read_file("wide.txt").expect("read");
        let marker = "[...File \"wide.txt\" truncated at 10000 characters]";
        assert!(content.ends_with(marker));
        assert_eq!(content.chars().count() - marker.chars().count(), 10_000);
    }

    #[test]
    fn invalid_byte_inside_the_limit_is_an_error() {
        let sandbox = TestSandbox::new();
        let mut blob = b"x".repeat(50);
        blob.push(0xff);
        blob.extend(b"x".repeat(20_000));
        std::fs::write(sandbox.path().join("mixed.txt"), blob).expect("write");
        let err = sandbox.tools().read_file("mixed.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OsFailure);
    }

    #[test]
    fn rejects_escape() {
        let sandbox = TestSandbox::new();
        let err = sandbox.tools().read_file("../../etc/passwd").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Containment);
    }
}
