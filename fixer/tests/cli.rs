//! CLI tests for the `fixer` binary.
//!
//! Only startup paths are covered here; they fail before any model call.

use std::fs;
use std::process::Command;

use fixer::exit_codes;

#[test]
fn missing_api_key_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = Command::new(env!("CARGO_BIN_EXE_fixer"))
        .current_dir(temp.path())
        .env_remove("GEMINI_API_KEY")
        .args(["--workdir", ".", "fix the calculator"])
        .output()
        .expect("run fixer");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GEMINI_API_KEY"), "{stderr}");
}

#[test]
fn missing_workdir_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = Command::new(env!("CARGO_BIN_EXE_fixer"))
        .current_dir(temp.path())
        .env("GEMINI_API_KEY", "test-key")
        .args(["--workdir", "does-not-exist", "fix the calculator"])
        .output()
        .expect("run fixer");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("resolve sandbox root"), "{stderr}");
}

#[test]
fn invalid_config_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("fixer.toml"), "[model]\nmax_turns = 0\n").expect("write");

    let status = Command::new(env!("CARGO_BIN_EXE_fixer"))
        .current_dir(temp.path())
        .env("GEMINI_API_KEY", "test-key")
        .args(["--workdir", ".", "fix the calculator"])
        .status()
        .expect("run fixer");

    assert_eq!(status.code(), Some(exit_codes::INVALID));
}

#[test]
fn missing_prompt_is_a_usage_error() {
    let status = Command::new(env!("CARGO_BIN_EXE_fixer"))
        .status()
        .expect("run fixer");

    assert_eq!(status.code(), Some(2));
}
