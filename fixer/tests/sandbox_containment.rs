//! Containment tests across all four tools.
//!
//! Every escaping path must be rejected with a containment error and leave
//! the filesystem outside (and inside) the sandbox untouched.

use std::fs;

use serde_json::json;

use fixer::core::conversation::ToolCall;
use fixer::core::types::{ErrorKind, ToolRequest};
use fixer::test_support::TestSandbox;

const ESCAPES: [&str; 5] = [
    "../outside.sh",
    "../../etc/passwd",
    "/etc/passwd",
    "sub/../../outside.sh",
    "./sub/../..",
];

fn requests_for(path: &str) -> Vec<ToolRequest> {
    vec![
        ToolRequest::ListDir {
            directory: Some(path.to_string()),
        },
        ToolRequest::ReadFile {
            file_path: path.to_string(),
        },
        ToolRequest::WriteFile {
            file_path: path.to_string(),
            content: "touch pwned\n".to_string(),
        },
        ToolRequest::RunScript {
            file_path: path.to_string(),
            args: Vec::new(),
        },
    ]
}

#[test]
fn every_tool_rejects_every_escape() {
    let sandbox = TestSandbox::new();
    for path in ESCAPES {
        for request in requests_for(path) {
            let err = sandbox
                .dispatcher()
                .execute(&request)
                .expect_err(&format!("{} on {path} must fail", request.name()));
            assert_eq!(err.kind(), ErrorKind::Containment, "{request:?}");
            assert!(
                err.to_string()
                    .ends_with("is outside the permitted working directory"),
                "{err}"
            );
        }
    }

    let entries = fs::read_dir(sandbox.path()).expect("read_dir").count();
    assert_eq!(entries, 0, "sandbox must stay empty");
    assert!(!sandbox.path().join("pwned").exists());
}

#[test]
fn escaping_write_does_not_touch_the_target() {
    let sandbox = TestSandbox::new();
    let sibling = sandbox
        .path()
        .parent()
        .expect("temp dir has a parent")
        .join(format!(
            "{}-sibling.txt",
            sandbox.path().file_name().expect("name").to_string_lossy()
        ));

    let relative = format!(
        "../{}",
        sibling.file_name().expect("name").to_string_lossy()
    );
    let response = sandbox.dispatcher().dispatch(&ToolCall {
        name: "write_file".to_string(),
        args: json!({"file_path": relative, "content": "gotcha"}),
    });

    assert!(response.is_error());
    assert!(
        response
            .text()
            .starts_with("Error: Cannot write to \"../")
    );
    assert!(!sibling.exists());
}

#[test]
fn paths_that_stay_inside_are_allowed() {
    let sandbox = TestSandbox::new();
    sandbox.write("pkg/calc.sh", "echo 17\n");

    let listing = sandbox
        .tools()
        .list_dir("pkg/../pkg")
        .expect("list normalized path");
    assert!(listing.contains("- calc.sh:"));

    let content = sandbox
        .tools()
        .read_file("./pkg/../pkg/calc.sh")
        .expect("read normalized path");
    assert_eq!(content, "echo 17\n");

    let report = sandbox
        .tools()
        .run_script("pkg/calc.sh", &[])
        .expect("run");
    assert!(report.contains("17"));
}
