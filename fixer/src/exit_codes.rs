//! Stable exit codes for the `fixer` binary.

/// The agent produced a final response.
pub const OK: i32 = 0;
/// Invalid config or sandbox, missing credentials, or a model transport failure.
pub const INVALID: i32 = 1;
/// The turn budget ran out (or the model went silent) without any final text.
pub const EXHAUSTED: i32 = 3;
