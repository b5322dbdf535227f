//! Autonomous bug-fixing agent confined to a sandbox directory.
//!
//! A language model is given four tools (list, read, write, run) over one
//! fixed directory and driven through a bounded multi-turn loop:
//!
//! - **[`core`]**: Pure logic (path containment, tool types, conversation
//!   history, termination rule). No I/O.
//! - **[`tools`]**: The sandboxed tool implementations.
//! - **[`dispatch`]**: Binds model tool calls to tools and wraps every
//!   outcome in a response envelope.
//! - **[`io`]**: Side-effecting adapters (processes, config, model provider).
//! - **[`agent`]**: The turn loop that ties them together.

pub mod agent;
pub mod core;
pub mod dispatch;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tools;
