//! Diagnostic tracing for the agent.
//!
//! Tracing goes to stderr and is controlled by `RUST_LOG`. The user-facing
//! transcript printed by the binary is separate and always goes to stdout.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. With `verbose`, the default
/// becomes `fixer=info` so turn and tool spans show up.
///
/// # Example
/// ```bash
/// RUST_LOG=fixer=debug fixer "the calculator prints 20 for 3 + 7 * 2"
/// ```
pub fn init(verbose: bool) {
    let default = if verbose { "warn,fixer=info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
