//! Side-effecting adapters: processes, configuration and the model provider.

pub mod config;
pub mod gemini;
pub mod model;
pub mod process;
pub mod prompt;
