//! Command-line entry point for the bug-fixing agent.
//!
//! Takes a bug report as its single argument, lets the model work inside the
//! configured sandbox directory, and prints the final response.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use fixer::agent::{AgentEvent, AgentOutcome, AgentSettings, AgentState, ExhaustReason, run_agent};
use fixer::core::types::ToolResponse;
use fixer::dispatch::ToolDispatcher;
use fixer::exit_codes;
use fixer::io::config::{DEFAULT_CONFIG_PATH, load_config};
use fixer::io::gemini::GeminiModel;
use fixer::io::prompt::render_system_prompt;
use fixer::logging;
use fixer::tools::Sandbox;

/// Turns dumped in verbose mode when the run produced no final text.
const TAIL_TURNS: usize = 5;

#[derive(Debug, Parser)]
#[command(
    name = "fixer",
    version,
    about = "Sandboxed AI agent that debugs and fixes code in one directory"
)]
struct Cli {
    /// Bug report: what you ran, what you expected, what you got.
    prompt: String,
    /// Print turns, tool arguments, tool results and token usage.
    #[arg(long)]
    verbose: bool,
    /// Config file (TOML). Defaults apply when it does not exist.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Sandbox directory; overrides `sandbox.root` from the config.
    #[arg(long)]
    workdir: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let config = load_config(&cli.config)?;
    let root = cli.workdir.as_ref().unwrap_or(&config.sandbox.root);
    let sandbox = Sandbox::new(root, config.sandbox.limits())?;

    let key_var = &config.model.api_key_env;
    let api_key = std::env::var(key_var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .with_context(|| format!("{key_var} environment variable is not set"))?;
    let model = GeminiModel::new(&config.model, api_key)?;

    let settings = AgentSettings {
        system_prompt: render_system_prompt(sandbox.limits())?,
        max_turns: config.model.max_turns,
    };
    let dispatcher = ToolDispatcher::new(sandbox);

    if cli.verbose {
        println!("User prompt: {}", cli.prompt);
    }
    let outcome = run_agent(&model, &dispatcher, &settings, &cli.prompt, |event| {
        print_event(event, cli.verbose);
    });
    report(&outcome, cli.verbose)
}

fn print_event(event: &AgentEvent<'_>, verbose: bool) {
    match event {
        AgentEvent::TurnStarted { turn, max_turns } if verbose => {
            println!("\n--- Agent Turn {turn}/{max_turns} ---");
        }
        AgentEvent::ModelText(text) if verbose => println!("{text}"),
        AgentEvent::ToolCalled(call) => {
            if verbose {
                println!("Calling function: {}({})", call.name, call.args);
            } else {
                println!("{}", call.name);
            }
        }
        AgentEvent::ToolFinished { response, .. } if verbose => match response {
            ToolResponse::Result(text) => println!("-> {text}"),
            ToolResponse::Error(text) => {
                let text = text.strip_prefix("Error: ").unwrap_or(text.as_str());
                println!("-> ERROR: {text}");
            }
        },
        _ => {}
    }
}

/// Print the run summary and pick the exit code.
fn report(outcome: &AgentOutcome, verbose: bool) -> Result<i32> {
    if let AgentState::Fatal(err) = &outcome.state {
        bail!("An error occurred during agent execution: {err}");
    }
    if verbose && outcome.state == AgentState::Exhausted(ExhaustReason::EmptyTurn) {
        println!("Model returned no text and no function calls. Ending loop.");
    }

    println!("\nFinal response:");
    let code = match &outcome.final_text {
        Some(text) => {
            println!("{text}");
            exit_codes::OK
        }
        None => {
            println!(
                "Agent did not produce a final text response within the iteration limit, or encountered an issue."
            );
            if verbose {
                println!("Last few turns of the conversation:");
                for turn in outcome.conversation.tail(TAIL_TURNS) {
                    let rendered = serde_json::to_string(turn).context("serialize turn")?;
                    println!("{rendered}");
                }
            }
            exit_codes::EXHAUSTED
        }
    };

    if verbose {
        match outcome.last_usage {
            Some(usage) => {
                println!("\nPrompt tokens (last turn): {}", usage.prompt_tokens);
                println!("Response tokens (last turn): {}", usage.response_tokens);
            }
            None => println!("\nUsage metadata not available for the final turn."),
        }
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prompt_and_flags() {
        let cli = Cli::try_parse_from([
            "fixer",
            "3 + 7 * 2 prints 20",
            "--verbose",
            "--workdir",
            "calc",
        ])
        .expect("parse");
        assert_eq!(cli.prompt, "3 + 7 * 2 prints 20");
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(cli.workdir, Some(PathBuf::from("calc")));
    }

    #[test]
    fn prompt_is_required() {
        assert!(Cli::try_parse_from(["fixer", "--verbose"]).is_err());
    }
}
