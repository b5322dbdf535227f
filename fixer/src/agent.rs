//! Bounded multi-turn agent loop.
//!
//! Each turn sends the whole conversation to the model, executes the
//! requested tool calls in order, and appends everything to the history. The
//! run stops early only when the current turn claims success and a
//! verification run has happened at some point in the run.

use tracing::{debug, info, info_span, warn};

use crate::core::conversation::{Conversation, ToolCall, Turn};
use crate::core::termination::{Termination, is_solved_claim};
use crate::core::types::{ToolName, ToolResponse};
use crate::dispatch::ToolDispatcher;
use crate::io::model::{Model, ModelRequest, Usage};
use crate::tools::schema::{ToolDeclaration, declarations};

/// Turn budget used when none is configured.
pub const DEFAULT_MAX_TURNS: u32 = 20;

/// Fixed inputs of one run.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub system_prompt: String,
    pub max_turns: u32,
}

/// Why a run ended without a verified success claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustReason {
    /// Every turn of the budget was used.
    BudgetSpent,
    /// The model returned neither text nor tool calls.
    EmptyTurn,
}

/// Loop state. Only the last three variants are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentState {
    /// About to run the given 1-based turn.
    Running(u32),
    /// Verified success claim; carries the claiming turn's text.
    Done(String),
    Exhausted(ExhaustReason),
    /// The model could not be reached. Carries the transport error.
    Fatal(String),
}

/// Progress notifications for callers that want to render the run.
#[derive(Debug)]
pub enum AgentEvent<'a> {
    TurnStarted { turn: u32, max_turns: u32 },
    ModelText(&'a str),
    ToolCalled(&'a ToolCall),
    ToolFinished {
        call: &'a ToolCall,
        response: &'a ToolResponse,
    },
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// Terminal state (never `Running`).
    pub state: AgentState,
    pub turns_taken: u32,
    /// Most recent model text, if any turn produced one.
    pub final_text: Option<String>,
    pub verification_present: bool,
    /// Usage reported for the last model call.
    pub last_usage: Option<Usage>,
    pub conversation: Conversation,
}

/// Drive the conversation for `prompt` until it terminates.
///
/// Tool failures never end the run; they are fed back to the model as error
/// envelopes. A model error moves straight to [`AgentState::Fatal`].
pub fn run_agent<M: Model, F: FnMut(&AgentEvent<'_>)>(
    model: &M,
    dispatcher: &ToolDispatcher,
    settings: &AgentSettings,
    prompt: &str,
    on_event: F,
) -> AgentOutcome {
    let mut run = Run {
        model,
        dispatcher,
        settings,
        tools: declarations(dispatcher.sandbox().limits()),
        conversation: Conversation::seeded(prompt),
        termination: Termination::default(),
        final_text: None,
        last_usage: None,
        turns_taken: 0,
        on_event,
    };

    let mut state = AgentState::Running(1);
    while let AgentState::Running(turn) = state {
        state = if turn > settings.max_turns {
            AgentState::Exhausted(ExhaustReason::BudgetSpent)
        } else {
            run.step(turn)
        };
    }

    match &state {
        AgentState::Done(_) => info!(turns = run.turns_taken, "agent finished"),
        AgentState::Exhausted(reason) => {
            warn!(turns = run.turns_taken, ?reason, "agent stopped without a verified fix");
        }
        AgentState::Fatal(err) => warn!(turns = run.turns_taken, err, "agent aborted"),
        AgentState::Running(_) => {}
    }

    AgentOutcome {
        state,
        turns_taken: run.turns_taken,
        final_text: run.final_text,
        verification_present: run.termination.verification_present(),
        last_usage: run.last_usage,
        conversation: run.conversation,
    }
}

struct Run<'a, M, F> {
    model: &'a M,
    dispatcher: &'a ToolDispatcher,
    settings: &'a AgentSettings,
    tools: Vec<ToolDeclaration>,
    conversation: Conversation,
    termination: Termination,
    final_text: Option<String>,
    last_usage: Option<Usage>,
    turns_taken: u32,
    on_event: F,
}

impl<M: Model, F: FnMut(&AgentEvent<'_>)> Run<'_, M, F> {
    fn step(&mut self, turn: u32) -> AgentState {
        let span = info_span!("turn", turn);
        let _enter = span.enter();
        (self.on_event)(&AgentEvent::TurnStarted {
            turn,
            max_turns: self.settings.max_turns,
        });
        self.turns_taken = turn;

        let request = ModelRequest {
            system: &self.settings.system_prompt,
            tools: &self.tools,
            conversation: &self.conversation,
        };
        let response = match self.model.generate(&request) {
            Ok(response) => response,
            Err(err) => return AgentState::Fatal(format!("{err:#}")),
        };
        if response.usage.is_some() {
            self.last_usage = response.usage;
        }
        self.conversation.push(response.to_turn());

        if response.is_empty() {
            debug!("model returned no text and no tool calls");
            return AgentState::Exhausted(ExhaustReason::EmptyTurn);
        }

        let mut claim = None;
        if let Some(text) = response.joined_text() {
            (self.on_event)(&AgentEvent::ModelText(&text));
            if is_solved_claim(&text) {
                claim = Some(text.clone());
            }
            self.final_text = Some(text);
        }

        for call in &response.tool_calls {
            (self.on_event)(&AgentEvent::ToolCalled(call));
            let tool_response = self.dispatcher.dispatch(call);
            if ToolName::parse(&call.name).is_some_and(ToolName::is_verification) {
                self.termination.record_verification();
            }
            (self.on_event)(&AgentEvent::ToolFinished {
                call,
                response: &tool_response,
            });
            self.conversation
                .push(Turn::tool(call.name.clone(), tool_response));
        }

        debug!(
            claims_solved = claim.is_some(),
            verified = self.termination.verification_present(),
            "turn complete"
        );
        match claim {
            Some(text) if self.termination.should_stop(true) => AgentState::Done(text),
            _ => AgentState::Running(turn + 1),
        }
    }
}
