//! Model collaborator abstraction.
//!
//! The [`Model`] trait decouples the agent loop from the actual provider
//! (currently the Gemini REST API). Tests use a scripted model that returns
//! predetermined turns without any network access.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::conversation::{Conversation, Part, Role, ToolCall, Turn};
use crate::tools::schema::ToolDeclaration;

/// Everything the model sees for one turn.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub system: &'a str,
    pub tools: &'a [ToolDeclaration],
    pub conversation: &'a Conversation,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub response_tokens: u64,
}

/// One model response: free text and/or tool calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelTurn {
    pub text: Vec<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<Usage>,
}

impl ModelTurn {
    pub fn is_empty(&self) -> bool {
        self.tool_calls.is_empty() && self.text.iter().all(|t| t.trim().is_empty())
    }

    /// Text fragments joined in order, or `None` when there is no text.
    pub fn joined_text(&self) -> Option<String> {
        let joined = self.text.concat();
        (!joined.trim().is_empty()).then_some(joined)
    }

    /// The turn as it is recorded in the conversation.
    pub fn to_turn(&self) -> Turn {
        let parts = self
            .text
            .iter()
            .cloned()
            .map(Part::Text)
            .chain(self.tool_calls.iter().cloned().map(Part::ToolCall))
            .collect();
        Turn {
            role: Role::Model,
            parts,
        }
    }
}

/// Abstraction over language-model backends.
///
/// An `Err` is a transport failure and ends the run.
pub trait Model {
    fn generate(&self, request: &ModelRequest<'_>) -> Result<ModelTurn>;
}
