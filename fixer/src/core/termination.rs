//! Termination policy for the agent loop.
//!
//! A run may stop early only when the model claims success in the current
//! turn and a verification run has happened at some point in the run.

/// Phrases that count as the model claiming the bug is fixed.
pub const SOLVED_KEYWORDS: [&str; 6] = [
    "fixed",
    "resolved",
    "success",
    "solved",
    "completed",
    "corrected",
];

/// Case-insensitive substring scan for [`SOLVED_KEYWORDS`].
///
/// This is a heuristic; swapping it for a structured "done" signal only needs
/// a change here.
pub fn is_solved_claim(text: &str) -> bool {
    let lowered = text.to_lowercase();
    SOLVED_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

/// Sticky verification flag plus per-turn claim evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Termination {
    verification_present: bool,
}

impl Termination {
    /// Record that a verification tool ran. Never resets within a run.
    pub fn record_verification(&mut self) {
        self.verification_present = true;
    }

    pub fn verification_present(&self) -> bool {
        self.verification_present
    }

    /// Decide whether the turn that just finished ends the run.
    pub fn should_stop(&self, claims_solved_this_turn: bool) -> bool {
        claims_solved_this_turn && self.verification_present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_match_case_insensitively() {
        assert!(is_solved_claim("The bug is FIXED now."));
        assert!(is_solved_claim("Successfully updated"));
        assert!(is_solved_claim("I corrected the precedence"));
        assert!(!is_solved_claim("Let me look at calculator.py first."));
    }

    #[test]
    fn keyword_matches_inside_larger_words() {
        assert!(is_solved_claim("unresolved"));
    }

    #[test]
    fn claim_without_verification_does_not_stop() {
        let termination = Termination::default();
        assert!(!termination.should_stop(true));
    }

    #[test]
    fn verification_is_sticky() {
        let mut termination = Termination::default();
        termination.record_verification();
        assert!(!termination.should_stop(false));
        assert!(termination.should_stop(true));
        assert!(termination.verification_present());
    }
}
