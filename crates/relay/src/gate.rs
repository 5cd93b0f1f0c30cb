//! Banned-word moderation gate.

/// Outcome of evaluating a message against the banned-word list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Accept,
    /// The message contains this banned word (as configured, original case).
    Reject(String),
}

impl GateDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Check `text` against `banned_words`.
///
/// Matching is a case-insensitive substring test. Words are tried in list
/// order and the first match wins; empty entries never match.
pub fn evaluate(text: &str, banned_words: &[String]) -> GateDecision {
    let haystack = text.to_lowercase();
    banned_words
        .iter()
        .filter(|word| !word.trim().is_empty())
        .find(|word| haystack.contains(&word.to_lowercase()))
        .map_or(GateDecision::Accept, |word| GateDecision::Reject(word.clone()))
}
