//! Transcript accumulation for continuous dictation.

use crate::engine::ResultBatch;

/// Accumulated dictation text.
///
/// `finalized` is append-only: each confirmed fragment is appended with a
/// single trailing space separator and never mutated afterwards. `interim`
/// is the engine's current best-guess tail, replaced wholesale on every
/// result batch and dropped when a session is discarded. The displayed text
/// is always `(finalized + interim).trim()` — trimming happens only at the
/// display join, so separator whitespace inside `finalized` is preserved
/// exactly as accumulated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    finalized: String,
    interim: String,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a confirmed fragment with its trailing separator.
    pub fn push_final(&mut self, fragment: &str) {
        self.finalized.push_str(fragment);
        self.finalized.push(' ');
    }

    /// Replace the interim tail wholesale.
    pub fn set_interim(&mut self, interim: &str) {
        self.interim.clear();
        self.interim.push_str(interim);
    }

    /// Drop unconfirmed text. Called when the session that produced it is
    /// discarded.
    pub fn clear_interim(&mut self) {
        self.interim.clear();
    }

    /// Merge a result batch: finalized entries are appended in order, the
    /// interim tail is rebuilt from the batch's non-final entries.
    pub fn apply(&mut self, batch: &ResultBatch) {
        let mut interim = String::new();
        for entry in &batch.entries {
            if entry.is_final {
                self.push_final(&entry.transcript);
            } else {
                interim.push_str(&entry.transcript);
            }
        }
        self.interim = interim;
    }

    /// The text to display: finalized plus interim, trimmed at the edges.
    pub fn merged(&self) -> String {
        let mut text = String::with_capacity(self.finalized.len() + self.interim.len());
        text.push_str(&self.finalized);
        text.push_str(&self.interim);
        text.trim().to_string()
    }

    /// Whether any speech has been confirmed.
    pub fn has_finalized(&self) -> bool {
        !self.finalized.trim().is_empty()
    }

    pub fn finalized(&self) -> &str {
        &self.finalized
    }

    pub fn interim(&self) -> &str {
        &self.interim
    }
}
