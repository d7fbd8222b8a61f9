//! Composer trait implemented by the script crates.
//!
//! A composer is a pure keystroke → text state machine: it never talks to the
//! conversion service and never decides about candidates. The engine feeds it
//! characters that were already decoded from hardware keycodes.

/// Output of one composer step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComposeResult {
    /// Text that left the composer and must be committed now
    pub committed: String,
    /// Text still being composed (shown as pre-edit)
    pub composing: String,
}

impl ComposeResult {
    pub fn new<C: Into<String>, P: Into<String>>(committed: C, composing: P) -> Self {
        ComposeResult {
            committed: committed.into(),
            composing: composing.into(),
        }
    }

    pub fn composing<P: Into<String>>(composing: P) -> Self {
        Self::new(String::new(), composing)
    }
}

pub trait Composer {
    /// Human-readable name (for logging).
    fn name(&self) -> &'static str;

    /// Whether `ch` is composed by this composer. Other characters make the
    /// engine flush and pass the key through.
    fn accepts(&self, ch: char) -> bool;

    fn input(&mut self, ch: char) -> ComposeResult;

    /// Remove the last composed unit. Returns `None` when nothing was
    /// composing so the host can delete a character itself.
    fn delete_backward(&mut self) -> Option<ComposeResult>;

    /// Return and clear everything still composing.
    fn flush(&mut self) -> String;

    fn composing_text(&self) -> String;

    fn is_composing(&self) -> bool;

    fn clear(&mut self);

    /// Text to hand to the conversion service. Defaults to the composing text;
    /// composers holding unresolved input resolve it here without mutating.
    fn conversion_source(&self) -> String {
        self.composing_text()
    }

    /// Put `text` back into the composer after a failed or cancelled
    /// conversion. Afterwards `composing_text()` equals `text`.
    fn restore(&mut self, text: &str);
}
