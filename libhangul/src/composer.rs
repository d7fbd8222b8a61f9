//! `Composer` implementation for Hangul.
//!
//! Wraps the syllable automaton with the dubeolsik layout. Text put back
//! after a cancelled conversion is kept in `held`: its last syllable goes
//! back into the automaton so typing and backspace continue from it, the
//! rest is committed with the next keystroke.

use crate::automaton::SyllableAutomaton;
use crate::layout;
use libcompose_core::{ComposeResult, Composer};

#[derive(Debug, Clone, Default)]
pub struct HangulComposer {
    automaton: SyllableAutomaton,
    /// Restored text in front of the automaton's syllable
    held: String,
}

impl HangulComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn automaton(&self) -> &SyllableAutomaton {
        &self.automaton
    }

    fn result(&self, committed: String) -> ComposeResult {
        ComposeResult::new(committed, self.composing_text())
    }
}

impl Composer for HangulComposer {
    fn name(&self) -> &'static str {
        "hangul"
    }

    fn accepts(&self, ch: char) -> bool {
        layout::component_for(ch).is_some()
    }

    fn input(&mut self, ch: char) -> ComposeResult {
        let Some(component) = layout::component_for(ch) else {
            return self.result(String::new());
        };
        let step = self.automaton.input(component);
        let mut committed = std::mem::take(&mut self.held);
        committed.push_str(&step.committed);
        self.result(committed)
    }

    fn delete_backward(&mut self) -> Option<ComposeResult> {
        if self.automaton.delete_backward().is_none() {
            let last = self.held.pop()?;
            // Continue inside the previous syllable when it is Hangul.
            if self.automaton.restore(last) {
                self.automaton.delete_backward();
            }
        }
        Some(self.result(String::new()))
    }

    fn flush(&mut self) -> String {
        let mut text = std::mem::take(&mut self.held);
        text.push_str(&self.automaton.flush());
        text
    }

    fn composing_text(&self) -> String {
        let mut text = self.held.clone();
        text.push_str(&self.automaton.composing_text());
        text
    }

    fn is_composing(&self) -> bool {
        !self.held.is_empty() || self.automaton.is_composing()
    }

    fn clear(&mut self) {
        self.held.clear();
        self.automaton.clear();
    }

    fn restore(&mut self, text: &str) {
        self.clear();
        let mut held = text.to_string();
        if let Some(last) = held.pop() {
            if self.automaton.restore(last) {
                self.held = held;
                return;
            }
        }
        self.held = text.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_keys(c: &mut HangulComposer, keys: &str) -> String {
        keys.chars().map(|ch| c.input(ch).committed).collect()
    }

    #[test]
    fn test_types_syllables() {
        let mut c = HangulComposer::new();
        // 한글
        let committed = type_keys(&mut c, "gksrmf");
        assert_eq!(committed, "한");
        assert_eq!(c.composing_text(), "글");
        assert_eq!(c.flush(), "글");
        assert!(!c.is_composing());
    }

    #[test]
    fn test_non_layout_char_is_rejected() {
        let c = HangulComposer::new();
        assert!(c.accepts('g'));
        assert!(!c.accepts('1'));
        assert!(!c.accepts(' '));
    }

    #[test]
    fn test_restore_continues_last_syllable() {
        let mut c = HangulComposer::new();
        c.restore("한국");
        assert_eq!(c.composing_text(), "한국");

        // ㅇ cannot join 국's coda, so 국 commits along with the held text
        let committed = type_keys(&mut c, "dj");
        assert_eq!(committed, "한국");
        assert_eq!(c.composing_text(), "어");

        c.restore("한국");
        let r = c.delete_backward().unwrap();
        assert_eq!(r.composing, "한구");
    }

    #[test]
    fn test_backspace_walks_into_held_text() {
        let mut c = HangulComposer::new();
        c.restore("가a");
        assert_eq!(c.composing_text(), "가a");
        assert_eq!(c.delete_backward().unwrap().composing, "가");
        assert_eq!(c.delete_backward().unwrap().composing, "ㄱ");
        assert_eq!(c.delete_backward().unwrap().composing, "");
        assert!(c.delete_backward().is_none());
    }
}
