//! Romaji transliteration.
//!
//! `TransliterationComposer` keeps resolved kana in `composed` and the latin
//! letters that do not form a complete table key yet in `pending`. After
//! every append or deletion it runs the resolution loop, which either shrinks
//! `pending` or decides to wait for more input.
//!
//! `KanaComposer` exposes it to the core engine as a `Composer`.

use crate::romaji;
use libcompose_core::{ComposeResult, Composer};
use tracing::debug;

const NASAL: char = 'ん';
const GEMINATE: char = 'っ';

/// Buffer state after a step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransliterationResult {
    /// Resolved kana
    pub composing: String,
    /// Unresolved latin letters
    pub pending: String,
}

#[derive(Debug, Clone, Default)]
pub struct TransliterationComposer {
    composed: String,
    pending: String,
}

impl TransliterationComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn composed(&self) -> &str {
        &self.composed
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn input(&mut self, ch: char) -> TransliterationResult {
        self.pending.push(ch);
        self.resolve(false);
        self.result()
    }

    /// Remove the last pending letter, or the last kana when nothing is
    /// pending. `None` when the buffer was already empty.
    pub fn delete_backward(&mut self) -> Option<TransliterationResult> {
        if self.pending.pop().is_none() {
            self.composed.pop()?;
        }
        self.resolve(false);
        Some(self.result())
    }

    /// Resolve everything without waiting and return the kana.
    pub fn flush(&mut self) -> String {
        self.resolve(true);
        std::mem::take(&mut self.composed)
    }

    /// Kana plus pending letters, as shown in the pre-edit.
    pub fn display_text(&self) -> String {
        let mut text = self.composed.clone();
        text.push_str(&self.pending);
        text
    }

    /// What `flush` would return, without touching the buffer.
    pub fn resolved_text(&self) -> String {
        self.clone().flush()
    }

    pub fn is_composing(&self) -> bool {
        !self.composed.is_empty() || !self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.composed.clear();
        self.pending.clear();
    }

    /// Replace the buffer with already resolved text.
    pub fn restore(&mut self, text: &str) {
        self.composed = text.to_string();
        self.pending.clear();
    }

    fn result(&self) -> TransliterationResult {
        TransliterationResult {
            composing: self.composed.clone(),
            pending: self.pending.clone(),
        }
    }

    fn emit(&mut self, kana: &str, consumed: usize) {
        self.composed.push_str(kana);
        self.pending.drain(..consumed);
    }

    fn emit_char(&mut self, ch: char, consumed: usize) {
        self.composed.push(ch);
        self.pending.drain(..consumed);
    }

    /// Longest table key that prefixes `pending`, with its byte length.
    fn longest_key_prefix(&self) -> Option<(&'static str, usize)> {
        let mut ends: Vec<usize> = self.pending.char_indices().map(|(i, _)| i).skip(1).collect();
        ends.push(self.pending.len());
        ends.into_iter()
            .rev()
            .find_map(|end| romaji::lookup(&self.pending[..end]).map(|kana| (kana, end)))
    }

    fn resolve(&mut self, finishing: bool) {
        loop {
            if self.pending.is_empty() {
                return;
            }
            if finishing && (self.pending == "n" || self.pending == "nn") {
                self.pending.clear();
                self.composed.push(NASAL);
                return;
            }

            if let Some(kana) = romaji::lookup(&self.pending) {
                if finishing || !romaji::is_proper_prefix(&self.pending) {
                    let len = self.pending.len();
                    self.emit(kana, len);
                    continue;
                }
            }

            let mut letters = self.pending.chars();
            let first = letters.next().unwrap_or_default();
            let second = letters.next();
            let third = letters.next();

            if let Some(second) = second {
                if first == second && romaji::is_geminating(first) {
                    self.emit_char(GEMINATE, 1);
                    continue;
                }
                if first == 'n' && second == 'n' {
                    match third {
                        Some(next) => {
                            let drop = if romaji::is_vowel(next) || romaji::is_glide(next) {
                                1
                            } else {
                                2
                            };
                            self.emit_char(NASAL, drop);
                            continue;
                        }
                        None => return,
                    }
                }
                if first == 'n' && !romaji::is_vowel(second) && !romaji::is_glide(second) {
                    self.emit_char(NASAL, 1);
                    continue;
                }
            }

            if !finishing && romaji::is_proper_prefix(&self.pending) {
                return;
            }

            if let Some((kana, len)) = self.longest_key_prefix() {
                self.emit(kana, len);
                continue;
            }

            if second.is_some() || finishing {
                debug!(letter = %first, "no romaji match, passing letter through");
                self.emit_char(first, first.len_utf8());
                continue;
            }
            return;
        }
    }
}

/// `Composer` over a `TransliterationComposer`. Nothing is committed by the
/// composer itself; kana stay in the pre-edit until conversion or Enter.
#[derive(Debug, Clone, Default)]
pub struct KanaComposer {
    buffer: TransliterationComposer,
}

impl KanaComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &TransliterationComposer {
        &self.buffer
    }
}

impl Composer for KanaComposer {
    fn name(&self) -> &'static str {
        "kana"
    }

    fn accepts(&self, ch: char) -> bool {
        romaji::is_romaji_char(ch)
    }

    fn input(&mut self, ch: char) -> ComposeResult {
        self.buffer.input(ch);
        ComposeResult::composing(self.buffer.display_text())
    }

    fn delete_backward(&mut self) -> Option<ComposeResult> {
        self.buffer.delete_backward()?;
        Some(ComposeResult::composing(self.buffer.display_text()))
    }

    fn flush(&mut self) -> String {
        self.buffer.flush()
    }

    fn composing_text(&self) -> String {
        self.buffer.display_text()
    }

    fn is_composing(&self) -> bool {
        self.buffer.is_composing()
    }

    fn clear(&mut self) {
        self.buffer.clear();
    }

    fn conversion_source(&self) -> String {
        self.buffer.resolved_text()
    }

    fn restore(&mut self, text: &str) {
        self.buffer.restore(text);
    }
}
