//! Syllable automaton.
//!
//! Assembles phonetic components into one precomposed syllable at a time.
//! Whenever the next component cannot join the current syllable, the
//! syllable is committed and composition restarts, so `input` never fails.
//!
//! The one subtle transition is a vowel arriving after a coda: the coda (for
//! a compound coda, only its second part) moves over and becomes the onset of
//! the next syllable.

use crate::jamo;
use tracing::debug;

/// One keystroke's worth of Hangul: a consonant (onset index) or a vowel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhoneticComponent {
    Onset(usize),
    Vowel(usize),
}

/// Position of the automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomatonState {
    Empty,
    Onset,
    OnsetVowel,
    OnsetVowelCompound,
    OnsetVowelCoda,
    /// Coda present and either the vowel or the coda is a compound
    OnsetVowelCompoundCoda,
}

/// Result of one `input` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AutomatonResult {
    pub committed: String,
    pub composing: String,
}

/// Syllable being composed. First parts are kept only while the matching
/// compound is active, so backspace can revert to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyllableState {
    pub onset: Option<usize>,
    pub vowel: Option<usize>,
    pub coda: Option<usize>,
    pub vowel_first_part: Option<usize>,
    pub coda_first_part: Option<usize>,
}

impl SyllableState {
    fn with_onset(onset: usize) -> Self {
        Self {
            onset: Some(onset),
            ..Self::default()
        }
    }

    fn text(&self) -> String {
        match (self.onset, self.vowel) {
            (Some(onset), Some(vowel)) => jamo::compose(onset, vowel, self.coda.unwrap_or(0))
                .map(String::from)
                .unwrap_or_default(),
            (Some(onset), None) => jamo::compat_onset(onset).map(String::from).unwrap_or_default(),
            (None, Some(vowel)) => jamo::compat_vowel(vowel).map(String::from).unwrap_or_default(),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyllableAutomaton {
    syllable: SyllableState,
}

impl SyllableAutomaton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn syllable(&self) -> &SyllableState {
        &self.syllable
    }

    pub fn state(&self) -> AutomatonState {
        let s = &self.syllable;
        let compound = s.vowel_first_part.is_some() || s.coda_first_part.is_some();
        match (s.onset, s.vowel, s.coda) {
            (None, _, _) => AutomatonState::Empty,
            (Some(_), None, _) => AutomatonState::Onset,
            (Some(_), Some(_), None) if s.vowel_first_part.is_some() => {
                AutomatonState::OnsetVowelCompound
            }
            (Some(_), Some(_), None) => AutomatonState::OnsetVowel,
            (Some(_), Some(_), Some(_)) if compound => AutomatonState::OnsetVowelCompoundCoda,
            (Some(_), Some(_), Some(_)) => AutomatonState::OnsetVowelCoda,
        }
    }

    pub fn is_composing(&self) -> bool {
        self.syllable.onset.is_some()
    }

    pub fn composing_text(&self) -> String {
        self.syllable.text()
    }

    /// Commit the current syllable and continue with `next`.
    fn commit_and_restart(&mut self, next: SyllableState) -> String {
        let committed = self.syllable.text();
        self.syllable = next;
        committed
    }

    fn result(&self, committed: String) -> AutomatonResult {
        AutomatonResult {
            committed,
            composing: self.composing_text(),
        }
    }

    pub fn input(&mut self, component: PhoneticComponent) -> AutomatonResult {
        let committed = match component {
            PhoneticComponent::Onset(onset) => self.input_consonant(onset),
            PhoneticComponent::Vowel(vowel) => self.input_vowel(vowel),
        };
        self.result(committed)
    }

    fn input_consonant(&mut self, onset: usize) -> String {
        let s = self.syllable;
        if s.vowel.is_none() {
            // bare onset, or nothing at all
            return self.commit_and_restart(SyllableState::with_onset(onset));
        }
        let Some(as_coda) = jamo::onset_to_coda(onset) else {
            return self.commit_and_restart(SyllableState::with_onset(onset));
        };
        match (s.coda, s.coda_first_part) {
            (None, _) => {
                self.syllable.coda = Some(as_coda);
                String::new()
            }
            (Some(coda), None) => match jamo::combine_coda(coda, as_coda) {
                Some(compound) => {
                    self.syllable.coda_first_part = Some(coda);
                    self.syllable.coda = Some(compound);
                    String::new()
                }
                None => self.commit_and_restart(SyllableState::with_onset(onset)),
            },
            (Some(_), Some(_)) => self.commit_and_restart(SyllableState::with_onset(onset)),
        }
    }

    fn input_vowel(&mut self, vowel: usize) -> String {
        let s = self.syllable;
        if s.onset.is_none() {
            // nothing to attach to
            return jamo::compat_vowel(vowel).map(String::from).unwrap_or_default();
        }
        let Some(current) = s.vowel else {
            self.syllable.vowel = Some(vowel);
            return String::new();
        };

        if let Some(coda) = s.coda {
            return self.move_coda_to_onset(coda, vowel);
        }

        if s.vowel_first_part.is_none() {
            if let Some(compound) = jamo::combine_vowel(current, vowel) {
                self.syllable.vowel_first_part = Some(current);
                self.syllable.vowel = Some(compound);
                return String::new();
            }
        }
        let mut committed = self.commit_and_restart(SyllableState::default());
        committed.extend(jamo::compat_vowel(vowel));
        committed
    }

    /// A vowel after a coda: the coda's (second) consonant opens the next
    /// syllable and the current one commits without it.
    fn move_coda_to_onset(&mut self, coda: usize, next_vowel: usize) -> String {
        let (kept, moved) = match self.syllable.coda_first_part {
            Some(first) => match jamo::split_coda(coda) {
                Some((_, second)) => (first, second),
                None => (0, coda),
            },
            None => (0, coda),
        };
        let Some(next_onset) = jamo::coda_to_onset(moved) else {
            let mut committed = self.commit_and_restart(SyllableState::default());
            committed.extend(jamo::compat_vowel(next_vowel));
            return committed;
        };
        debug!(coda, kept, next_onset, "coda moves to next syllable");
        self.syllable.coda = (kept != 0).then_some(kept);
        self.syllable.coda_first_part = None;
        self.commit_and_restart(SyllableState {
            onset: Some(next_onset),
            vowel: Some(next_vowel),
            ..SyllableState::default()
        })
    }

    /// Remove the last component. Compounds fall back to their first part.
    /// Returns `None` when empty.
    pub fn delete_backward(&mut self) -> Option<String> {
        let s = &mut self.syllable;
        if s.coda.is_some() {
            s.coda = s.coda_first_part.take();
        } else if s.vowel.is_some() {
            s.vowel = s.vowel_first_part.take();
        } else if s.onset.is_some() {
            s.onset = None;
        } else {
            return None;
        }
        Some(self.composing_text())
    }

    /// Return the composing text and reset.
    pub fn flush(&mut self) -> String {
        self.commit_and_restart(SyllableState::default())
    }

    pub fn clear(&mut self) {
        self.syllable = SyllableState::default();
    }

    /// Rebuild the state that displays as `ch`: a precomposed syllable or a
    /// compatibility consonant. Returns false (and changes nothing) for
    /// anything else.
    pub fn restore(&mut self, ch: char) -> bool {
        if let Some(onset) = jamo::onset_of_compat(ch) {
            self.syllable = SyllableState::with_onset(onset);
            return true;
        }
        let Some((onset, vowel, coda)) = jamo::decompose(ch) else {
            return false;
        };
        self.syllable = SyllableState {
            onset: Some(onset),
            vowel: Some(vowel),
            coda: (coda != 0).then_some(coda),
            vowel_first_part: jamo::split_vowel(vowel).map(|(first, _)| first),
            coda_first_part: jamo::split_coda(coda).map(|(first, _)| first),
        };
        true
    }
}
