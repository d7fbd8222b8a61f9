//! IME session management.
//!
//! The `ImeSession` struct holds everything the orchestrator tracks across key
//! events for one script: the orchestration state, who owns the conversion
//! service's session, the pre-edit shown to the host, the candidate list, the
//! active conversion and a window of recently committed text.

use crate::candidate::{Candidate, CandidateList};
use crate::composition::{Composition, Segment};
use crate::context::ImeContext;
use crate::service::PendingConversion;
use crate::utils;

/// Committed text kept around for prediction context (chars).
const HISTORY_LIMIT: usize = 64;

/// Orchestration state of one script engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestrationState {
    /// Keys go to the composer
    #[default]
    Composing,
    /// Keys go to the conversion service
    Converting,
}

/// Owner of the conversion service's current session.
///
/// A live-conversion peek leaves fed text inside the service. Anything that
/// is not the peek itself must adopt it (same source, start conversion) or
/// cancel it before touching the service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServiceOwner {
    #[default]
    Idle,
    /// Speculative conversion of `source`. `shown` is the converted text
    /// rendered as pre-edit, if the service produced any.
    Peek {
        source: String,
        shown: Option<String>,
    },
    /// A conversion session started by the user
    Conversion,
}

/// State of one conversion, from start to commit or cancel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversionSession {
    /// Text handed to the service when the conversion started
    pub original_source: String,
    /// Increments per conversion; candidate lists never outlive their serial
    pub serial: u64,
    pub segments: Vec<Segment>,
    pub candidates: Vec<Candidate>,
    pub focused_candidate: Option<usize>,
}

impl ConversionSession {
    pub fn new<T: Into<String>>(original_source: T, serial: u64) -> Self {
        Self {
            original_source: original_source.into(),
            serial,
            ..Self::default()
        }
    }

    /// Converted text currently shown.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// IME session state.
#[derive(Debug, Clone)]
pub struct ImeSession {
    state: OrchestrationState,

    owner: ServiceOwner,

    /// Pre-edit shown to the host
    composition: Composition,

    /// Conversion or prediction candidates
    candidates: CandidateList,

    conversion: Option<ConversionSession>,

    /// Candidates on screen are post-commit predictions
    showing_prediction: bool,

    /// Recently committed text, newest last
    history: String,

    next_serial: u64,
}

impl ImeSession {
    pub fn new() -> Self {
        Self::with_page_size(9)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: OrchestrationState::Composing,
            owner: ServiceOwner::Idle,
            composition: Composition::new(),
            candidates: CandidateList::with_page_size(page_size),
            conversion: None,
            showing_prediction: false,
            history: String::new(),
            next_serial: 1,
        }
    }

    pub fn state(&self) -> OrchestrationState {
        self.state
    }

    pub fn is_converting(&self) -> bool {
        self.state == OrchestrationState::Converting
    }

    pub fn owner(&self) -> &ServiceOwner {
        &self.owner
    }

    pub fn set_owner(&mut self, owner: ServiceOwner) {
        self.owner = owner;
    }

    /// Hand over the owner, leaving `Idle`.
    pub fn take_owner(&mut self) -> ServiceOwner {
        std::mem::take(&mut self.owner)
    }

    pub fn is_peek_active(&self) -> bool {
        matches!(self.owner, ServiceOwner::Peek { .. })
    }

    pub fn peek_source(&self) -> Option<&str> {
        match &self.owner {
            ServiceOwner::Peek { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Converted text the live peek put on screen.
    pub fn peek_shown(&self) -> Option<&str> {
        match &self.owner {
            ServiceOwner::Peek { shown, .. } => shown.as_deref(),
            _ => None,
        }
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// Show `text` as an unsegmented pre-edit.
    pub fn set_preedit_text(&mut self, text: &str) {
        self.composition = Composition::from_text(text);
    }

    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    pub fn candidates_mut(&mut self) -> &mut CandidateList {
        &mut self.candidates
    }

    pub fn conversion(&self) -> Option<&ConversionSession> {
        self.conversion.as_ref()
    }

    /// Enter `Converting` for `original_source`. The service now belongs to
    /// the conversion.
    pub fn begin_conversion<T: Into<String>>(&mut self, original_source: T) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.conversion = Some(ConversionSession::new(original_source, serial));
        self.state = OrchestrationState::Converting;
        self.owner = ServiceOwner::Conversion;
        self.showing_prediction = false;
        self.candidates.clear();
        serial
    }

    /// Render a segmented response of the active conversion.
    pub fn apply_pending(&mut self, pending: PendingConversion) {
        self.composition = Composition::from_segments(pending.segments.clone());
        // Candidates from a previous response go away even if the new one
        // carries none.
        self.candidates.set_candidates(pending.candidates.clone());
        if let Some(index) = pending.focused_candidate {
            self.candidates.set_focused(index);
        }
        if let Some(conversion) = self.conversion.as_mut() {
            conversion.segments = pending.segments;
            conversion.candidates = pending.candidates;
            conversion.focused_candidate = pending.focused_candidate;
        }
    }

    /// Leave `Converting`, returning the finished conversion.
    pub fn end_conversion(&mut self) -> Option<ConversionSession> {
        self.state = OrchestrationState::Composing;
        if self.owner == ServiceOwner::Conversion {
            self.owner = ServiceOwner::Idle;
        }
        self.composition.clear();
        self.candidates.clear();
        self.conversion.take()
    }

    pub fn is_showing_prediction(&self) -> bool {
        self.showing_prediction
    }

    pub fn show_prediction(&mut self, candidates: Vec<Candidate>, focused: Option<usize>) {
        self.candidates.set_candidates(candidates);
        if let Some(index) = focused {
            self.candidates.set_focused(index);
        }
        self.showing_prediction = !self.candidates.is_empty();
    }

    pub fn dismiss_prediction(&mut self) {
        if self.showing_prediction {
            self.showing_prediction = false;
            self.candidates.clear();
        }
    }

    /// Append committed text to the history window.
    pub fn record_commit(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.history.push_str(text);
        let keep = utils::tail_chars(&self.history, HISTORY_LIMIT).len();
        let cut = self.history.len() - keep;
        self.history.drain(..cut);
    }

    pub fn history(&self) -> &str {
        &self.history
    }

    /// Whether anything is composed, converted or listed.
    pub fn is_active(&self) -> bool {
        self.is_converting() || !self.composition.is_empty() || !self.candidates.is_empty()
    }

    /// Clear all state except the commit history. The caller releases the
    /// service first.
    pub fn clear(&mut self) {
        self.state = OrchestrationState::Composing;
        self.owner = ServiceOwner::Idle;
        self.composition.clear();
        self.candidates.clear();
        self.conversion = None;
        self.showing_prediction = false;
    }

    /// Sync session state to an ImeContext for platform communication.
    pub fn sync_to_context(&self, context: &mut ImeContext) {
        context.preedit = self.composition.clone();

        let page_candidates = self.candidates.current_page_candidates();
        context.candidates = page_candidates.iter().map(|c| c.text.clone()).collect();
        context.candidate_cursor = self.candidates.cursor();

        // Page indicator if multi-page
        context.auxiliary_text = if self.candidates.num_pages() > 1 {
            format!(
                "{}/{}",
                self.candidates.current_page() + 1,
                self.candidates.num_pages()
            )
        } else {
            String::new()
        };
    }
}

impl Default for ImeSession {
    fn default() -> Self {
        Self::new()
    }
}
