//! IME engine with session management and key event processing.
//!
//! The `ImeEngine` drives one script composer and, optionally, a conversion
//! service. It provides a `process_key()` method that routes each key to the
//! editor for the current orchestration state and maintains the output
//! context (commit text, pre-edit, candidates) across key events.

use crate::composer::Composer;
use crate::context::ImeContext;
use crate::editor::{
    submit_conversion, Backend, ComposingEditor, ConversionEditor, Editor, EditorResult,
    SuggestionEditor,
};
use crate::service::ConversionService;
use crate::session::{ImeSession, OrchestrationState};
use crate::{utils, Config};
use tracing::debug;

/// Key event types that the IME can process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// Character input, already decoded from the hardware keycode
    Char(char),
    /// Backspace key
    Backspace,
    /// Forward delete key
    Delete,
    /// Left arrow key
    Left,
    /// Right arrow key
    Right,
    /// Up arrow key (candidate cursor up)
    Up,
    /// Down arrow key (candidate cursor down)
    Down,
    /// Page up (candidate page up)
    PageUp,
    /// Page down (candidate page down)
    PageDown,
    /// Space key (start conversion / next candidate)
    Space,
    /// Enter/Return key (commit)
    Enter,
    /// Escape key (cancel)
    Escape,
    Tab,
    /// Candidate selection (1-based, page relative)
    Number(u8),
    /// Dedicated conversion key
    Convert,
    /// Shrink the focused clause
    ShiftLeft,
    /// Grow the focused clause
    ShiftRight,
}

/// Result of processing a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    /// Key was handled by the IME
    Handled,
    /// Key was not handled (pass through to application)
    NotHandled,
}

/// Object-safe view of an engine, used by the script router.
pub trait ScriptEngine {
    fn name(&self) -> &'static str;
    fn process_key(&mut self, key: KeyEvent) -> KeyResult;
    /// Commit everything and reset. Safe to call repeatedly.
    fn focus_lost(&mut self);
    fn context(&self) -> &ImeContext;
    fn context_mut(&mut self) -> &mut ImeContext;
    fn is_composing(&self) -> bool;
    fn toggle_fullwidth(&mut self);
    fn reset(&mut self);
}

/// IME engine with session management.
pub struct ImeEngine<C: Composer> {
    backend: Backend<C>,

    composing_editor: ComposingEditor,

    conversion_editor: ConversionEditor,

    /// Suggestion/prediction editor
    suggestion_editor: SuggestionEditor,

    /// Session state
    session: ImeSession,

    /// Context for platform communication
    context: ImeContext,
}

impl<C: Composer> ImeEngine<C> {
    /// Create an engine without a conversion service (compose and commit).
    pub fn new(composer: C, config: Config) -> Self {
        let session = ImeSession::with_page_size(config.page_size);
        Self {
            backend: Backend::new(composer, config),
            composing_editor: ComposingEditor::new(),
            conversion_editor: ConversionEditor::new(),
            suggestion_editor: SuggestionEditor::new(),
            session,
            context: ImeContext::new(),
        }
    }

    /// Attach a conversion service.
    pub fn with_service(mut self, service: Box<dyn ConversionService>) -> Self {
        self.set_service(Some(service));
        self
    }

    /// Replace the conversion service. Anything held by the old one is
    /// committed first.
    pub fn set_service(&mut self, service: Option<Box<dyn ConversionService>>) {
        if self.session.is_active() {
            self.focus_lost();
        }
        self.backend.service = service;
    }

    /// Get a reference to the context for reading IME state.
    pub fn context(&self) -> &ImeContext {
        &self.context
    }

    /// Get a mutable reference to the context.
    pub fn context_mut(&mut self) -> &mut ImeContext {
        &mut self.context
    }

    /// Get a reference to the session.
    pub fn session(&self) -> &ImeSession {
        &self.session
    }

    pub fn composer(&self) -> &C {
        &self.backend.composer
    }

    pub fn config(&self) -> &Config {
        &self.backend.config
    }

    /// Reset the IME to initial state, discarding anything composing.
    pub fn reset(&mut self) {
        self.backend.release_service(&mut self.session);
        self.backend.composer.clear();
        self.session.clear();
        self.context.clear();
        self.composing_editor.reset();
        self.conversion_editor.reset();
        self.suggestion_editor.reset();
    }

    /// Reset after a commit. The composer may already hold new input.
    fn reset_session(&mut self) {
        self.backend.release_service(&mut self.session);
        self.session.clear();
        let composing = self.backend.composer.composing_text();
        self.session.set_preedit_text(&composing);
    }

    /// Translate selection key characters to Number events while
    /// candidates are shown.
    fn translate_selection_key(&self, key: KeyEvent) -> KeyEvent {
        match key {
            KeyEvent::Char(ch) if !self.session.candidates().is_empty() => {
                match self.backend.config.selection_key_index(ch) {
                    Some(index) => KeyEvent::Number((index + 1) as u8),
                    None => key,
                }
            }
            _ => key,
        }
    }

    /// Process a key event and update IME state.
    ///
    /// After calling this, the platform should read `context()` to update the
    /// UI (pre-edit, candidates, commit text).
    ///
    /// Returns `KeyResult::Handled` if the IME consumed the key,
    /// or `KeyResult::NotHandled` if it should pass through to the application.
    pub fn process_key(&mut self, key: KeyEvent) -> KeyResult {
        // Clear commit text from previous key
        self.context.commit_text.clear();

        let key = self.translate_selection_key(key);

        if self.session.is_showing_prediction() {
            let result =
                self.suggestion_editor
                    .process_key(key, &mut self.session, &mut self.backend);
            if result != EditorResult::PassThrough {
                return self.apply_result(key, result);
            }
            debug!(?key, "prediction dismissed");
            self.session.dismiss_prediction();
            self.suggestion_editor.reset();
        }

        let result = match self.session.state() {
            OrchestrationState::Composing => {
                self.composing_editor
                    .process_key(key, &mut self.session, &mut self.backend)
            }
            OrchestrationState::Converting => {
                self.conversion_editor
                    .process_key(key, &mut self.session, &mut self.backend)
            }
        };
        self.apply_result(key, result)
    }

    fn apply_result(&mut self, key: KeyEvent, result: EditorResult) -> KeyResult {
        match result {
            EditorResult::Handled => {
                self.sync();
                KeyResult::Handled
            }
            EditorResult::Commit(text) => {
                self.commit(&text);
                self.sync();
                KeyResult::Handled
            }
            EditorResult::CommitAndReset(text) => {
                self.commit(&text);
                self.reset_session();
                self.sync();

                // Auto-enter prediction after reset if enabled
                self.maybe_auto_predict(&text);
                KeyResult::Handled
            }
            EditorResult::CommitAndPass(text) => {
                self.commit(&text);
                self.reset_session();
                self.sync();
                self.pass_through(key)
            }
            EditorResult::PassThrough => {
                self.sync();
                self.pass_through(key)
            }
        }
    }

    /// Let a key reach the application, widening printable ASCII in
    /// full-width mode.
    fn pass_through(&mut self, key: KeyEvent) -> KeyResult {
        match key {
            KeyEvent::Char(ch) if self.backend.config.is_fullwidth() && ch.is_ascii_graphic() => {
                self.context.push_commit(&utils::to_fullwidth(&ch.to_string()));
                KeyResult::Handled
            }
            _ => KeyResult::NotHandled,
        }
    }

    fn commit(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let text = utils::nfc(text);
        let text = if self.backend.config.is_fullwidth() {
            utils::to_fullwidth(&text)
        } else {
            text
        };
        debug!(text = %text, composer = self.backend.composer.name(), "commit");
        self.context.push_commit(&text);
        self.session.record_commit(&text);
    }

    fn sync(&mut self) {
        self.session.sync_to_context(&mut self.context);
        self.context.candidate_layout = self.backend.config.candidate_layout;
    }

    /// Maybe show predictions automatically after a commit.
    fn maybe_auto_predict(&mut self, committed_text: &str) {
        let config = &self.backend.config;
        if committed_text.is_empty() || !config.auto_prediction || !self.backend.has_service() {
            return;
        }
        if committed_text.chars().count() < config.min_prediction_trigger_length {
            return;
        }
        if self.backend.composer.is_composing() || self.session.is_active() {
            return;
        }
        let context =
            utils::tail_chars(self.session.history(), config.prediction_context_chars).to_string();
        if self
            .suggestion_editor
            .activate(&context, &mut self.session, &mut self.backend)
        {
            debug!(context = %context, "showing predictions");
            self.sync();
        }
    }

    /// Force-commit on focus loss: a conversion is submitted, composing text
    /// is flushed. Then everything is reset. Idempotent.
    pub fn focus_lost(&mut self) {
        let text = match self.session.state() {
            OrchestrationState::Converting => {
                submit_conversion(&mut self.session, &mut self.backend)
            }
            OrchestrationState::Composing => {
                self.backend.release_peek(&mut self.session);
                self.backend.composer.flush()
            }
        };
        self.commit(&text);
        self.backend.release_service(&mut self.session);
        self.backend.composer.clear();
        self.session.clear();
        self.suggestion_editor.reset();
        self.sync();
    }

    pub fn is_composing(&self) -> bool {
        self.session.is_active() || self.backend.composer.is_composing()
    }

    // ========== Configuration Management API ==========

    /// Toggle full-width mode on/off.
    pub fn toggle_fullwidth(&mut self) {
        self.backend.config.toggle_fullwidth();
    }

    /// Check if full-width mode is enabled.
    pub fn is_fullwidth(&self) -> bool {
        self.backend.config.is_fullwidth()
    }

    /// Set the selection keys string (e.g., "asdfghjkl" or "123456789").
    pub fn set_select_keys(&mut self, keys: &str) {
        self.backend.config.set_select_keys(keys);
    }

    pub fn set_live_conversion(&mut self, enabled: bool) {
        if !enabled {
            self.backend.release_peek(&mut self.session);
        }
        self.backend.config.live_conversion = enabled;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.backend.config.page_size = page_size;
        self.session.candidates_mut().set_page_size(page_size);
        self.sync();
    }
}

impl<C: Composer> ScriptEngine for ImeEngine<C> {
    fn name(&self) -> &'static str {
        self.backend.composer.name()
    }

    fn process_key(&mut self, key: KeyEvent) -> KeyResult {
        ImeEngine::process_key(self, key)
    }

    fn focus_lost(&mut self) {
        ImeEngine::focus_lost(self)
    }

    fn context(&self) -> &ImeContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut ImeContext {
        &mut self.context
    }

    fn is_composing(&self) -> bool {
        ImeEngine::is_composing(self)
    }

    fn toggle_fullwidth(&mut self) {
        ImeEngine::toggle_fullwidth(self)
    }

    fn reset(&mut self) {
        ImeEngine::reset(self)
    }
}
