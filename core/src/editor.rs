//! Editor trait and implementations for the orchestration states.
//!
//! The editor architecture provides pluggable key handlers: composing keys go
//! to the script composer, keys during a conversion go to the conversion
//! service, and post-commit predictions get their own small editor. Each
//! editor implements the `Editor` trait and updates the shared session.
//!
//! Every service call goes through [`with_resync`]. When the retry fails too,
//! or the service rejects anything but a candidate selection, the conversion
//! is abandoned and the original source text goes back into the
//! composer, so nothing typed is lost.

use crate::composer::Composer;
use crate::ime_engine::KeyEvent;
use crate::service::{
    feed_str, with_resync, ControlKey, ConversionService, ResponseShape, ResyncStep,
    ServiceError, ServiceResponse,
};
use crate::session::{ImeSession, ServiceOwner};
use crate::Config;
use tracing::{debug, warn};

/// Result of processing a key event in an editor.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorResult {
    /// Key was handled, session state updated
    Handled,

    /// Text should be committed, input continues
    Commit(String),

    /// Text should be committed and the session reset
    CommitAndReset(String),

    /// Commit, reset, then let the key reach the application
    CommitAndPass(String),

    /// Key not handled by this editor
    PassThrough,
}

/// What the editors work with besides the session.
pub struct Backend<C: Composer> {
    pub composer: C,
    pub service: Option<Box<dyn ConversionService>>,
    pub config: Config,
}

impl<C: Composer> Backend<C> {
    pub fn new(composer: C, config: Config) -> Self {
        Self {
            composer,
            service: None,
            config,
        }
    }

    pub fn has_service(&self) -> bool {
        self.service.is_some()
    }

    /// Cancel a live peek so the service can be used for something else.
    pub fn release_peek(&mut self, session: &mut ImeSession) {
        if session.is_peek_active() {
            self.release_service(session);
        }
    }

    /// Cancel whatever the service holds for this session.
    pub fn release_service(&mut self, session: &mut ImeSession) {
        if session.take_owner() == ServiceOwner::Idle {
            return;
        }
        self.cancel_service();
    }

    fn cancel_service(&mut self) {
        if let Some(service) = self.service.as_deref_mut() {
            if let Err(e) = service.cancel() {
                warn!(error = %e, "failed to cancel conversion service session");
            }
        }
    }
}

/// Editor trait for handling input in one orchestration state.
pub trait Editor {
    /// Process a key event, updating the session.
    fn process_key<C: Composer>(
        &mut self,
        key: KeyEvent,
        session: &mut ImeSession,
        backend: &mut Backend<C>,
    ) -> EditorResult;

    /// Reset editor state.
    fn reset(&mut self);

    /// Get a human-readable name for this editor (for debugging/logging).
    fn name(&self) -> &'static str;
}

// ============================================================================
// Shared steps
// ============================================================================

/// Show the composer's text, or its live conversion when enabled.
fn refresh_preedit<C: Composer>(session: &mut ImeSession, backend: &mut Backend<C>) {
    let raw = backend.composer.composing_text();
    backend.release_peek(session);
    session.set_preedit_text(&raw);

    if raw.is_empty() || !backend.config.live_conversion {
        return;
    }
    let source = backend.composer.conversion_source();
    let Some(service) = backend.service.as_deref_mut() else {
        return;
    };
    match with_resync(service, &[], |s| feed_str(s, &source)) {
        Ok(resp) => {
            let shown = match resp.shape() {
                ResponseShape::Segmented(pending) => Some(pending.text())
                    .filter(|converted| !converted.is_empty() && *converted != raw),
                _ => None,
            };
            if let Some(converted) = &shown {
                session.set_preedit_text(converted);
            }
            session.set_owner(ServiceOwner::Peek { source, shown });
        }
        Err(e) => {
            warn!(error = %e, "live conversion failed, showing raw text");
            backend.cancel_service();
        }
    }
}

fn committed_result(committed: String, session: &ImeSession) -> EditorResult {
    if committed.is_empty() {
        EditorResult::Handled
    } else if session.composition().is_empty() {
        EditorResult::CommitAndReset(committed)
    } else {
        EditorResult::Commit(committed)
    }
}

fn compose_char<C: Composer>(
    ch: char,
    session: &mut ImeSession,
    backend: &mut Backend<C>,
) -> EditorResult {
    let result = backend.composer.input(ch);
    refresh_preedit(session, backend);
    committed_result(result.committed, session)
}

/// Commit everything composing and let the key through.
fn flush_and_pass<C: Composer>(session: &mut ImeSession, backend: &mut Backend<C>) -> EditorResult {
    backend.release_peek(session);
    let text = backend.composer.flush();
    session.set_preedit_text("");
    if text.is_empty() {
        EditorResult::PassThrough
    } else {
        EditorResult::CommitAndPass(text)
    }
}

/// Put the conversion's original source back into the composer.
fn restore_original<C: Composer>(session: &mut ImeSession, backend: &mut Backend<C>) {
    let original = session
        .end_conversion()
        .map(|c| c.original_source)
        .unwrap_or_default();
    debug!(original = %original, "restoring conversion source");
    backend.composer.restore(&original);
    session.set_preedit_text(&backend.composer.composing_text());
}

fn abandon_conversion<C: Composer>(
    error: ServiceError,
    session: &mut ImeSession,
    backend: &mut Backend<C>,
) -> EditorResult {
    warn!(error = %error, "conversion failed, falling back to raw text");
    backend.release_service(session);
    restore_original(session, backend);
    EditorResult::Handled
}

/// Steps that bring a fresh service session back to the current conversion.
fn resync_steps(session: &ImeSession) -> Vec<ResyncStep> {
    match session.conversion() {
        Some(conversion) => vec![
            ResyncStep::Feed(conversion.original_source.clone()),
            ResyncStep::Convert,
        ],
        None => Vec::new(),
    }
}

/// Interpret a service response while converting.
fn apply_response<C: Composer>(
    resp: ServiceResponse,
    session: &mut ImeSession,
    backend: &mut Backend<C>,
) -> EditorResult {
    match resp.shape() {
        ResponseShape::Committed {
            text,
            follow_up: Some(pending),
        } => {
            // Remaining clauses stay in conversion.
            session.end_conversion();
            session.begin_conversion(pending.text());
            session.apply_pending(pending);
            EditorResult::Commit(text)
        }
        ResponseShape::Committed {
            text,
            follow_up: None,
        } => {
            session.end_conversion();
            EditorResult::CommitAndReset(text)
        }
        ResponseShape::Segmented(pending) => {
            session.apply_pending(pending);
            EditorResult::Handled
        }
        ResponseShape::Dropped => {
            debug!("conversion dropped by service");
            restore_original(session, backend);
            EditorResult::Handled
        }
        ResponseShape::Unchanged if session.composition().is_empty() => {
            // Nothing to show for a conversion that just started.
            backend.release_service(session);
            restore_original(session, backend);
            EditorResult::Handled
        }
        ResponseShape::Unchanged => EditorResult::Handled,
    }
}

/// Start converting the composer's text, adopting a matching live peek.
fn start_conversion<C: Composer>(
    session: &mut ImeSession,
    backend: &mut Backend<C>,
) -> EditorResult {
    let source = backend.composer.conversion_source();
    if source.is_empty() {
        return EditorResult::PassThrough;
    }
    let adopt = session.peek_source() == Some(source.as_str());
    if !adopt {
        backend.release_peek(session);
    }
    let Some(service) = backend.service.as_deref_mut() else {
        return EditorResult::PassThrough;
    };

    let result = if adopt {
        debug!(source = %source, "adopting live conversion session");
        with_resync(service, &[ResyncStep::Feed(source.clone())], |s| {
            s.trigger_conversion()
        })
    } else {
        with_resync(service, &[], |s| {
            feed_str(s, &source)?;
            s.trigger_conversion()
        })
    };

    match result {
        Ok(resp) => {
            backend.composer.clear();
            let serial = session.begin_conversion(source);
            debug!(serial, "conversion started");
            apply_response(resp, session, backend)
        }
        Err(e) => {
            warn!(error = %e, "conversion could not start, keeping raw text");
            session.set_owner(ServiceOwner::Idle);
            backend.cancel_service();
            session.set_preedit_text(&backend.composer.composing_text());
            EditorResult::Handled
        }
    }
}

/// Finish the active conversion and return the text to commit.
///
/// Falls back to the text on screen when the service cannot submit.
pub(crate) fn submit_conversion<C: Composer>(
    session: &mut ImeSession,
    backend: &mut Backend<C>,
) -> String {
    let shown = session.composition().text();
    let steps = resync_steps(session);
    let submitted = match backend.service.as_deref_mut() {
        Some(service) => with_resync(service, &steps, |s| s.submit()),
        None => Ok(None),
    };
    let text = match submitted {
        Ok(Some(text)) => text,
        Ok(None) => shown,
        Err(e) => {
            warn!(error = %e, "submit failed, committing displayed text");
            backend.release_service(session);
            if shown.is_empty() {
                session
                    .conversion()
                    .map(|c| c.original_source.clone())
                    .unwrap_or_default()
            } else {
                shown
            }
        }
    };
    session.end_conversion();
    text
}

// ============================================================================
// ComposingEditor - keys go to the composer
// ============================================================================

/// Editor for the `Composing` state.
#[derive(Debug, Default)]
pub struct ComposingEditor;

impl ComposingEditor {
    pub fn new() -> Self {
        Self
    }

    /// Commit what is on screen: the live conversion if one is shown,
    /// otherwise the flushed composer text.
    fn commit_preedit<C: Composer>(session: &mut ImeSession, backend: &mut Backend<C>) -> String {
        let text = match session.peek_shown() {
            Some(converted) => {
                let converted = converted.to_string();
                backend.composer.clear();
                converted
            }
            None => backend.composer.flush(),
        };
        backend.release_peek(session);
        text
    }
}

impl Editor for ComposingEditor {
    fn process_key<C: Composer>(
        &mut self,
        key: KeyEvent,
        session: &mut ImeSession,
        backend: &mut Backend<C>,
    ) -> EditorResult {
        let composing = backend.composer.is_composing();
        match key {
            KeyEvent::Char(ch) if backend.composer.accepts(ch) => compose_char(ch, session, backend),
            KeyEvent::Char(_) | KeyEvent::Number(_) | KeyEvent::Tab => {
                flush_and_pass(session, backend)
            }
            KeyEvent::Backspace => match backend.composer.delete_backward() {
                Some(_) => {
                    refresh_preedit(session, backend);
                    if session.composition().is_empty() {
                        EditorResult::CommitAndReset(String::new())
                    } else {
                        EditorResult::Handled
                    }
                }
                None => EditorResult::PassThrough,
            },
            KeyEvent::Space if composing && backend.has_service() => {
                start_conversion(session, backend)
            }
            KeyEvent::Space => flush_and_pass(session, backend),
            KeyEvent::Convert if composing && backend.has_service() => {
                start_conversion(session, backend)
            }
            KeyEvent::Enter if composing => {
                EditorResult::CommitAndReset(Self::commit_preedit(session, backend))
            }
            KeyEvent::Escape if composing => {
                // Explicit discard.
                backend.release_peek(session);
                backend.composer.clear();
                EditorResult::CommitAndReset(String::new())
            }
            _ if composing => EditorResult::Handled,
            _ => EditorResult::PassThrough,
        }
    }

    fn reset(&mut self) {}

    fn name(&self) -> &'static str {
        "ComposingEditor"
    }
}

// ============================================================================
// ConversionEditor - keys go to the conversion service
// ============================================================================

/// Editor for the `Converting` state.
#[derive(Debug, Default)]
pub struct ConversionEditor;

impl ConversionEditor {
    pub fn new() -> Self {
        Self
    }

    fn control<C: Composer>(
        key: ControlKey,
        session: &mut ImeSession,
        backend: &mut Backend<C>,
    ) -> EditorResult {
        if !backend.has_service() {
            restore_original(session, backend);
            return EditorResult::Handled;
        }
        let steps = resync_steps(session);
        let Some(service) = backend.service.as_deref_mut() else {
            return EditorResult::Handled;
        };
        match with_resync(service, &steps, |s| s.send_control_key(key)) {
            Ok(resp) => apply_response(resp, session, backend),
            Err(e) => abandon_conversion(e, session, backend),
        }
    }

    /// Select the Nth candidate (1-based) of the current page.
    fn select<C: Composer>(
        n: u8,
        session: &mut ImeSession,
        backend: &mut Backend<C>,
    ) -> EditorResult {
        let id = n
            .checked_sub(1)
            .and_then(|index| session.candidates().page_candidate(index as usize))
            .and_then(|candidate| candidate.id.clone());
        let Some(id) = id else {
            return EditorResult::PassThrough;
        };

        let steps = resync_steps(session);
        let Some(service) = backend.service.as_deref_mut() else {
            return EditorResult::PassThrough;
        };
        match with_resync(service, &steps, |s| s.select_candidate(&id)) {
            Ok(resp) => apply_response(resp, session, backend),
            // Stale or unknown id: the conversion on screen is still valid
            Err(ServiceError::Rejected(reason)) => {
                debug!(%id, %reason, "candidate selection not consumed");
                EditorResult::PassThrough
            }
            Err(e) => abandon_conversion(e, session, backend),
        }
    }

    fn cancel<C: Composer>(session: &mut ImeSession, backend: &mut Backend<C>) -> EditorResult {
        backend.release_service(session);
        restore_original(session, backend);
        EditorResult::Handled
    }
}

/// Put `committed` in front of whatever `result` commits.
fn prepend_commit(committed: String, result: EditorResult) -> EditorResult {
    if committed.is_empty() {
        return result;
    }
    match result {
        EditorResult::Handled => EditorResult::Commit(committed),
        EditorResult::Commit(more) => EditorResult::Commit(committed + &more),
        EditorResult::CommitAndReset(more) => EditorResult::CommitAndReset(committed + &more),
        EditorResult::CommitAndPass(more) => EditorResult::CommitAndPass(committed + &more),
        EditorResult::PassThrough => EditorResult::CommitAndPass(committed),
    }
}

impl Editor for ConversionEditor {
    fn process_key<C: Composer>(
        &mut self,
        key: KeyEvent,
        session: &mut ImeSession,
        backend: &mut Backend<C>,
    ) -> EditorResult {
        match key {
            KeyEvent::Space | KeyEvent::Convert => {
                Self::control(ControlKey::Convert, session, backend)
            }
            KeyEvent::Down => Self::control(ControlKey::Down, session, backend),
            KeyEvent::Up => Self::control(ControlKey::Up, session, backend),
            KeyEvent::Left => Self::control(ControlKey::Left, session, backend),
            KeyEvent::Right => Self::control(ControlKey::Right, session, backend),
            KeyEvent::ShiftLeft => Self::control(ControlKey::ShrinkSegment, session, backend),
            KeyEvent::ShiftRight => Self::control(ControlKey::ExpandSegment, session, backend),
            KeyEvent::Enter => Self::control(ControlKey::Commit, session, backend),
            KeyEvent::PageUp => {
                session.candidates_mut().page_up();
                EditorResult::Handled
            }
            KeyEvent::PageDown => {
                session.candidates_mut().page_down();
                EditorResult::Handled
            }
            KeyEvent::Escape | KeyEvent::Backspace => Self::cancel(session, backend),
            KeyEvent::Number(n) => Self::select(n, session, backend),
            KeyEvent::Char(ch) => {
                // Typing on finalizes the conversion.
                let committed = submit_conversion(session, backend);
                if backend.composer.accepts(ch) {
                    prepend_commit(committed, compose_char(ch, session, backend))
                } else {
                    EditorResult::CommitAndPass(committed)
                }
            }
            KeyEvent::Tab | KeyEvent::Delete => EditorResult::Handled,
        }
    }

    fn reset(&mut self) {}

    fn name(&self) -> &'static str {
        "ConversionEditor"
    }
}

// ============================================================================
// SuggestionEditor - Post-commit predictions
// ============================================================================

/// Suggestion editor for predictive text.
///
/// After a commit, the service is asked for words likely to follow the
/// recently committed text. Selection keys commit a prediction; every other
/// key passes through and dismisses the list.
#[derive(Debug, Default)]
pub struct SuggestionEditor {
    /// Context the current predictions were requested for
    context: String,
}

impl SuggestionEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Request predictions for `context`. Returns whether any are shown.
    pub fn activate<C: Composer>(
        &mut self,
        context: &str,
        session: &mut ImeSession,
        backend: &mut Backend<C>,
    ) -> bool {
        let Some(service) = backend.service.as_deref_mut() else {
            return false;
        };
        match with_resync(service, &[], |s| s.request_prediction(context)) {
            Ok(Some(resp)) => {
                session.show_prediction(resp.candidates, resp.focused_candidate);
                self.context = context.to_string();
                session.is_showing_prediction()
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "prediction request failed");
                false
            }
        }
    }
}

impl Editor for SuggestionEditor {
    fn process_key<C: Composer>(
        &mut self,
        key: KeyEvent,
        session: &mut ImeSession,
        _backend: &mut Backend<C>,
    ) -> EditorResult {
        match key {
            KeyEvent::Number(n) => {
                let text = n
                    .checked_sub(1)
                    .and_then(|index| session.candidates().page_candidate(index as usize))
                    .map(|c| c.text.clone());
                match text {
                    Some(text) => {
                        session.dismiss_prediction();
                        self.context.clear();
                        EditorResult::CommitAndReset(text)
                    }
                    None => EditorResult::PassThrough,
                }
            }
            KeyEvent::Up => {
                session.candidates_mut().cursor_up();
                EditorResult::Handled
            }
            KeyEvent::Down => {
                session.candidates_mut().cursor_down();
                EditorResult::Handled
            }
            KeyEvent::PageUp => {
                session.candidates_mut().page_up();
                EditorResult::Handled
            }
            KeyEvent::PageDown => {
                session.candidates_mut().page_down();
                EditorResult::Handled
            }
            _ => EditorResult::PassThrough,
        }
    }

    fn reset(&mut self) {
        self.context.clear();
    }

    fn name(&self) -> &'static str {
        "SuggestionEditor"
    }
}
