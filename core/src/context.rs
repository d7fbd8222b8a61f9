//! IME context for platform communication.
//!
//! The `ImeContext` struct is a plain data container returned by the engine
//! after every key: what to commit, what pre-edit to show, which candidates
//! to list. Platforms either read the fields directly or push them into the
//! host through the [`TextClient`] and [`CandidateSurface`] contracts.

use crate::candidate::CandidateLayout;
use crate::composition::{Composition, Segment};

/// Screen rectangle reported by the host (for panel placement only).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Host text client that receives commits and pre-edit updates.
pub trait TextClient {
    fn commit_text(&mut self, text: &str);
    fn set_preedit(&mut self, segments: &[Segment], cursor: usize);
    fn clear_preedit(&mut self);
    fn caret_geometry(&self) -> Rect;
}

/// Candidate panel. Rendering sink only; selection comes back as key input.
pub trait CandidateSurface {
    fn show(&mut self, candidates: &[String], selected: usize, layout: CandidateLayout);
    fn hide(&mut self);
}

/// IME context for platform communication.
///
/// - `preedit`: Text being composed (displayed with underline), with clauses
/// - `commit_text`: Text to commit to application (consume and clear)
/// - `candidates`: Current page of candidates
/// - `candidate_cursor`: Which candidate is highlighted (0-based, page relative)
/// - `auxiliary_text`: Optional hint text (page indicator)
#[derive(Debug, Clone, Default)]
pub struct ImeContext {
    pub preedit: Composition,

    pub commit_text: String,

    pub candidates: Vec<String>,

    pub candidate_cursor: usize,

    pub candidate_layout: CandidateLayout,

    pub auxiliary_text: String,
}

impl ImeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all display state (preedit, candidates, auxiliary).
    /// Does NOT clear commit_text (platform should consume it first).
    pub fn clear(&mut self) {
        self.preedit.clear();
        self.candidates.clear();
        self.candidate_cursor = 0;
        self.auxiliary_text.clear();
    }

    /// Take the commit text, leaving it empty.
    pub fn take_commit(&mut self) -> String {
        std::mem::take(&mut self.commit_text)
    }

    /// Append to the commit text (several commits can happen on one key).
    pub fn push_commit(&mut self, text: &str) {
        self.commit_text.push_str(text);
    }

    pub fn preedit_text(&self) -> String {
        self.preedit.text()
    }

    pub fn has_visible_state(&self) -> bool {
        !self.preedit.is_empty() || !self.candidates.is_empty()
    }

    pub fn has_commit(&self) -> bool {
        !self.commit_text.is_empty()
    }

    /// Push commit and pre-edit into the host, consuming the commit text.
    pub fn apply_to(&mut self, client: &mut dyn TextClient) {
        let commit = self.take_commit();
        if !commit.is_empty() {
            client.commit_text(&commit);
        }
        if self.preedit.is_empty() {
            client.clear_preedit();
        } else {
            client.set_preedit(&self.preedit.segments, self.preedit.cursor);
        }
    }

    /// Show or hide the candidate panel.
    pub fn present(&self, surface: &mut dyn CandidateSurface) {
        if self.candidates.is_empty() {
            surface.hide();
        } else {
            surface.show(&self.candidates, self.candidate_cursor, self.candidate_layout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingClient {
        committed: Vec<String>,
        preedit: Option<(String, usize)>,
    }

    impl TextClient for RecordingClient {
        fn commit_text(&mut self, text: &str) {
            self.committed.push(text.to_string());
        }
        fn set_preedit(&mut self, segments: &[Segment], cursor: usize) {
            let text = segments.iter().map(|s| s.text.as_str()).collect();
            self.preedit = Some((text, cursor));
        }
        fn clear_preedit(&mut self) {
            self.preedit = None;
        }
        fn caret_geometry(&self) -> Rect {
            Rect::default()
        }
    }

    #[derive(Default)]
    struct RecordingSurface {
        shown: Option<(Vec<String>, usize)>,
    }

    impl CandidateSurface for RecordingSurface {
        fn show(&mut self, candidates: &[String], selected: usize, _layout: CandidateLayout) {
            self.shown = Some((candidates.to_vec(), selected));
        }
        fn hide(&mut self) {
            self.shown = None;
        }
    }

    #[test]
    fn test_take_commit() {
        let mut ctx = ImeContext::new();
        ctx.push_commit("가");
        ctx.push_commit("나");
        assert!(ctx.has_commit());
        assert_eq!(ctx.take_commit(), "가나");
        assert!(!ctx.has_commit());
    }

    #[test]
    fn test_clear_keeps_commit() {
        let mut ctx = ImeContext::new();
        ctx.commit_text = "x".into();
        ctx.preedit = Composition::from_text("か");
        ctx.candidates = vec!["蚊".into()];
        ctx.clear();
        assert!(!ctx.has_visible_state());
        assert_eq!(ctx.commit_text, "x");
    }

    #[test]
    fn test_apply_to_client() {
        let mut client = RecordingClient::default();
        let mut ctx = ImeContext::new();
        ctx.push_commit("今日");
        ctx.preedit = Composition::from_text("は");
        ctx.apply_to(&mut client);

        assert_eq!(client.committed, vec!["今日".to_string()]);
        assert_eq!(client.preedit, Some(("は".to_string(), 3)));
        assert!(!ctx.has_commit());

        ctx.preedit.clear();
        ctx.apply_to(&mut client);
        assert_eq!(client.committed.len(), 1);
        assert!(client.preedit.is_none());
    }

    #[test]
    fn test_present_to_surface() {
        let mut surface = RecordingSurface::default();
        let mut ctx = ImeContext::new();
        ctx.candidates = vec!["今日".into(), "京".into()];
        ctx.candidate_cursor = 1;
        ctx.present(&mut surface);
        assert_eq!(surface.shown, Some((vec!["今日".to_string(), "京".to_string()], 1)));

        ctx.clear();
        ctx.present(&mut surface);
        assert!(surface.shown.is_none());
    }
}
