//! Candidate types for conversion output.
//!
//! This module provides:
//! - `Candidate`: A display string plus the opaque id the converter needs to select it
//! - `CandidateList`: Paginated list with cursor navigation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Opaque token issued by the conversion service for one candidate.
///
/// Only meaningful inside the conversion session that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl CandidateId {
    pub fn new<T: Into<String>>(raw: T) -> Self {
        CandidateId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single conversion candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    /// Service id; `None` for locally generated candidates.
    pub id: Option<CandidateId>,
    /// Optional annotation shown next to the text (reading, description).
    pub annotation: Option<String>,
}

impl Candidate {
    pub fn new<T: Into<String>>(text: T) -> Self {
        Candidate {
            text: text.into(),
            id: None,
            annotation: None,
        }
    }

    pub fn with_id<T: Into<String>>(text: T, id: CandidateId) -> Self {
        Candidate {
            text: text.into(),
            id: Some(id),
            annotation: None,
        }
    }
}

/// Layout hint passed to the candidate surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateLayout {
    Vertical,
    Horizontal,
    Grid,
}

impl Default for CandidateLayout {
    fn default() -> Self {
        Self::Vertical
    }
}

/// A paginated list of candidates with cursor navigation.
#[derive(Debug, Clone)]
pub struct CandidateList {
    /// All available candidates
    candidates: Vec<Candidate>,

    /// Number of candidates per page
    page_size: usize,

    /// Current page index (0-based)
    current_page: usize,

    /// Cursor position within the current page (0-based)
    cursor: usize,
}

impl CandidateList {
    /// Create a new empty candidate list.
    pub fn new() -> Self {
        Self::with_page_size(9)
    }

    /// Create a candidate list with specified page size.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            candidates: Vec::new(),
            page_size: page_size.max(1),
            current_page: 0,
            cursor: 0,
        }
    }

    /// Set the page size.
    pub fn set_page_size(&mut self, page_size: usize) {
        let focused = self.selected_index();
        self.page_size = page_size.max(1);
        match focused {
            Some(index) => {
                self.set_focused(index);
            }
            None => self.reset(),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Replace the candidates, resetting pagination state.
    pub fn set_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
        self.reset();
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn num_pages(&self) -> usize {
        if self.candidates.is_empty() {
            0
        } else {
            (self.candidates.len() + self.page_size - 1) / self.page_size
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Cursor position within the current page (0-based).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn current_page_range(&self) -> Range<usize> {
        let start = self.current_page * self.page_size;
        let end = (start + self.page_size).min(self.candidates.len());
        start.min(end)..end
    }

    fn current_page_len(&self) -> usize {
        self.current_page_range().len()
    }

    pub fn current_page_candidates(&self) -> &[Candidate] {
        &self.candidates[self.current_page_range()]
    }

    /// The candidate under the cursor.
    pub fn selected_candidate(&self) -> Option<&Candidate> {
        self.current_page_candidates().get(self.cursor)
    }

    /// Global index of the candidate under the cursor.
    pub fn selected_index(&self) -> Option<usize> {
        let global_index = self.current_page * self.page_size + self.cursor;
        (global_index < self.candidates.len()).then_some(global_index)
    }

    /// Move the cursor to a global index, switching page as needed.
    /// Out-of-range indices are ignored.
    pub fn set_focused(&mut self, index: usize) -> bool {
        if index >= self.candidates.len() {
            return false;
        }
        self.current_page = index / self.page_size;
        self.cursor = index % self.page_size;
        true
    }

    /// Move cursor to previous candidate on current page.
    pub fn cursor_up(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Move cursor to next candidate on current page.
    pub fn cursor_down(&mut self) -> bool {
        let page_len = self.current_page_len();
        if page_len > 0 && self.cursor < page_len - 1 {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn page_up(&mut self) -> bool {
        if self.current_page > 0 {
            self.current_page -= 1;
            self.clamp_cursor();
            true
        } else {
            false
        }
    }

    pub fn page_down(&mut self) -> bool {
        let num_pages = self.num_pages();
        if num_pages > 0 && self.current_page < num_pages - 1 {
            self.current_page += 1;
            self.clamp_cursor();
            true
        } else {
            false
        }
    }

    fn clamp_cursor(&mut self) {
        let page_len = self.current_page_len();
        if page_len > 0 && self.cursor >= page_len {
            self.cursor = page_len - 1;
        }
    }

    /// Select a candidate by index within the current page.
    pub fn select_by_index(&mut self, page_index: usize) -> Option<&Candidate> {
        if page_index < self.current_page_len() {
            self.cursor = page_index;
            self.selected_candidate()
        } else {
            None
        }
    }

    /// Look up a candidate on the current page without moving the cursor.
    pub fn page_candidate(&self, page_index: usize) -> Option<&Candidate> {
        self.current_page_candidates().get(page_index)
    }

    /// Whether `id` belongs to one of the listed candidates.
    pub fn contains_id(&self, id: &CandidateId) -> bool {
        self.candidates.iter().any(|c| c.id.as_ref() == Some(id))
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
        self.reset();
    }

    /// Go to first page, first candidate.
    pub fn reset(&mut self) {
        self.current_page = 0;
        self.cursor = 0;
    }
}

impl Default for CandidateList {
    fn default() -> Self {
        Self::new()
    }
}
