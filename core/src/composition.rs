//! Pre-edit composition with segments for display.
//!
//! The composition is what the host underlines while input is not yet
//! committed. Raw composing text is a single unfocused segment; a conversion
//! splits it into clauses, one of which is focused.

use serde::{Deserialize, Serialize};

/// One clause of the pre-edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    /// Whether this clause is the one being converted
    pub focused: bool,
}

impl Segment {
    pub fn new<T: Into<String>>(text: T, focused: bool) -> Self {
        Segment {
            text: text.into(),
            focused,
        }
    }

    pub fn plain<T: Into<String>>(text: T) -> Self {
        Self::new(text, false)
    }
}

/// Pre-edit composition for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Composition {
    pub segments: Vec<Segment>,
    /// Cursor position in the concatenated pre-edit (byte offset)
    pub cursor: usize,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single unfocused segment with the cursor at the end.
    pub fn from_text<T: Into<String>>(text: T) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::new();
        }
        let cursor = text.len();
        Self {
            segments: vec![Segment::plain(text)],
            cursor,
        }
    }

    /// Segments as returned by a converter. The cursor sits at the end of the
    /// focused segment, or at the end when nothing is focused.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let segments: Vec<Segment> = segments.into_iter().filter(|s| !s.text.is_empty()).collect();
        let mut cursor = 0;
        let mut focus_end = None;
        for seg in &segments {
            cursor += seg.text.len();
            if seg.focused && focus_end.is_none() {
                focus_end = Some(cursor);
            }
        }
        Self {
            cursor: focus_end.unwrap_or(cursor),
            segments,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.text.is_empty())
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.cursor = 0;
    }

    /// Concatenated pre-edit text.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Length of the pre-edit text in bytes.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.text.len()).sum()
    }

    pub fn focused_segment(&self) -> Option<&Segment> {
        self.segments.iter().find(|s| s.focused)
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.segments.iter().position(|s| s.focused)
    }
}
