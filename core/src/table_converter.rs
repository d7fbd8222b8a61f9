//! In-process conversion service backed by a reading → surfaces table.
//!
//! `TableConverter` speaks the same [`ConversionService`] contract as an
//! out-of-process analyser, which makes it the converter used by the demo
//! binary and by the orchestration tests. Segmentation is greedy longest
//! match over the dictionary readings; characters with no entry are grouped
//! into one clause that converts to itself.
//!
//! Candidate ids carry a generation number that changes with every new
//! conversion session, so ids from an earlier session are rejected.

use crate::candidate::{Candidate, CandidateId};
use crate::composition::Segment;
use crate::service::{ControlKey, ConversionService, ServiceError, ServiceResponse};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Dictionary file layout:
///
/// ```toml
/// [dictionary]
/// "きょう" = ["今日", "京"]
///
/// [predictions]
/// "今日" = ["は", "の"]
/// ```
#[derive(Debug, Default, Deserialize)]
struct TableData {
    #[serde(default)]
    dictionary: HashMap<String, Vec<String>>,
    #[serde(default)]
    predictions: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
struct Clause {
    reading: String,
    surfaces: Vec<String>,
    selected: usize,
}

impl Clause {
    fn surface(&self) -> &str {
        self.surfaces
            .get(self.selected)
            .map(String::as_str)
            .unwrap_or(&self.reading)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableConverter {
    dictionary: HashMap<String, Vec<String>>,
    predictions: HashMap<String, Vec<String>>,
    max_reading_chars: usize,

    generation: u64,
    input: String,
    clauses: Vec<Clause>,
    focus: usize,
}

impl TableConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML dictionary with `[dictionary]` and `[predictions]` tables.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let data: TableData = toml::from_str(content)?;
        let mut converter = Self::new();
        for (reading, surfaces) in data.dictionary {
            converter.insert(reading, surfaces);
        }
        converter.predictions = data.predictions;
        Ok(converter)
    }

    /// Add surfaces for a reading, best first. Existing surfaces are kept.
    pub fn insert<K: Into<String>>(&mut self, reading: K, surfaces: Vec<String>) {
        let reading = reading.into();
        self.max_reading_chars = self.max_reading_chars.max(reading.chars().count());
        let bucket = self.dictionary.entry(reading).or_default();
        for surface in surfaces {
            if !bucket.contains(&surface) {
                bucket.push(surface);
            }
        }
    }

    /// Words offered after text ending in `context`.
    pub fn insert_prediction<K: Into<String>>(&mut self, context: K, words: Vec<String>) {
        self.predictions.entry(context.into()).or_default().extend(words);
    }

    pub fn lookup(&self, reading: &str) -> Vec<String> {
        self.dictionary.get(reading).cloned().unwrap_or_default()
    }

    pub fn is_converting(&self) -> bool {
        !self.clauses.is_empty()
    }

    /// Reading fed since the last commit / cancel.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Best conversion of `reading` without touching session state.
    pub fn preview(&self, reading: &str) -> String {
        self.segment(reading).iter().map(|c| c.surface().to_string()).collect()
    }

    fn clause(&self, reading: String) -> Clause {
        let mut surfaces = self.lookup(&reading);
        if !surfaces.contains(&reading) {
            surfaces.push(reading.clone());
        }
        Clause {
            reading,
            surfaces,
            selected: 0,
        }
    }

    fn segment(&self, reading: &str) -> Vec<Clause> {
        let chars: Vec<char> = reading.chars().collect();
        let mut clauses = Vec::new();
        let mut unknown = String::new();
        let mut i = 0;

        while i < chars.len() {
            let max_len = self.max_reading_chars.min(chars.len() - i);
            let longest = (1..=max_len).rev().find_map(|len| {
                let key: String = chars[i..i + len].iter().collect();
                self.dictionary.contains_key(&key).then_some((key, len))
            });
            match longest {
                Some((key, len)) => {
                    if !unknown.is_empty() {
                        clauses.push(self.clause(std::mem::take(&mut unknown)));
                    }
                    clauses.push(self.clause(key));
                    i += len;
                }
                None => {
                    unknown.push(chars[i]);
                    i += 1;
                }
            }
        }
        if !unknown.is_empty() {
            clauses.push(self.clause(unknown));
        }
        clauses
    }

    fn candidate_id(&self, clause: usize, index: usize) -> CandidateId {
        CandidateId::new(format!("g{}-s{}-c{}", self.generation, clause, index))
    }

    fn parse_id(&self, id: &CandidateId) -> Option<(usize, usize)> {
        let mut parts = id.as_str().split('-');
        let generation: u64 = parts.next()?.strip_prefix('g')?.parse().ok()?;
        let clause = parts.next()?.strip_prefix('s')?.parse().ok()?;
        let index = parts.next()?.strip_prefix('c')?.parse().ok()?;
        if parts.next().is_some() || generation != self.generation {
            return None;
        }
        Some((clause, index))
    }

    fn end_session(&mut self) {
        self.input.clear();
        self.clauses.clear();
        self.focus = 0;
        self.generation += 1;
    }

    fn conversion_response(&self) -> ServiceResponse {
        let segments = self
            .clauses
            .iter()
            .enumerate()
            .map(|(i, c)| Segment::new(c.surface(), i == self.focus))
            .collect();
        let (candidates, focused_candidate) = match self.clauses.get(self.focus) {
            Some(clause) => (
                clause
                    .surfaces
                    .iter()
                    .enumerate()
                    .map(|(i, s)| Candidate::with_id(s.clone(), self.candidate_id(self.focus, i)))
                    .collect(),
                Some(clause.selected),
            ),
            None => (Vec::new(), None),
        };
        ServiceResponse {
            committed: None,
            segments: Some(segments),
            candidates,
            focused_candidate,
            consumed: true,
        }
    }

    fn ended(committed: Option<String>) -> ServiceResponse {
        ServiceResponse {
            committed,
            segments: Some(Vec::new()),
            consumed: true,
            ..ServiceResponse::default()
        }
    }

    fn rebuild_clause(&mut self, index: usize) {
        let reading = self.clauses[index].reading.clone();
        let clause = self.clause(reading);
        self.clauses[index] = clause;
    }

    fn shrink_focused(&mut self) {
        let focus = self.focus;
        if self.clauses[focus].reading.chars().count() <= 1 {
            return;
        }
        let Some(moved) = self.clauses[focus].reading.pop() else {
            return;
        };
        if focus + 1 < self.clauses.len() {
            self.clauses[focus + 1].reading.insert(0, moved);
            self.rebuild_clause(focus + 1);
        } else {
            let clause = self.clause(moved.to_string());
            self.clauses.push(clause);
        }
        self.rebuild_clause(focus);
    }

    fn expand_focused(&mut self) {
        let focus = self.focus;
        if focus + 1 >= self.clauses.len() {
            return;
        }
        let next = &mut self.clauses[focus + 1].reading;
        let Some(moved) = next.chars().next() else {
            return;
        };
        next.remove(0);
        if next.is_empty() {
            self.clauses.remove(focus + 1);
        } else {
            self.rebuild_clause(focus + 1);
        }
        self.clauses[focus].reading.push(moved);
        self.rebuild_clause(focus);
    }

    /// Converted text of all clauses.
    fn converted_text(&self) -> String {
        self.clauses.iter().map(Clause::surface).collect()
    }
}

impl ConversionService for TableConverter {
    fn feed(&mut self, ch: char) -> Result<ServiceResponse, ServiceError> {
        if self.is_converting() {
            self.clauses.clear();
            self.focus = 0;
        }
        self.input.push(ch);
        Ok(ServiceResponse {
            segments: Some(vec![Segment::plain(self.preview(&self.input))]),
            consumed: true,
            ..ServiceResponse::default()
        })
    }

    fn trigger_conversion(&mut self) -> Result<ServiceResponse, ServiceError> {
        if self.input.is_empty() {
            return Ok(Self::ended(None));
        }
        if self.is_converting() {
            return self.send_control_key(ControlKey::Convert);
        }
        self.generation += 1;
        self.clauses = self.segment(&self.input);
        self.focus = 0;
        debug!(input = %self.input, clauses = self.clauses.len(), "table conversion started");
        Ok(self.conversion_response())
    }

    fn send_control_key(&mut self, key: ControlKey) -> Result<ServiceResponse, ServiceError> {
        if !self.is_converting() {
            return Ok(ServiceResponse::default());
        }
        match key {
            ControlKey::Convert | ControlKey::Down => {
                let clause = &mut self.clauses[self.focus];
                clause.selected = (clause.selected + 1) % clause.surfaces.len().max(1);
            }
            ControlKey::Up => {
                let clause = &mut self.clauses[self.focus];
                let len = clause.surfaces.len().max(1);
                clause.selected = (clause.selected + len - 1) % len;
            }
            ControlKey::Left => self.focus = self.focus.saturating_sub(1),
            ControlKey::Right => self.focus = (self.focus + 1).min(self.clauses.len() - 1),
            ControlKey::ShrinkSegment => self.shrink_focused(),
            ControlKey::ExpandSegment => self.expand_focused(),
            ControlKey::PageUp | ControlKey::PageDown => {}
            ControlKey::Commit => {
                let text = self.converted_text();
                self.end_session();
                return Ok(Self::ended(Some(text)));
            }
        }
        Ok(self.conversion_response())
    }

    fn select_candidate(&mut self, id: &CandidateId) -> Result<ServiceResponse, ServiceError> {
        let (clause, index) = self
            .parse_id(id)
            .filter(|(c, i)| self.clauses.get(*c).map_or(false, |cl| *i < cl.surfaces.len()))
            .ok_or_else(|| ServiceError::Rejected(format!("unknown candidate id {}", id)))?;

        self.clauses[clause].selected = index;
        let rest = self.clauses.split_off(clause + 1);
        let committed = self.converted_text();

        if rest.is_empty() {
            self.end_session();
            return Ok(Self::ended(Some(committed)));
        }

        self.generation += 1;
        self.input = rest.iter().map(|c| c.reading.as_str()).collect();
        self.clauses = rest;
        self.focus = 0;
        Ok(ServiceResponse {
            committed: Some(committed),
            ..self.conversion_response()
        })
    }

    fn submit(&mut self) -> Result<Option<String>, ServiceError> {
        let text = if self.is_converting() {
            self.converted_text()
        } else {
            self.input.clone()
        };
        self.end_session();
        Ok((!text.is_empty()).then_some(text))
    }

    fn cancel(&mut self) -> Result<(), ServiceError> {
        self.end_session();
        Ok(())
    }

    fn request_prediction(
        &mut self,
        preceding: &str,
    ) -> Result<Option<ServiceResponse>, ServiceError> {
        // Longest suffix of the context that has predictions.
        let words = preceding
            .char_indices()
            .find_map(|(idx, _)| self.predictions.get(&preceding[idx..]))
            .filter(|w| !w.is_empty());
        let Some(words) = words else {
            return Ok(None);
        };
        let candidates = words
            .iter()
            .enumerate()
            .map(|(i, w)| {
                Candidate::with_id(w.clone(), CandidateId::new(format!("p{}-{}", self.generation, i)))
            })
            .collect();
        Ok(Some(ServiceResponse {
            candidates,
            focused_candidate: Some(0),
            consumed: true,
            ..ServiceResponse::default()
        }))
    }

    fn reconnect(&mut self) -> Result<(), ServiceError> {
        self.end_session();
        Ok(())
    }
}
