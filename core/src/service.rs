//! Contract of the external conversion service.
//!
//! The converter (a morphological analyser running out of process, or the
//! in-process [`TableConverter`](crate::TableConverter)) turns composed text
//! into clauses and candidates. Every call returns a [`ServiceResponse`]; the
//! engine never pokes at its optional fields directly but matches on
//! [`ServiceResponse::shape`].
//!
//! Calls can fail (timeout, transport, lost session). Call sites wrap them in
//! [`with_resync`], which re-establishes the session, replays the steps needed
//! to get back to the pre-failure point and retries exactly once.

use crate::candidate::{Candidate, CandidateId};
use crate::composition::Segment;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("conversion service timed out after {0:?}")]
    Timeout(Duration),
    #[error("conversion service transport failure: {0}")]
    Transport(String),
    #[error("conversion session lost")]
    SessionLost,
    #[error("conversion service rejected request: {0}")]
    Rejected(String),
}

impl ServiceError {
    /// Whether a reconnect and replay can help. A rejection is the service
    /// refusing the request itself, so repeating it would fail the same way.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ServiceError::Rejected(_))
    }
}

/// Non-character keys forwarded while converting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKey {
    /// Next candidate / convert again (Space)
    Convert,
    /// Commit everything (Enter)
    Commit,
    /// Previous candidate
    Up,
    /// Next candidate
    Down,
    /// Focus previous clause
    Left,
    /// Focus next clause
    Right,
    /// Make the focused clause one character shorter
    ShrinkSegment,
    /// Make the focused clause one character longer
    ExpandSegment,
    PageUp,
    PageDown,
}

/// Raw response bundle of one service call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceResponse {
    pub committed: Option<String>,
    /// `Some(vec![])` means the conversion ended.
    pub segments: Option<Vec<Segment>>,
    pub candidates: Vec<Candidate>,
    pub focused_candidate: Option<usize>,
    pub consumed: bool,
}

/// Segmented pre-edit carried by a response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PendingConversion {
    pub segments: Vec<Segment>,
    pub candidates: Vec<Candidate>,
    pub focused_candidate: Option<usize>,
}

impl PendingConversion {
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// What a response means for the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// Text was committed; `follow_up` holds remaining clauses, if any.
    Committed {
        text: String,
        follow_up: Option<PendingConversion>,
    },
    /// Clauses to render, nothing committed.
    Segmented(PendingConversion),
    /// Empty segments and no commit: the service dropped the conversion.
    Dropped,
    /// The response says nothing about the pre-edit.
    Unchanged,
}

impl ServiceResponse {
    pub fn consumed() -> Self {
        Self {
            consumed: true,
            ..Self::default()
        }
    }

    pub fn shape(self) -> ResponseShape {
        let pending = |segments: Vec<Segment>, candidates, focused_candidate| PendingConversion {
            segments,
            candidates,
            focused_candidate,
        };
        let committed = self.committed.filter(|t| !t.is_empty());
        match (committed, self.segments) {
            (Some(text), Some(segments)) if !segments.is_empty() => ResponseShape::Committed {
                text,
                follow_up: Some(pending(segments, self.candidates, self.focused_candidate)),
            },
            (Some(text), _) => ResponseShape::Committed {
                text,
                follow_up: None,
            },
            (None, Some(segments)) if segments.is_empty() => ResponseShape::Dropped,
            (None, Some(segments)) => {
                ResponseShape::Segmented(pending(segments, self.candidates, self.focused_candidate))
            }
            (None, None) => ResponseShape::Unchanged,
        }
    }
}

pub trait ConversionService {
    /// Append one character to the service's composition.
    fn feed(&mut self, ch: char) -> Result<ServiceResponse, ServiceError>;

    fn trigger_conversion(&mut self) -> Result<ServiceResponse, ServiceError>;

    fn send_control_key(&mut self, key: ControlKey) -> Result<ServiceResponse, ServiceError>;

    fn select_candidate(&mut self, id: &CandidateId) -> Result<ServiceResponse, ServiceError>;

    /// Finalize whatever is being converted and return it.
    fn submit(&mut self) -> Result<Option<String>, ServiceError>;

    /// Drop the current composition without committing.
    fn cancel(&mut self) -> Result<(), ServiceError>;

    /// Predictive candidates following `preceding`.
    fn request_prediction(
        &mut self,
        preceding: &str,
    ) -> Result<Option<ServiceResponse>, ServiceError>;

    /// Re-establish the session after a failure. Service-side state is gone
    /// afterwards.
    fn reconnect(&mut self) -> Result<(), ServiceError>;
}

/// Steps replayed after a reconnect to reach the pre-failure state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResyncStep {
    Feed(String),
    Convert,
}

/// Feed every character of `text`, returning the last response.
pub fn feed_str(
    service: &mut dyn ConversionService,
    text: &str,
) -> Result<ServiceResponse, ServiceError> {
    let mut last = ServiceResponse::consumed();
    for ch in text.chars() {
        last = service.feed(ch)?;
    }
    Ok(last)
}

fn replay(service: &mut dyn ConversionService, steps: &[ResyncStep]) -> Result<(), ServiceError> {
    for step in steps {
        match step {
            ResyncStep::Feed(text) => {
                feed_str(service, text)?;
            }
            ResyncStep::Convert => {
                service.trigger_conversion()?;
            }
        }
    }
    Ok(())
}

/// Run `op`; on a retryable failure reconnect, replay `resync` and run `op`
/// once more. Rejections are returned as they are.
pub fn with_resync<T, F>(
    service: &mut dyn ConversionService,
    resync: &[ResyncStep],
    mut op: F,
) -> Result<T, ServiceError>
where
    F: FnMut(&mut dyn ConversionService) -> Result<T, ServiceError>,
{
    let first = match op(service) {
        Ok(value) => return Ok(value),
        Err(e) if !e.is_retryable() => {
            debug!(error = %e, "conversion service rejected request");
            return Err(e);
        }
        Err(e) => e,
    };
    warn!(error = %first, steps = resync.len(), "conversion service call failed, resyncing");

    let retried = service
        .reconnect()
        .and_then(|_| replay(service, resync))
        .and_then(|_| op(service));
    match retried {
        Ok(value) => {
            debug!("conversion service call succeeded after resync");
            Ok(value)
        }
        Err(e) => {
            warn!(error = %e, "conversion service retry failed");
            Err(e)
        }
    }
}
