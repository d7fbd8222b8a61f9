//! HTTP client for an out-of-process kana-kanji converter.
//!
//! Uses the `reqwest` blocking client, so no async runtime is needed. Every
//! request carries the configured timeout.
//!
//! Wire protocol (JSON):
//! - `POST {endpoint}/session` → `{"session": "<id>"}` opens a session
//! - `POST {endpoint}/session/<id>` with `{"op": "feed", "ch": "k"}`,
//!   `{"op": "convert"}`, `{"op": "control", "key": "down"}`,
//!   `{"op": "select", "candidate": "<id>"}`, `{"op": "submit"}` or
//!   `{"op": "cancel"}` → a response bundle
//! - `GET {endpoint}/predict?context=<text>` → a response bundle
//!
//! A response bundle is
//! `{"committed": "..", "segments": [{"text": "..", "focused": true}],
//!   "candidates": [{"text": "..", "id": ".."}], "focused_candidate": 0,
//!   "consumed": true}` with every field optional.
//! Status 404 and 410 on a session URL mean the session is gone.

use libcompose_core::{
    Candidate, CandidateId, ControlKey, ConversionService, Segment, ServiceError, ServiceResponse,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    Feed { ch: char },
    Convert,
    Control { key: &'static str },
    Select { candidate: &'a str },
    Submit,
    Cancel,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireResponse {
    committed: Option<String>,
    segments: Option<Vec<Segment>>,
    candidates: Vec<Candidate>,
    focused_candidate: Option<usize>,
    consumed: bool,
}

impl From<WireResponse> for ServiceResponse {
    fn from(wire: WireResponse) -> Self {
        ServiceResponse {
            committed: wire.committed,
            segments: wire.segments,
            candidates: wire.candidates,
            focused_candidate: wire.focused_candidate,
            consumed: wire.consumed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionReply {
    session: String,
}

fn control_name(key: ControlKey) -> &'static str {
    match key {
        ControlKey::Convert => "convert",
        ControlKey::Commit => "commit",
        ControlKey::Up => "up",
        ControlKey::Down => "down",
        ControlKey::Left => "left",
        ControlKey::Right => "right",
        ControlKey::ShrinkSegment => "shrink",
        ControlKey::ExpandSegment => "expand",
        ControlKey::PageUp => "page_up",
        ControlKey::PageDown => "page_down",
    }
}

/// `ConversionService` talking to a converter over HTTP.
pub struct RemoteConverter {
    endpoint: String,
    timeout: Duration,
    client: reqwest::blocking::Client,
    session: Option<String>,
}

impl RemoteConverter {
    pub fn new<S: Into<String>>(endpoint: S, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            timeout,
            client,
            session: None,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    fn map_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_timeout() {
            return ServiceError::Timeout(self.timeout);
        }
        match e.status() {
            Some(status) if status.as_u16() == 404 || status.as_u16() == 410 => {
                ServiceError::SessionLost
            }
            Some(status) => ServiceError::Rejected(status.to_string()),
            None => ServiceError::Transport(e.to_string()),
        }
    }

    fn open_session(&mut self) -> Result<String, ServiceError> {
        let url = format!("{}/session", self.endpoint);
        let reply: SessionReply = self
            .client
            .post(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| self.map_error(e))?;
        debug!(session = %reply.session, "opened remote conversion session");
        self.session = Some(reply.session.clone());
        Ok(reply.session)
    }

    fn session_url(&mut self) -> Result<String, ServiceError> {
        let session = match &self.session {
            Some(session) => session.clone(),
            None => self.open_session()?,
        };
        Ok(format!(
            "{}/session/{}",
            self.endpoint,
            urlencoding::encode(&session)
        ))
    }

    fn call(&mut self, request: Request<'_>) -> Result<ServiceResponse, ServiceError> {
        let url = self.session_url()?;
        let wire: WireResponse = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| self.map_error(e))?;
        Ok(wire.into())
    }
}

impl ConversionService for RemoteConverter {
    fn feed(&mut self, ch: char) -> Result<ServiceResponse, ServiceError> {
        self.call(Request::Feed { ch })
    }

    fn trigger_conversion(&mut self) -> Result<ServiceResponse, ServiceError> {
        self.call(Request::Convert)
    }

    fn send_control_key(&mut self, key: ControlKey) -> Result<ServiceResponse, ServiceError> {
        self.call(Request::Control {
            key: control_name(key),
        })
    }

    fn select_candidate(&mut self, id: &CandidateId) -> Result<ServiceResponse, ServiceError> {
        self.call(Request::Select {
            candidate: id.as_str(),
        })
    }

    fn submit(&mut self) -> Result<Option<String>, ServiceError> {
        let response = self.call(Request::Submit)?;
        Ok(response.committed.filter(|t| !t.is_empty()))
    }

    fn cancel(&mut self) -> Result<(), ServiceError> {
        if self.session.is_none() {
            return Ok(());
        }
        self.call(Request::Cancel).map(|_| ())
    }

    fn request_prediction(
        &mut self,
        preceding: &str,
    ) -> Result<Option<ServiceResponse>, ServiceError> {
        if preceding.is_empty() {
            return Ok(None);
        }
        let url = format!(
            "{}/predict?context={}",
            self.endpoint,
            urlencoding::encode(preceding)
        );
        let wire: WireResponse = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| self.map_error(e))?;
        if wire.candidates.is_empty() {
            return Ok(None);
        }
        Ok(Some(wire.into()))
    }

    fn reconnect(&mut self) -> Result<(), ServiceError> {
        self.session = None;
        self.open_session().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_encoding() {
        let body = serde_json::to_value(Request::Feed { ch: 'k' }).unwrap();
        assert_eq!(body, serde_json::json!({"op": "feed", "ch": "k"}));

        let body = serde_json::to_value(Request::Control {
            key: control_name(ControlKey::PageDown),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"op": "control", "key": "page_down"}));

        let body = serde_json::to_value(Request::Submit).unwrap();
        assert_eq!(body, serde_json::json!({"op": "submit"}));
    }

    #[test]
    fn test_partial_response_decoding() {
        let wire: WireResponse = serde_json::from_str(
            r#"{"segments": [{"text": "今日", "focused": true}],
                "candidates": [{"text": "今日", "id": "g1:0"}, {"text": "京"}]}"#,
        )
        .unwrap();
        let response = ServiceResponse::from(wire);
        assert!(response.committed.is_none());
        assert!(!response.consumed);
        assert_eq!(response.segments.unwrap()[0].text, "今日");
        assert_eq!(
            response.candidates[0].id,
            Some(CandidateId::new("g1:0"))
        );
        assert!(response.candidates[1].id.is_none());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let remote = RemoteConverter::new("http://localhost:8080/", Duration::from_millis(50)).unwrap();
        assert_eq!(remote.endpoint(), "http://localhost:8080");
        assert!(remote.session().is_none());
    }

    #[test]
    fn test_cancel_without_session_is_local() {
        let mut remote = RemoteConverter::new("http://127.0.0.1:1", Duration::from_millis(50)).unwrap();
        assert!(remote.cancel().is_ok());
        assert_eq!(remote.request_prediction("").unwrap(), None);
    }

    #[test]
    fn test_unreachable_endpoint_is_an_error() {
        let mut remote = RemoteConverter::new("http://127.0.0.1:1", Duration::from_millis(200)).unwrap();
        assert!(remote.feed('a').is_err());
        assert!(remote.session().is_none());
    }
}
