//! Wire types for the widget API.

use serde::Deserialize;

/// One server-pushed unit of a streaming search response.
///
/// Events arrive in order. `Done` is advisory only: the transport's
/// end-of-stream is the authoritative terminator, since the connection can
/// close without an explicit `done` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental answer fragment to append.
    Text(String),
    /// Error annotation to append to the in-progress message.
    Error(String),
    /// Advisory end-of-answer marker.
    Done,
}

/// Raw shape of one `data:` record. A single record may combine fields,
/// e.g. `{"text": "...", "done": true}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawStreamEvent {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RawStreamEvent {
    /// Lower the raw record into ordered typed events.
    ///
    /// `done` suppresses an `error` carried by the same record: once a
    /// record says done, its error field is not inspected.
    pub(crate) fn into_events(self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if let Some(text) = self.text {
            events.push(StreamEvent::Text(text));
        }
        if self.done.unwrap_or(false) {
            events.push(StreamEvent::Done);
        } else if let Some(error) = self.error {
            events.push(StreamEvent::Error(error));
        }
        events
    }
}

/// Response body of the legacy non-streaming `/search` endpoint. Superseded
/// by the streaming variant but still part of the supported contract.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    pub text: String,
}

/// Error body accompanying a non-2xx status.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

/// Company attribution metadata, used only to relabel the footer string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompanyInfo {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_url: Option<String>,
}
