//! Incremental parser for the newline-delimited `data: {JSON}` stream.

use bytes::BytesMut;
use tracing::debug;

use crate::protocol::RawStreamEvent;
use crate::protocol::StreamEvent;

/// Prefix framing each candidate event record.
const DATA_PREFIX: &str = "data: ";

/// Splits decoded chunks into event records, one record per line.
///
/// Chunks may slice a record anywhere, so the trailing unterminated bytes are
/// carried over and re-examined once the next chunk (or end-of-stream)
/// arrives. A record split across a read boundary is therefore reassembled
/// rather than dropped; only genuinely malformed JSON is discarded.
#[derive(Debug, Default)]
pub struct SseLineParser {
    buf: BytesMut,
}

impl SseLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk; returns the events completed by it.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line = self.buf.split_to(pos + 1);
            if let Ok(text) = std::str::from_utf8(&line) {
                parse_line(text.trim_end_matches(['\r', '\n']), &mut events);
            }
        }
        events
    }

    /// Flush the carried partial line at end-of-stream so a final
    /// unterminated record still counts.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        let line = self.buf.split();
        if let Ok(text) = std::str::from_utf8(&line) {
            parse_line(text.trim_end_matches('\r'), &mut events);
        }
        events
    }
}

fn parse_line(line: &str, events: &mut Vec<StreamEvent>) {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return;
    };
    match serde_json::from_str::<RawStreamEvent>(payload) {
        Ok(raw) => events.extend(raw.into_events()),
        Err(err) => debug!("dropping malformed stream record: {err}"),
    }
}
