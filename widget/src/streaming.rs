//! Per-response accumulation state.

use crate::markdown::render_markdown;
use crate::transcript::NodeId;

/// Trailing indicator appended only while the response is still streaming.
pub const CURSOR_MARKER: &str = "<span class=\"cursor\">\u{258b}</span>";

/// Running state for one in-flight bot response: the raw accumulated text
/// and the transcript node owning its rendered HTML.
///
/// The visible HTML is always re-derived from the complete buffer, never
/// from the latest fragment alone, so markdown constructs spanning fragment
/// boundaries stay consistent. Buffers are short-lived chat messages, so the
/// full re-parse per fragment is cheap.
#[derive(Debug)]
pub struct StreamingMessage {
    node: NodeId,
    buffer: String,
}

impl StreamingMessage {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            buffer: String::new(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Append an incremental text fragment.
    pub fn push_fragment(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Append a double-newline-separated error annotation.
    pub fn push_error(&mut self, message: &str) {
        self.buffer.push_str("\n\nError: ");
        self.buffer.push_str(message);
    }

    /// Full render of the accumulated buffer plus the cursor marker.
    pub fn html(&self) -> String {
        format!("{}{CURSOR_MARKER}", render_markdown(&self.buffer))
    }

    /// Final render, without the cursor marker.
    pub fn final_html(&self) -> String {
        render_markdown(&self.buffer)
    }
}
