use std::collections::HashMap;

use chatdock_core::StreamEvent;
use chatdock_core::WidgetClient;
use chatdock_core::WidgetConfig;
use futures::StreamExt;
use tracing::debug;
use tracing::warn;

use crate::app_event::AppEvent;
use crate::app_event::AppEventSender;
use crate::markdown::escape_html;
use crate::markdown::render_markdown;
use crate::streaming::CURSOR_MARKER;
use crate::streaming::StreamingMessage;
use crate::styles::ensure_styles;
use crate::transcript::Document;
use crate::transcript::MessageCell;
use crate::transcript::NodeId;
use crate::transcript::Role;

/// Greeting seeded into a fresh panel.
const GREETING: &str =
    "\u{1f44b} Hello! How can I help you today? Ask me anything about our documents.";

const DEFAULT_COMPANY_NAME: &str = "Chatdock";
const DEFAULT_COMPANY_URL: &str = "https://chatdock.dev";

/// Lifecycle of the newest submitted query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryPhase {
    Idle,
    /// Submitted, no fragment yet: the "Thinking..." indicator shows.
    AwaitingResponse,
    /// First fragment received: the streaming node exists and carries the
    /// cursor marker.
    Streaming,
}

#[derive(Debug)]
enum StreamState {
    Awaiting,
    Streaming(StreamingMessage),
}

/// The widget shell: owns the document nodes, the open/close state, and the
/// per-query state machine. Transport tasks never touch it directly; they
/// emit [`AppEvent`]s that the embedder pumps through [`Self::handle_event`],
/// so every mutation is synchronous and ordered.
///
/// Overlapping queries are allowed: each submission gets a monotonically
/// increasing sequence number and its own message node, and all streams run
/// to completion. Only the highest sequence drives the indicator; stale
/// streams keep rendering into their own node harmlessly.
pub struct ChatWidget {
    client: WidgetClient,
    doc: Document,
    app_event_tx: AppEventSender,
    open: bool,
    next_seq: u64,
    current_seq: Option<u64>,
    streams: HashMap<u64, StreamState>,
    company_name: String,
    company_url: String,
}

impl ChatWidget {
    pub fn new(config: WidgetConfig, app_event_tx: AppEventSender) -> Self {
        let mut doc = Document::new();
        ensure_styles(&mut doc);
        let mut widget = Self {
            client: WidgetClient::new(config),
            doc,
            app_event_tx,
            open: false,
            next_seq: 0,
            current_seq: None,
            streams: HashMap::new(),
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            company_url: DEFAULT_COMPANY_URL.to_string(),
        };
        widget.push_bot_message(GREETING);
        widget
    }

    /// Presentational only; open/close never affects in-flight streams.
    pub fn toggle_open(&mut self) {
        self.open = !self.open;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn phase(&self) -> QueryPhase {
        match self.current_seq.and_then(|seq| self.streams.get(&seq)) {
            None => QueryPhase::Idle,
            Some(StreamState::Awaiting) => QueryPhase::AwaitingResponse,
            Some(StreamState::Streaming(_)) => QueryPhase::Streaming,
        }
    }

    /// True while the "Thinking..." indicator for the newest query shows.
    pub fn thinking(&self) -> bool {
        self.phase() == QueryPhase::AwaitingResponse
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn messages(&self) -> &[MessageCell] {
        self.doc.cells()
    }

    /// Submit a user query: append the user message, show the indicator, and
    /// spawn the transport task for this sequence number. Blank input is
    /// ignored. Submission is never blocked by an in-flight stream.
    pub fn submit(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        let seq = self.begin_query(query);

        let client = self.client.clone();
        let tx = self.app_event_tx.clone();
        let query = query.to_string();
        tokio::spawn(async move {
            match client.stream_search(&query).await {
                Ok(mut stream) => {
                    while let Some(item) = stream.next().await {
                        match item {
                            Ok(event) => tx.send(AppEvent::Stream { seq, event }),
                            Err(err) => {
                                tx.send(AppEvent::StreamFailed {
                                    seq,
                                    message: err.user_message(),
                                });
                                return;
                            }
                        }
                    }
                    tx.send(AppEvent::StreamClosed { seq });
                }
                Err(err) => tx.send(AppEvent::RequestFailed {
                    seq,
                    message: err.user_message(),
                }),
            }
        });
    }

    /// Kick off the non-critical footer metadata fetch. Failures are logged
    /// and ignored.
    pub fn refresh_company_info(&self) {
        let client = self.client.clone();
        let tx = self.app_event_tx.clone();
        tokio::spawn(async move {
            match client.fetch_company_info().await {
                Ok(info) => tx.send(AppEvent::CompanyInfo(info)),
                Err(err) => warn!("failed to fetch company info: {err}"),
            }
        });
    }

    /// Apply one event from a transport task. All mutation happens here, on
    /// the embedder's thread, in arrival order.
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Stream { seq, event } => self.on_stream_event(seq, event),
            AppEvent::StreamClosed { seq } => self.finalize(seq, None),
            AppEvent::StreamFailed { seq, message } => self.finalize(seq, Some(message)),
            AppEvent::RequestFailed { seq, message } => {
                self.streams.remove(&seq);
                if self.current_seq == Some(seq) {
                    self.current_seq = None;
                }
                self.push_bot_message(&message);
            }
            AppEvent::CompanyInfo(info) => {
                if let Some(name) = info.company_name {
                    self.company_name = name;
                }
                if let Some(url) = info.company_url {
                    self.company_url = url;
                }
            }
        }
    }

    /// Footer attribution string.
    pub fn powered_by_html(&self) -> String {
        format!(
            "Powered by <a href=\"{}\" target=\"_blank\">{}</a>",
            self.company_url,
            escape_html(&self.company_name)
        )
    }

    /// Full widget markup: floating toggle button plus the collapsible panel
    /// with header, message list, input area, and attribution footer.
    pub fn container_html(&self) -> String {
        let mut html = String::from("<div id=\"chatdock-container\">");
        html.push_str(&format!(
            "<div class=\"chatdock-window{}\">",
            if self.open { " open" } else { "" }
        ));
        html.push_str(
            "<div class=\"chatdock-header\"><span class=\"chatdock-title\">AI Assistant</span>\
             <button class=\"chatdock-close\">\u{d7}</button></div>",
        );
        html.push_str("<div class=\"chatdock-content\">");
        for cell in self.doc.cells() {
            let role = match cell.role {
                Role::User => "user",
                Role::Bot => "bot",
            };
            let streaming = if cell.streaming { " streaming" } else { "" };
            html.push_str(&format!(
                "<div class=\"chatdock-message {role}{streaming}\">{}</div>",
                cell.inner_html
            ));
        }
        if self.thinking() {
            html.push_str("<div class=\"chatdock-loading\">Thinking...</div>");
        }
        html.push_str("</div>");
        html.push_str(
            "<div class=\"chatdock-input-area\">\
             <input type=\"text\" class=\"chatdock-input\" placeholder=\"Type your question...\">\
             <button class=\"chatdock-send\">Send</button></div>",
        );
        html.push_str(&format!(
            "<div class=\"chatdock-powered\">{}</div>",
            self.powered_by_html()
        ));
        html.push_str("</div>");
        html.push_str("<button class=\"chatdock-button\" aria-label=\"Open chat\"></button>");
        html.push_str("</div>");
        html
    }

    /// Synchronous half of [`Self::submit`]: records the user message and
    /// registers the sequence number as the current query.
    fn begin_query(&mut self, query: &str) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.doc.push_cell(MessageCell {
            role: Role::User,
            inner_html: escape_html(query),
            streaming: false,
        });
        self.streams.insert(seq, StreamState::Awaiting);
        self.current_seq = Some(seq);
        seq
    }

    fn on_stream_event(&mut self, seq: u64, event: StreamEvent) {
        if matches!(event, StreamEvent::Done) {
            // Advisory only: the transport close finalizes the node.
            return;
        }
        let Some(state) = self.streams.get_mut(&seq) else {
            debug!(seq, "stream event for unknown query; dropping");
            return;
        };
        if matches!(state, StreamState::Awaiting) {
            let node = self.doc.push_cell(MessageCell {
                role: Role::Bot,
                inner_html: CURSOR_MARKER.to_string(),
                streaming: true,
            });
            *state = StreamState::Streaming(StreamingMessage::new(node));
        }
        let StreamState::Streaming(msg) = state else {
            return;
        };
        match event {
            StreamEvent::Text(text) => msg.push_fragment(&text),
            StreamEvent::Error(message) => msg.push_error(&message),
            StreamEvent::Done => {}
        }
        let node = msg.node();
        let html = msg.html();
        if let Some(cell) = self.doc.cell_mut(node) {
            cell.inner_html = html;
        }
    }

    /// Terminal transition for one stream: render the buffer once more
    /// without the cursor marker and mark the node non-streaming. A stream
    /// that closed before any fragment just clears the indicator; no empty
    /// bubble is left behind. A failure message, when present, is appended
    /// as its own bot message.
    fn finalize(&mut self, seq: u64, failure: Option<String>) {
        match self.streams.remove(&seq) {
            Some(StreamState::Streaming(msg)) => {
                let html = msg.final_html();
                if let Some(cell) = self.doc.cell_mut(msg.node()) {
                    cell.inner_html = html;
                    cell.streaming = false;
                }
            }
            Some(StreamState::Awaiting) => {}
            None => debug!(seq, "finalize for unknown query; dropping"),
        }
        if self.current_seq == Some(seq) {
            self.current_seq = None;
        }
        if let Some(message) = failure {
            self.push_bot_message(&message);
        }
    }

    fn push_bot_message(&mut self, text: &str) -> NodeId {
        self.doc.push_cell(MessageCell {
            role: Role::Bot,
            inner_html: render_markdown(text),
            streaming: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::unbounded_channel;

    fn widget() -> ChatWidget {
        let (tx, _rx) = unbounded_channel();
        ChatWidget::new(
            WidgetConfig::new("wk_test").with_api_url("http://localhost:0"),
            AppEventSender::new(tx),
        )
    }

    fn stream(seq: u64, event: StreamEvent) -> AppEvent {
        AppEvent::Stream { seq, event }
    }

    #[test]
    fn panel_seeds_greeting_and_starts_closed() {
        let w = widget();
        assert!(!w.is_open());
        assert_eq!(w.messages().len(), 1);
        assert_eq!(w.messages()[0].role, Role::Bot);
        assert!(w.messages()[0].inner_html.contains("How can I help you today?"));
    }

    #[test]
    fn toggle_is_presentational() {
        let mut w = widget();
        w.toggle_open();
        assert!(w.is_open());
        w.toggle_open();
        assert!(!w.is_open());
    }

    #[test]
    fn user_text_is_escaped_into_the_cell() {
        let mut w = widget();
        w.begin_query("<b>hi</b> & bye");
        let cell = &w.messages()[1];
        assert_eq!(cell.role, Role::User);
        assert_eq!(cell.inner_html, "&lt;b&gt;hi&lt;/b&gt; &amp; bye");
    }

    #[test]
    fn fragments_accumulate_and_finalize_without_cursor() {
        let mut w = widget();
        let seq = w.begin_query("hello");
        assert_eq!(w.phase(), QueryPhase::AwaitingResponse);

        for fragment in ["Hel", "lo **wor", "ld**"] {
            w.handle_event(stream(seq, StreamEvent::Text(fragment.to_string())));
        }
        assert_eq!(w.phase(), QueryPhase::Streaming);
        let node = &w.messages()[2];
        assert!(node.streaming);
        assert_eq!(
            node.inner_html,
            format!("<p>Hello <strong>world</strong></p>{CURSOR_MARKER}")
        );

        w.handle_event(AppEvent::StreamClosed { seq });
        let node = &w.messages()[2];
        assert!(!node.streaming);
        assert_eq!(node.inner_html, render_markdown("Hello **world**"));
        assert_eq!(w.phase(), QueryPhase::Idle);
    }

    #[test]
    fn error_fragment_appends_annotation_and_keeps_streaming() {
        let mut w = widget();
        let seq = w.begin_query("hello");
        w.handle_event(stream(seq, StreamEvent::Text("Partial answer".to_string())));
        w.handle_event(stream(seq, StreamEvent::Error("rate limited".to_string())));
        w.handle_event(AppEvent::StreamClosed { seq });

        assert_eq!(
            w.messages()[2].inner_html,
            "<p>Partial answer</p><p>Error: rate limited</p>"
        );
    }

    #[test]
    fn done_is_advisory_and_later_fragments_still_render() {
        let mut w = widget();
        let seq = w.begin_query("hello");
        w.handle_event(stream(seq, StreamEvent::Text("a".to_string())));
        w.handle_event(stream(seq, StreamEvent::Done));
        w.handle_event(stream(seq, StreamEvent::Text("b".to_string())));
        w.handle_event(AppEvent::StreamClosed { seq });
        assert_eq!(w.messages()[2].inner_html, "<p>ab</p>");
    }

    #[test]
    fn request_failure_surfaces_server_detail_as_bot_message() {
        let mut w = widget();
        let seq = w.begin_query("hello");
        w.handle_event(AppEvent::RequestFailed {
            seq,
            message: "Error: Too many requests".to_string(),
        });
        assert_eq!(w.phase(), QueryPhase::Idle);
        assert_eq!(
            w.messages()[2].inner_html,
            "<p>Error: Too many requests</p>"
        );
    }

    #[test]
    fn mid_stream_failure_finalizes_node_and_appends_generic_message() {
        let mut w = widget();
        let seq = w.begin_query("hello");
        w.handle_event(stream(seq, StreamEvent::Text("partial".to_string())));
        w.handle_event(AppEvent::StreamFailed {
            seq,
            message: "Sorry, something went wrong. Please check your connection.".to_string(),
        });

        let partial = &w.messages()[2];
        assert!(!partial.streaming);
        assert_eq!(partial.inner_html, "<p>partial</p>");
        assert_eq!(
            w.messages()[3].inner_html,
            "<p>Sorry, something went wrong. Please check your connection.</p>"
        );
        assert_eq!(w.phase(), QueryPhase::Idle);
    }

    #[test]
    fn stream_that_closes_without_fragments_leaves_no_bubble() {
        let mut w = widget();
        let seq = w.begin_query("hello");
        w.handle_event(AppEvent::StreamClosed { seq });
        assert_eq!(w.phase(), QueryPhase::Idle);
        // Greeting + user message only.
        assert_eq!(w.messages().len(), 2);
    }

    #[test]
    fn overlapping_queries_render_into_their_own_nodes() {
        let mut w = widget();
        let first = w.begin_query("first");
        w.handle_event(stream(first, StreamEvent::Text("one".to_string())));

        let second = w.begin_query("second");
        // The newest submission owns the indicator.
        assert_eq!(w.phase(), QueryPhase::AwaitingResponse);

        // The stale stream keeps rendering into its own node.
        w.handle_event(stream(first, StreamEvent::Text(" more".to_string())));
        assert_eq!(w.phase(), QueryPhase::AwaitingResponse);

        w.handle_event(stream(second, StreamEvent::Text("two".to_string())));
        assert_eq!(w.phase(), QueryPhase::Streaming);

        w.handle_event(AppEvent::StreamClosed { seq: first });
        w.handle_event(AppEvent::StreamClosed { seq: second });
        assert_eq!(w.phase(), QueryPhase::Idle);

        let bot_html: Vec<&str> = w
            .messages()
            .iter()
            .filter(|c| c.role == Role::Bot && !c.inner_html.contains("How can I help"))
            .map(|c| c.inner_html.as_str())
            .collect();
        assert_eq!(bot_html, vec!["<p>one more</p>", "<p>two</p>"]);
    }

    #[test]
    fn events_after_finalize_are_dropped() {
        let mut w = widget();
        let seq = w.begin_query("hello");
        w.handle_event(stream(seq, StreamEvent::Text("done".to_string())));
        w.handle_event(AppEvent::StreamClosed { seq });
        let before = w.messages().len();
        w.handle_event(stream(seq, StreamEvent::Text("late".to_string())));
        assert_eq!(w.messages().len(), before);
        assert_eq!(w.messages()[2].inner_html, "<p>done</p>");
    }

    #[test]
    fn company_info_relabels_the_footer() {
        let mut w = widget();
        assert!(w.powered_by_html().contains("Chatdock"));
        w.handle_event(AppEvent::CompanyInfo(chatdock_core::CompanyInfo {
            company_name: Some("Acme Docs".to_string()),
            company_url: Some("https://docs.acme.test".to_string()),
        }));
        assert_eq!(
            w.powered_by_html(),
            "Powered by <a href=\"https://docs.acme.test\" target=\"_blank\">Acme Docs</a>"
        );
    }

    #[test]
    fn container_html_reflects_state() {
        let mut w = widget();
        assert!(!w.container_html().contains("chatdock-window open"));
        w.toggle_open();
        let seq = w.begin_query("hi");
        let html = w.container_html();
        assert!(html.contains("chatdock-window open"));
        assert!(html.contains("Thinking..."));
        w.handle_event(stream(seq, StreamEvent::Text("yo".to_string())));
        let html = w.container_html();
        assert!(!html.contains("Thinking..."));
        assert!(html.contains("chatdock-message bot streaming"));
    }
}
