//! Events flowing from spawned transport tasks back into the widget.
//!
//! All widget mutation happens on the embedder's side when it pumps these
//! events through [`crate::ChatWidget::handle_event`], so the shell state is
//! never touched concurrently.

use chatdock_core::CompanyInfo;
use chatdock_core::StreamEvent;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug)]
pub enum AppEvent {
    /// One parsed stream event for the query with this sequence number.
    Stream { seq: u64, event: StreamEvent },
    /// The transport closed the stream: the authoritative terminator.
    StreamClosed { seq: u64 },
    /// The open stream failed mid-flight; `message` is the user-facing copy.
    StreamFailed { seq: u64, message: String },
    /// The request was rejected before any stream was opened.
    RequestFailed { seq: u64, message: String },
    /// Company attribution metadata arrived.
    CompanyInfo(CompanyInfo),
}

#[derive(Clone, Debug)]
pub struct AppEventSender {
    tx: UnboundedSender<AppEvent>,
}

impl AppEventSender {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    /// Send an event. If the receiver is gone, swallow the error and log it;
    /// a torn-down embedder just means nobody is painting anymore.
    pub fn send(&self, event: AppEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::error!("failed to send app event: {e}");
        }
    }
}
