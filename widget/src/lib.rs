//! Embeddable chat widget shell: transcript state, incremental markdown
//! rendering, and the event plumbing between transport tasks and the
//! embedder's paint loop.

#![deny(clippy::print_stdout, clippy::print_stderr)]

mod app_event;
mod chatwidget;
pub mod markdown;
mod streaming;
mod styles;
mod transcript;

pub use app_event::AppEvent;
pub use app_event::AppEventSender;
pub use chatwidget::ChatWidget;
pub use chatwidget::QueryPhase;
pub use markdown::escape_html;
pub use markdown::render_markdown;
pub use streaming::CURSOR_MARKER;
pub use streaming::StreamingMessage;
pub use styles::WIDGET_STYLE_ID;
pub use styles::ensure_styles;
pub use transcript::Document;
pub use transcript::MessageCell;
pub use transcript::NodeId;
pub use transcript::Role;
