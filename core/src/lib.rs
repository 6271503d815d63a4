//! Root of the `chatdock-core` library.
//!
//! Transport layer for the chatdock widget: the streaming search client,
//! the incremental `data: {JSON}` line parser, and the wire types shared
//! with the widget shell.

// Prevent accidental direct writes to stdout/stderr in library code. All
// user-visible output must go through the widget shell or the tracing stack.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod client;
pub mod config;
pub mod error;
mod flags;
pub mod protocol;
pub mod sse;

pub use client::ResponseStream;
pub use client::WidgetClient;
pub use config::Theme;
pub use config::WidgetConfig;
pub use error::ChatdockErr;
pub use error::Result;
pub use protocol::CompanyInfo;
pub use protocol::SearchResult;
pub use protocol::StreamEvent;
