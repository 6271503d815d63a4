use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatdockErr>;

#[derive(Error, Debug)]
pub enum ChatdockErr {
    /// The server rejected the request before any stream was opened. The
    /// `detail` field carries the server-provided error body, when present.
    #[error("unexpected status {status}: {}", detail.as_deref().unwrap_or("<no detail>"))]
    UnexpectedStatus {
        status: StatusCode,
        detail: Option<String>,
    },

    /// Problem while consuming an already-open event stream.
    #[error("stream error: {0}")]
    Stream(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ChatdockErr {
    /// The fixed bot-message copy shown for this failure.
    ///
    /// A pre-stream rejection surfaces the server's detail text; everything
    /// else collapses to the generic connection message. Both are terminal
    /// for the request but never for the widget itself.
    pub fn user_message(&self) -> String {
        match self {
            ChatdockErr::UnexpectedStatus { detail, .. } => {
                format!("Error: {}", detail.as_deref().unwrap_or("Failed to search"))
            }
            _ => "Sorry, something went wrong. Please check your connection.".to_string(),
        }
    }
}
