use serde::Deserialize;

use crate::flags::CHATDOCK_API_BASE;

/// Immutable widget configuration, supplied once at initialization.
///
/// Mirrors the embed snippet's init object: only `api_key` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct WidgetConfig {
    /// Opaque credential sent as the `x-api-key` header on every request.
    pub api_key: String,

    /// Optional identifier scoping queries to one document collection.
    #[serde(default)]
    pub knowledge_base_id: Option<i64>,

    /// Base URL of the widget API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Accepted for forward compatibility; not currently consumed for
    /// behavior.
    #[serde(default)]
    pub theme: Option<Theme>,
}

/// Cosmetic knobs passed through from the embed snippet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Theme {
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

fn default_api_url() -> String {
    (*CHATDOCK_API_BASE).to_string()
}

impl WidgetConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            knowledge_base_id: None,
            api_url: default_api_url(),
            theme: None,
        }
    }

    pub fn with_knowledge_base(mut self, id: i64) -> Self {
        self.knowledge_base_id = Some(id);
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}
