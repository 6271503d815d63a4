use env_flags::env_flags;

env_flags! {
    /// Base URL of the widget API, used when the embedder does not set
    /// `api_url` explicitly.
    pub CHATDOCK_API_BASE: &str = "https://apiverse.smartbot.co.nz/api/widget";
}
