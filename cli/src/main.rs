//! Entry-point for the `chatdock` binary: query a documentation knowledge
//! base from the terminal and stream the answer as it is generated.

use std::io::IsTerminal;
use std::io::Write;

use anyhow::Context;
use chatdock_core::StreamEvent;
use chatdock_core::WidgetClient;
use chatdock_core::WidgetConfig;
use clap::Parser;
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chatdock", version)]
struct Cli {
    /// Widget API key.
    #[arg(long, env = "CHATDOCK_API_KEY")]
    api_key: String,

    /// Restrict the search to one knowledge base.
    #[arg(long = "knowledge-base", value_name = "ID")]
    knowledge_base: Option<i64>,

    /// Override the widget API base URL.
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Emit the answer as rendered HTML instead of raw markdown text.
    #[arg(long)]
    html: bool,

    /// The question to ask.
    query: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = "error";
    let _ = tracing_subscriber::fmt()
        // Fall back to `default_level` if the environment variable is not
        // set or contains an invalid value.
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();

    let mut config = WidgetConfig::new(&cli.api_key);
    if let Some(id) = cli.knowledge_base {
        config = config.with_knowledge_base(id);
    }
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url);
    }

    let client = WidgetClient::new(config);
    let mut stream = client
        .stream_search(&cli.query)
        .await
        .context("search request failed")?;

    let mut stdout = std::io::stdout();
    let mut answer = String::new();
    while let Some(event) = stream.next().await {
        match event.context("response stream failed")? {
            StreamEvent::Text(text) => {
                if cli.html {
                    answer.push_str(&text);
                } else {
                    stdout.write_all(text.as_bytes())?;
                    stdout.flush()?;
                }
            }
            StreamEvent::Error(message) => {
                tracing::error!("server reported: {message}");
            }
            StreamEvent::Done => {}
        }
    }

    if cli.html {
        writeln!(stdout, "{}", chatdock_widget::render_markdown(&answer))?;
    } else {
        writeln!(stdout)?;
    }
    Ok(())
}
