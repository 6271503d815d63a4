use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

use bytes::Bytes;
use futures::Stream;
use futures::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::trace;

use crate::config::WidgetConfig;
use crate::error::ChatdockErr;
use crate::error::Result;
use crate::protocol::CompanyInfo;
use crate::protocol::ErrorBody;
use crate::protocol::SearchResponse;
use crate::protocol::SearchResult;
use crate::protocol::StreamEvent;
use crate::sse::SseLineParser;

/// Header carrying the widget credential.
const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for the widget API. Cheap to clone; the underlying
/// `reqwest::Client` is shared.
#[derive(Clone, Debug)]
pub struct WidgetClient {
    client: reqwest::Client,
    config: WidgetConfig,
}

impl WidgetClient {
    pub fn new(config: WidgetConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.api_url.trim_end_matches('/'))
    }

    fn query_body(&self, query: &str) -> serde_json::Value {
        let mut body = json!({ "query": query });
        if let Some(id) = self.config.knowledge_base_id {
            body["knowledge_base_id"] = json!(id);
        }
        body
    }

    /// Open a streaming search request.
    ///
    /// On success the returned stream yields parsed [`StreamEvent`]s in
    /// arrival order and terminates when the server closes the connection.
    /// A non-2xx status never opens a stream: the server's `{detail}` body is
    /// surfaced through [`ChatdockErr::UnexpectedStatus`]. Neither path is
    /// retried here; retrying means issuing a new request.
    pub async fn stream_search(&self, query: &str) -> Result<ResponseStream> {
        let url = self.endpoint("search/stream");
        let payload = self.query_body(query);
        debug!(url, "POST (stream)");
        trace!("request payload: {payload}");

        let resp = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = (resp.text().await).unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail);
            return Err(ChatdockErr::UnexpectedStatus { status, detail });
        }

        let (tx_event, rx_event) = mpsc::channel::<Result<StreamEvent>>(16);
        let stream = resp.bytes_stream();
        tokio::spawn(process_search_sse(stream, tx_event));
        Ok(ResponseStream { rx_event })
    }

    /// Legacy non-streaming variant of [`stream_search`]. Superseded by the
    /// streaming endpoint but kept while embedders still call it.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = self.endpoint("search");
        debug!(url, "POST (search)");

        let resp = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&self.query_body(query))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = (resp.text().await).unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail);
            return Err(ChatdockErr::UnexpectedStatus { status, detail });
        }

        let body: SearchResponse = resp.json().await?;
        Ok(body.results)
    }

    /// Fetch the company attribution metadata. Non-critical: callers are
    /// expected to log and ignore failures.
    pub async fn fetch_company_info(&self) -> Result<CompanyInfo> {
        let url = self.endpoint(&format!("config/{}", self.config.api_key));
        debug!(url, "GET (company info)");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ChatdockErr::UnexpectedStatus {
                status,
                detail: None,
            });
        }
        Ok(resp.json().await?)
    }
}

/// Reads the chunked response body, runs it through the line parser, and
/// forwards typed events. Dropping the sender when the loop ends closes the
/// channel, which is the authoritative end-of-stream signal for consumers.
async fn process_search_sse<S>(mut stream: S, tx_event: mpsc::Sender<Result<StreamEvent>>)
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
{
    let mut parser = SseLineParser::new();

    while let Some(chunk) = stream.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx_event.send(Err(ChatdockErr::Stream(e.to_string()))).await;
                return;
            }
        };
        for event in parser.push_chunk(&bytes) {
            // `done` is advisory; keep forwarding whatever the server still
            // sends until the connection actually closes.
            if tx_event.send(Ok(event)).await.is_err() {
                // Receiver dropped; stop reading.
                return;
            }
        }
    }

    for event in parser.finish() {
        if tx_event.send(Ok(event)).await.is_err() {
            return;
        }
    }
}

/// Typed event stream for one in-flight search request. Finite and not
/// restartable.
#[derive(Debug)]
pub struct ResponseStream {
    rx_event: mpsc::Receiver<Result<StreamEvent>>,
}

impl Stream for ResponseStream {
    type Item = Result<StreamEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx_event.poll_recv(cx)
    }
}
