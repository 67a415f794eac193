//! Server-Sent Events transport over HTTP POST

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use tokio::sync::mpsc;

use super::{ExchangeRequest, FrameStream, Transport};
use crate::error::{ChatStreamError, Result};
use crate::message::RawFrame;
use crate::types::options::StreamOptions;

/// Longest error body echoed into a `HttpStatus` error
const MAX_ERROR_BODY: usize = 512;

/// HTTP transport for the orchestrator's streaming endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    options: StreamOptions,
}

impl HttpTransport {
    /// Create a new HTTP transport
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the options fail validation or the HTTP
    /// client cannot be built
    pub fn new(options: StreamOptions) -> Result<Self> {
        options.validate()?;

        let mut builder = reqwest::Client::builder().user_agent(options.user_agent());
        if let Some(timeout) = options.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            ChatStreamError::invalid_config(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self { client, options })
    }

    /// Options this transport was built with
    #[must_use]
    pub const fn options(&self) -> &StreamOptions {
        &self.options
    }
}

impl Transport for HttpTransport {
    async fn connect(&self, request: ExchangeRequest) -> Result<FrameStream> {
        let mut builder = self
            .client
            .post(&self.options.endpoint)
            .header(ACCEPT, "text/event-stream")
            .json(&request);
        for (name, value) in &self.options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request rejected").to_string()
            } else {
                body
            };
            return Err(ChatStreamError::http_status(status.as_u16(), message));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let max_frame_size = self.options.frame_limit();
        let task = tokio::spawn(read_events(response, tx, max_frame_size));

        Ok(FrameStream::with_reader_task(rx, task))
    }
}

/// Read at most `MAX_ERROR_BODY` bytes of a rejected response
async fn read_error_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();
    while body.len() < MAX_ERROR_BODY {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => {
                log::debug!("Failed to read error body: {e}");
                break;
            }
        }
    }
    body.truncate(MAX_ERROR_BODY);
    // A cut through a multi-byte character leaves a replacement char
    String::from_utf8_lossy(&body)
        .trim_end_matches('\u{FFFD}')
        .to_string()
}

/// Forward SSE events from the response body until it ends or fails
///
/// `max_frame_size` is a drop filter: the SSE decoder has already buffered
/// an event by the time its size is known, so it does not bound memory.
async fn read_events(
    response: reqwest::Response,
    tx: mpsc::UnboundedSender<Result<RawFrame>>,
    max_frame_size: usize,
) {
    let mut events = response.bytes_stream().eventsource();

    while let Some(item) = events.next().await {
        match item {
            Ok(event) => {
                if event.data.len() > max_frame_size {
                    log::warn!(
                        "Dropping '{}' frame of {} bytes (limit {max_frame_size})",
                        event.event,
                        event.data.len()
                    );
                    continue;
                }
                let frame = RawFrame {
                    event: Some(event.event).filter(|name| !name.is_empty()),
                    data: event.data,
                };
                if tx.send(Ok(frame)).is_err() {
                    // Receiver dropped, stop reading
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(ChatStreamError::transport(format!(
                    "SSE stream error: {e}"
                ))));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::identifiers::UserId;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the raw request text
    async fn serve_once(response: impl Into<String>) -> (String, tokio::task::JoinHandle<String>) {
        let response = response.into();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            // Read headers and the small JSON body
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(split) = text.find("\r\n\r\n") {
                    let length = text
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if request.len() >= split + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{addr}/api/chat/stream"), handle)
    }

    fn request() -> ExchangeRequest {
        ExchangeRequest {
            message: "I want to retire at 60".to_string(),
            user_id: UserId::new("user-1"),
            thread_id: None,
        }
    }

    #[tokio::test]
    async fn streams_sse_frames_in_order() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: text/event-stream\r\n\
             Connection: close\r\n\r\n\
             event: connected\ndata: {\"thread_id\":\"t1\"}\n\n\
             data: {\"type\":\"done\"}\n\n",
        )
        .await;

        let transport = HttpTransport::new(
            StreamOptions::builder()
                .endpoint(endpoint)
                .header("X-Client", "tests")
                .build(),
        )
        .unwrap();
        let mut frames = transport.connect(request()).await.unwrap();

        let first = frames.next_frame().await.unwrap().unwrap();
        assert_eq!(first.event.as_deref(), Some("connected"));
        assert_eq!(first.data, r#"{"thread_id":"t1"}"#);

        let second = frames.next_frame().await.unwrap().unwrap();
        assert_eq!(second.data, r#"{"type":"done"}"#);

        assert!(frames.next_frame().await.is_none());

        let raw_request = server.await.unwrap();
        assert!(raw_request.starts_with("POST /api/chat/stream"));
        assert!(raw_request.to_ascii_lowercase().contains("accept: text/event-stream"));
        assert!(raw_request.to_ascii_lowercase().contains("x-client: tests"));
        assert!(raw_request.contains(r#""user_id":"user-1""#));
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (endpoint, _server) = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\n\
             Content-Length: 11\r\n\
             Connection: close\r\n\r\n\
             overloaded!",
        )
        .await;

        let transport =
            HttpTransport::new(StreamOptions::builder().endpoint(endpoint).build()).unwrap();
        match transport.connect(request()).await {
            Err(ChatStreamError::HttpStatus { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded!");
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("expected rejection"),
        }
    }

    #[tokio::test]
    async fn long_error_body_is_truncated() {
        let body = "é".repeat(2000);
        let (endpoint, _server) = serve_once(format!(
            "HTTP/1.1 500 Internal Server Error\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n\
             {body}",
            body.len()
        ))
        .await;

        let transport =
            HttpTransport::new(StreamOptions::builder().endpoint(endpoint).build()).unwrap();
        match transport.connect(request()).await {
            Err(ChatStreamError::HttpStatus { status, message }) => {
                assert_eq!(status, 500);
                assert!(!message.is_empty());
                assert!(message.len() <= MAX_ERROR_BODY);
                assert!(message.chars().all(|c| c == 'é'));
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("expected rejection"),
        }
    }

    #[tokio::test]
    async fn oversized_frames_are_dropped() {
        let (endpoint, _server) = serve_once(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: text/event-stream\r\n\
             Connection: close\r\n\r\n\
             data: {\"type\":\"message\",\"role\":\"agent\",\"content\":\"far too long\"}\n\n\
             data: {\"type\":\"done\"}\n\n",
        )
        .await;

        let transport = HttpTransport::new(
            StreamOptions::builder()
                .endpoint(endpoint)
                .max_frame_size(20)
                .build(),
        )
        .unwrap();
        let mut frames = transport.connect(request()).await.unwrap();

        let only = frames.next_frame().await.unwrap().unwrap();
        assert_eq!(only.data, r#"{"type":"done"}"#);
        assert!(frames.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn refused_connection_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(
            StreamOptions::builder()
                .endpoint(format!("http://{addr}/stream"))
                .build(),
        )
        .unwrap();
        assert!(transport.connect(request()).await.is_err());
    }

    #[test]
    fn invalid_options_are_rejected() {
        let result = HttpTransport::new(StreamOptions::builder().endpoint("ftp://x").build());
        assert!(matches!(result, Err(ChatStreamError::InvalidConfig(_))));
    }
}
