//! In-process transport driven by the embedding application
//!
//! Each successful `connect` hands a [`MemoryExchange`] to whoever holds the
//! receiver returned by [`MemoryTransport::new`]. That side then plays the
//! orchestrator: it pushes frames, fails the transport, or drops the
//! exchange to close it.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{ExchangeRequest, FrameStream, Transport};
use crate::error::{ChatStreamError, Result};
use crate::message::RawFrame;

/// Transport backed by in-memory channels
pub struct MemoryTransport {
    exchanges: mpsc::UnboundedSender<MemoryExchange>,
    refusal: Mutex<Option<String>>,
    connect_delay: Option<Duration>,
}

impl MemoryTransport {
    /// Create a transport and the receiver its exchanges are delivered to
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryExchange>) {
        let (exchanges, rx) = mpsc::unbounded_channel();
        let transport = Self {
            exchanges,
            refusal: Mutex::new(None),
            connect_delay: None,
        };
        (transport, rx)
    }

    /// Delay every handshake by `delay`
    #[must_use]
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// Make the next `connect` fail with a connection error
    pub fn refuse_next(&self, reason: impl Into<String>) {
        *self.refusal.lock() = Some(reason.into());
    }
}

impl Transport for MemoryTransport {
    async fn connect(&self, request: ExchangeRequest) -> Result<FrameStream> {
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }

        let refusal = self.refusal.lock().take();
        if let Some(reason) = refusal {
            return Err(ChatStreamError::connection(reason));
        }

        let (frames, rx) = mpsc::unbounded_channel();
        self.exchanges
            .send(MemoryExchange { request, frames })
            .map_err(|_| ChatStreamError::connection("No orchestrator is attached"))?;

        Ok(FrameStream::new(rx))
    }
}

/// Orchestrator side of one in-memory exchange
///
/// Dropping it closes the transport.
#[derive(Debug)]
pub struct MemoryExchange {
    request: ExchangeRequest,
    frames: mpsc::UnboundedSender<Result<RawFrame>>,
}

impl MemoryExchange {
    /// Request that opened this exchange
    #[must_use]
    pub const fn request(&self) -> &ExchangeRequest {
        &self.request
    }

    /// Push a raw frame; returns `false` once the client stopped reading
    pub fn send(&self, frame: impl Into<RawFrame>) -> bool {
        self.frames.send(Ok(frame.into())).is_ok()
    }

    /// Push a frame with an SSE event name and a JSON body
    pub fn send_event(&self, event: &str, body: serde_json::Value) -> bool {
        self.send(RawFrame::named(event, body.to_string()))
    }

    /// Fail the transport mid-stream
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.frames
            .send(Err(ChatStreamError::transport(reason)))
            .is_ok()
    }

    /// Whether the client side has gone away
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.frames.is_closed()
    }
}
