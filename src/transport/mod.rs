//! Transport layer for reaching the agent orchestrator
//!
//! This module provides the transport abstraction and its implementations.
//! A transport turns one [`ExchangeRequest`] into a [`FrameStream`] of raw
//! frames; it knows nothing about event semantics.

#[cfg(feature = "http")]
mod http;
mod memory;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::message::RawFrame;
use crate::types::identifiers::{ThreadId, UserId};

#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use memory::{MemoryExchange, MemoryTransport};

/// Body of the request that opens one exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeRequest {
    /// User's chat message
    pub message: String,
    /// Requesting user
    pub user_id: UserId,
    /// Thread to continue; absent means "start a new conversation"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<ThreadId>,
}

/// Transport trait for opening an exchange with the orchestrator
pub trait Transport: Send + Sync + 'static {
    /// Perform the handshake and return the frame stream
    ///
    /// Resolves once the orchestrator has accepted the request and frames
    /// can be read.
    ///
    /// # Errors
    /// Returns error if the connection cannot be established or the
    /// orchestrator rejects the request
    fn connect(
        &self,
        request: ExchangeRequest,
    ) -> impl std::future::Future<Output = Result<FrameStream>> + Send;
}

/// Receiving end of an open exchange
///
/// Yields frames in wire order. A transport failure is yielded as `Err`
/// and is the last item; `None` means the transport closed. Dropping the
/// stream aborts any background reader.
pub struct FrameStream {
    rx: mpsc::UnboundedReceiver<Result<RawFrame>>,
    reader_task: Option<JoinHandle<()>>,
}

impl FrameStream {
    /// Wrap a channel fed by someone else
    #[must_use]
    pub fn new(rx: mpsc::UnboundedReceiver<Result<RawFrame>>) -> Self {
        Self {
            rx,
            reader_task: None,
        }
    }

    /// Wrap a channel fed by a background reader task owned by this stream
    #[must_use]
    pub fn with_reader_task(
        rx: mpsc::UnboundedReceiver<Result<RawFrame>>,
        reader_task: JoinHandle<()>,
    ) -> Self {
        Self {
            rx,
            reader_task: Some(reader_task),
        }
    }

    /// Next frame, or `None` once the transport has closed
    pub async fn next_frame(&mut self) -> Option<Result<RawFrame>> {
        self.rx.recv().await
    }

    /// Stop reading and release the underlying connection
    pub fn close(&mut self) {
        self.rx.close();
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        self.close();
    }
}
