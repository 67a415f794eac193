//! Background task driving one exchange
//!
//! The task owns the transport's [`FrameStream`](crate::transport::FrameStream)
//! and handles:
//! - Performing the handshake and reporting it back to `start`
//! - Decoding frames in arrival order and dropping undecodable ones
//! - Mapping transport failures onto the ordinary error event
//!
//! It runs until a terminal event, a transport failure, or until the
//! manager aborts it.

use std::sync::Arc;
use tokio::sync::oneshot;

use super::state::{SessionCell, Ticket};
use crate::message::{StreamEvent, decode};
use crate::session::ApplyOutcome;
use crate::transport::{ExchangeRequest, Transport};

/// Shown when the handshake fails
const CONNECT_FAILED: &str = "Could not connect to the agent service";

/// Shown when the transport fails after the stream opened
const CONNECTION_LOST: &str = "Lost connection to the agent service";

/// Shown when the stream ends without a terminal frame
const STREAM_CLOSED: &str = "The agent service closed the stream before the response completed";

/// Everything the exchange task needs, moved into the task
pub(super) struct Exchange<T> {
    pub transport: Arc<T>,
    pub cell: Arc<SessionCell>,
    pub ticket: Ticket,
}

impl<T: Transport> Exchange<T> {
    /// Run the exchange to completion
    ///
    /// `opened_tx` fires once the handshake has succeeded or failed. If the
    /// exchange is cancelled first it is dropped instead.
    pub(super) async fn run(self, request: ExchangeRequest, opened_tx: oneshot::Sender<()>) {
        let Ticket {
            generation,
            exchange_id,
        } = self.ticket;

        log::debug!(
            "[{exchange_id}] Opening stream for user {} (thread {})",
            request.user_id.as_str(),
            request
                .thread_id
                .as_ref()
                .map_or("<new>", |thread| thread.as_str())
        );

        let mut frames = match self.transport.connect(request).await {
            Ok(frames) => frames,
            Err(e) => {
                log::error!("[{exchange_id}] Failed to open stream: {e}");
                self.fail(CONNECT_FAILED);
                let _ = opened_tx.send(());
                return;
            }
        };

        if !self.cell.mark_streaming(generation) {
            log::debug!("[{exchange_id}] Superseded during handshake");
            return;
        }
        log::info!("[{exchange_id}] Stream open");
        let _ = opened_tx.send(());

        loop {
            let Some(item) = frames.next_frame().await else {
                log::error!("[{exchange_id}] Stream ended without a terminal frame");
                self.fail(STREAM_CLOSED);
                break;
            };

            let frame = match item {
                Ok(frame) => frame,
                Err(e) => {
                    log::error!("[{exchange_id}] Transport failed: {e}");
                    self.fail(CONNECTION_LOST);
                    break;
                }
            };

            let event = match decode(&frame) {
                Ok(event) => event,
                Err(e) => {
                    log::warn!("[{exchange_id}] Dropping frame: {e}");
                    continue;
                }
            };

            match self.cell.apply(generation, event) {
                ApplyOutcome::Accepted => {}
                ApplyOutcome::Finished | ApplyOutcome::Ignored => break,
            }
        }

        frames.close();
        log::debug!("[{exchange_id}] Stream closed");
    }

    fn fail(&self, message: &str) {
        self.cell.apply(
            self.ticket.generation,
            StreamEvent::StreamError {
                message: message.to_string(),
            },
        );
    }
}
