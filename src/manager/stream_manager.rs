//! `StreamManager` public API

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::background::Exchange;
use super::state::{SessionCell, ViewReceiver};
use crate::transport::{ExchangeRequest, Transport};
use crate::types::identifiers::{ThreadId, UserId};
use crate::types::session::SessionStatus;
use crate::types::view::ViewModel;

/// Manager for one streaming chat exchange at a time
///
/// Owns the transport lifecycle and the session state. Consumers only ever
/// see [`ViewModel`] snapshots. Failures are reported through the view
/// model's `error` field; no method returns an error.
///
/// # Examples
///
/// ```no_run
/// use agent_chat_stream::{StreamManager, StreamOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let options = StreamOptions::builder()
///     .endpoint("https://orchestrator.example.com/api/chat/stream")
///     .build();
/// let manager = StreamManager::http(options)?;
///
/// manager.start(None, "I want to retire at 60", "user-1").await;
///
/// let mut views = manager.subscribe();
/// while views.changed().await.is_ok() {
///     let view = views.latest();
///     if !view.is_streaming {
///         break;
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct StreamManager<T: Transport> {
    transport: Arc<T>,
    cell: Arc<SessionCell>,
    active: Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl<T: Transport> StreamManager<T> {
    /// Create a manager over `transport`
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            cell: Arc::new(SessionCell::new()),
            active: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    /// Start a new exchange
    ///
    /// Any exchange still in flight is cancelled first; the last caller
    /// wins. The previous session is replaced by an empty `Connecting`
    /// session in one step. Returns once the handshake has succeeded,
    /// failed, or been cancelled.
    ///
    /// Pass the `thread_id` from the previous view to continue the same
    /// conversation, or `None` to start a new one.
    pub async fn start(
        &self,
        thread_id: Option<ThreadId>,
        message: impl Into<String>,
        user_id: impl Into<UserId>,
    ) {
        let request = ExchangeRequest {
            message: message.into(),
            user_id: user_id.into(),
            thread_id,
        };
        let (opened_tx, opened_rx) = oneshot::channel();

        {
            let mut active = self.active.lock();
            // dispose sets the flag while holding this lock
            if self.disposed.load(Ordering::SeqCst) {
                log::warn!("Ignoring start on a disposed stream manager");
                return;
            }
            self.cancel_locked(&mut active);

            let ticket = self.cell.reset(request.thread_id.clone());
            log::info!("[{}] Starting exchange", ticket.exchange_id);

            let exchange = Exchange {
                transport: Arc::clone(&self.transport),
                cell: Arc::clone(&self.cell),
                ticket,
            };
            *active = Some(tokio::spawn(exchange.run(request, opened_tx)));
        }

        // Err means the exchange was cancelled before the handshake finished
        let _ = opened_rx.await;
    }

    /// Cancel the exchange in flight
    ///
    /// Idempotent. Accumulated messages, updates, and visualizations are
    /// kept. No frame is applied after this returns; transport teardown
    /// continues in the background.
    ///
    /// Only a `Connecting` or `Streaming` session becomes `Cancelled`. A
    /// session that already ended as `Completed` or `Errored` keeps its
    /// status.
    pub fn cancel(&self) {
        let mut active = self.active.lock();
        self.cancel_locked(&mut active);
    }

    /// Cancel and refuse further exchanges
    pub fn dispose(&self) {
        let mut active = self.active.lock();
        self.disposed.store(true, Ordering::SeqCst);
        self.cancel_locked(&mut active);
    }

    /// Whether [`dispose`](Self::dispose) has been called
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Current view model
    #[must_use]
    pub fn snapshot(&self) -> ViewModel {
        self.cell.snapshot()
    }

    /// Receiver notified whenever the view changes
    ///
    /// Intermediate views may be coalesced; every observed view matches
    /// some prefix of the accepted events.
    #[must_use]
    pub fn subscribe(&self) -> ViewReceiver {
        ViewReceiver::new(&self.cell)
    }

    /// Stream of views, starting with the current one
    pub fn updates(&self) -> impl Stream<Item = ViewModel> + Send + 'static {
        let mut views = self.subscribe();
        async_stream::stream! {
            yield views.latest();
            while views.changed().await.is_ok() {
                yield views.latest();
            }
        }
    }

    /// Current lifecycle status
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.cell.status()
    }

    /// Thread identity of the current session
    #[must_use]
    pub fn thread_id(&self) -> Option<ThreadId> {
        self.cell.thread_id()
    }

    fn cancel_locked(&self, active: &mut Option<JoinHandle<()>>) {
        if let Some(exchange_id) = self.cell.cancel() {
            log::info!("[{exchange_id}] Exchange cancelled");
        }
        if let Some(task) = active.take() {
            task.abort();
        }
    }
}

#[cfg(feature = "http")]
impl StreamManager<crate::transport::HttpTransport> {
    /// Create a manager that talks SSE over HTTP
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the options are unusable
    pub fn http(options: crate::types::options::StreamOptions) -> crate::error::Result<Self> {
        Ok(Self::new(crate::transport::HttpTransport::new(options)?))
    }
}

impl<T: Transport> Drop for StreamManager<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}
