//! Shared session cell
//!
//! Holds the live [`StreamSession`] together with a generation counter.
//! Every mutation checks the caller's generation under the lock, so a
//! cancelled or superseded exchange can never write again once `cancel`
//! or `start` has bumped it.
//!
//! Mutations only bump a revision number under the lock. Views are
//! projected when a reader asks for one, so an accepted frame costs the
//! same however long the session has grown.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

use crate::message::StreamEvent;
use crate::session::{ApplyOutcome, apply, project};
use crate::types::identifiers::ThreadId;
use crate::types::session::{SessionStatus, StreamSession};
use crate::types::view::ViewModel;

struct Inner {
    generation: u64,
    session: StreamSession,
}

/// Session state shared between the manager and its exchange task
pub(super) struct SessionCell {
    inner: Mutex<Inner>,
    revision: watch::Sender<u64>,
}

/// Identity of one started exchange
#[derive(Debug, Clone, Copy)]
pub(super) struct Ticket {
    pub generation: u64,
    pub exchange_id: Uuid,
}

impl SessionCell {
    pub(super) fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Mutex::new(Inner {
                generation: 0,
                session: StreamSession::idle(),
            }),
            revision,
        }
    }

    /// Replace the session with an empty `Connecting` one in a single step
    pub(super) fn reset(&self, thread_id: Option<ThreadId>) -> Ticket {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.session = StreamSession::connecting(thread_id);
        self.publish();
        Ticket {
            generation: inner.generation,
            exchange_id: inner.session.exchange_id,
        }
    }

    /// `Connecting -> Streaming`; `false` if the exchange is no longer current
    pub(super) fn mark_streaming(&self, generation: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation || inner.session.status != SessionStatus::Connecting {
            return false;
        }
        inner.session.status = SessionStatus::Streaming;
        self.publish();
        true
    }

    /// Route an event through the accumulator if `generation` is current
    pub(super) fn apply(&self, generation: u64, event: StreamEvent) -> ApplyOutcome {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return ApplyOutcome::Ignored;
        }
        let outcome = apply(&mut inner.session, event);
        if outcome != ApplyOutcome::Ignored {
            self.publish();
        }
        outcome
    }

    /// Invalidate the current exchange; an active session becomes `Cancelled`
    ///
    /// Returns the exchange id if a session was actually cancelled.
    pub(super) fn cancel(&self) -> Option<Uuid> {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        if !inner.session.status.is_active() {
            return None;
        }
        inner.session.status = SessionStatus::Cancelled;
        self.publish();
        Some(inner.session.exchange_id)
    }

    pub(super) fn status(&self) -> SessionStatus {
        self.inner.lock().session.status
    }

    pub(super) fn thread_id(&self) -> Option<ThreadId> {
        self.inner.lock().session.thread_id.clone()
    }

    pub(super) fn snapshot(&self) -> ViewModel {
        project(&self.inner.lock().session)
    }

    fn publish(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

/// Receiver notified whenever the session changes
///
/// Changes are coalesced: a reader that falls behind sees the latest view,
/// never a partially applied one. Holds the session weakly, so
/// [`changed`](Self::changed) fails once the manager and its exchange task
/// are gone.
pub struct ViewReceiver {
    cell: Weak<SessionCell>,
    revision: watch::Receiver<u64>,
    last: ViewModel,
}

impl ViewReceiver {
    pub(super) fn new(cell: &Arc<SessionCell>) -> Self {
        Self {
            revision: cell.revision.subscribe(),
            last: ViewModel::default(),
            cell: Arc::downgrade(cell),
        }
    }

    /// Wait for a view newer than the last one returned by [`latest`](Self::latest)
    ///
    /// # Errors
    /// Returns `RecvError` once the session has been dropped
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.revision.changed().await
    }

    /// Current view, marking it as seen
    ///
    /// After the session has been dropped this keeps returning the last
    /// view observed.
    pub fn latest(&mut self) -> ViewModel {
        // Mark first: a change racing the projection is reported again
        // rather than lost.
        self.revision.borrow_and_update();
        if let Some(cell) = self.cell.upgrade() {
            self.last = cell.snapshot();
        }
        self.last.clone()
    }
}
