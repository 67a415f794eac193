//! Session accumulator
//!
//! The only code path that writes to a [`StreamSession`]. Collections are
//! append-only; terminal sessions are frozen.

use crate::message::StreamEvent;
use crate::types::session::{ErrorPhase, SessionError, SessionStatus, StreamSession};

/// Result of applying one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Session was already terminal; nothing changed
    Ignored,
    /// Event was applied and the session is still open
    Accepted,
    /// Event ended the session; the transport should be closed
    Finished,
}

/// Apply a decoded event to the session
pub fn apply(session: &mut StreamSession, event: StreamEvent) -> ApplyOutcome {
    if session.status.is_terminal() {
        log::debug!(
            "[{}] Ignoring late '{}' event, session is {:?}",
            session.exchange_id,
            event.kind(),
            session.status
        );
        return ApplyOutcome::Ignored;
    }

    log::debug!("[{}] Applying '{}' event", session.exchange_id, event.kind());

    match event {
        StreamEvent::Connected { thread_id } => {
            match &session.thread_id {
                None => session.thread_id = Some(thread_id),
                Some(current) if *current == thread_id => {}
                Some(current) => {
                    log::warn!(
                        "[{}] Thread identity changed mid-session: keeping '{current}', ignoring '{thread_id}'",
                        session.exchange_id
                    );
                    let anomaly = SessionError {
                        message: "The conversation thread changed unexpectedly".to_string(),
                        occurred_during: phase_of(session.status),
                        fatal: false,
                    };
                    session.error.get_or_insert(anomaly);
                }
            }
            ApplyOutcome::Accepted
        }
        StreamEvent::MessageReceived(message) => {
            session.messages.push(message);
            ApplyOutcome::Accepted
        }
        StreamEvent::AgentProgress(update) => {
            session.current_agent = Some(update.agent_name.clone());
            session.agent_updates.push(update);
            ApplyOutcome::Accepted
        }
        StreamEvent::VisualizationReady(artifact) => {
            session.visualizations.push(artifact);
            ApplyOutcome::Accepted
        }
        StreamEvent::StreamError { message } => {
            log::info!("[{}] Session errored: {message}", session.exchange_id);
            // Fatal errors replace any earlier non-fatal anomaly
            session.error = Some(SessionError {
                message,
                occurred_during: phase_of(session.status),
                fatal: true,
            });
            session.status = SessionStatus::Errored;
            ApplyOutcome::Finished
        }
        StreamEvent::StreamCompleted => {
            log::info!("[{}] Session completed", session.exchange_id);
            session.status = SessionStatus::Completed;
            ApplyOutcome::Finished
        }
    }
}

const fn phase_of(status: SessionStatus) -> ErrorPhase {
    match status {
        SessionStatus::Idle | SessionStatus::Connecting => ErrorPhase::Connecting,
        _ => ErrorPhase::Streaming,
    }
}
