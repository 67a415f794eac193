//! Session state structures
//!
//! A [`StreamSession`] is the root aggregate for one exchange. Only the
//! accumulator mutates it, and only in response to a decoded event.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identifiers::ThreadId;
use super::messages::{AgentProgressEvent, Message, VisualizationArtifact};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No exchange has been started
    #[default]
    Idle,
    /// Transport handshake in progress
    Connecting,
    /// Frames are flowing
    Streaming,
    /// Orchestrator signalled normal completion
    Completed,
    /// Stream or transport failure
    Errored,
    /// Caller cancelled the exchange
    Cancelled,
}

impl SessionStatus {
    /// Whether the session is `Connecting` or `Streaming`
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Streaming)
    }

    /// Whether the session has reached a final state
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored | Self::Cancelled)
    }
}

/// Phase of the exchange in which an error surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPhase {
    /// Before the transport opened
    Connecting,
    /// After the transport opened
    Streaming,
}

/// Human-readable failure recorded on a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionError {
    /// Message suitable for display
    pub message: String,
    /// Phase in which the error occurred
    pub occurred_during: ErrorPhase,
    /// Whether the error ended the session
    pub fatal: bool,
}

/// One exchange's accumulated state
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSession {
    /// Local identifier used to correlate log lines
    pub exchange_id: Uuid,
    /// Thread identity; immutable once set
    pub thread_id: Option<ThreadId>,
    /// Lifecycle status
    pub status: SessionStatus,
    /// Agent of the most recently accepted progress event
    pub current_agent: Option<String>,
    /// Chat messages in arrival order
    pub messages: Vec<Message>,
    /// Agent progress updates in arrival order
    pub agent_updates: Vec<AgentProgressEvent>,
    /// Visualizations in arrival order
    pub visualizations: Vec<VisualizationArtifact>,
    /// Most significant error so far
    pub error: Option<SessionError>,
}

impl StreamSession {
    /// Empty session that has never been started
    #[must_use]
    pub fn idle() -> Self {
        Self {
            exchange_id: Uuid::nil(),
            thread_id: None,
            status: SessionStatus::Idle,
            current_agent: None,
            messages: Vec::new(),
            agent_updates: Vec::new(),
            visualizations: Vec::new(),
            error: None,
        }
    }

    /// Fresh session for a new exchange, seeded with the caller's thread
    #[must_use]
    pub fn connecting(thread_id: Option<ThreadId>) -> Self {
        Self {
            exchange_id: Uuid::new_v4(),
            thread_id,
            status: SessionStatus::Connecting,
            ..Self::idle()
        }
    }
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::idle()
    }
}
