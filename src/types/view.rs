//! Read-only projection handed to presentation collaborators

use serde::Serialize;

use super::identifiers::ThreadId;
use super::messages::{AgentProgressEvent, Message, VisualizationArtifact};
use super::session::{SessionError, SessionStatus};

/// Immutable snapshot of a session
///
/// Always corresponds to some prefix of the accepted event sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    /// `true` while the session is connecting or streaming
    pub is_streaming: bool,
    /// Lifecycle status
    pub status: SessionStatus,
    /// Thread identity, if assigned
    pub thread_id: Option<ThreadId>,
    /// Agent of the most recent progress update
    pub current_agent: Option<String>,
    /// Chat messages in arrival order
    pub messages: Vec<Message>,
    /// Agent progress updates in arrival order
    pub agent_updates: Vec<AgentProgressEvent>,
    /// Visualizations in arrival order
    pub visualizations: Vec<VisualizationArtifact>,
    /// Error to display, if any
    pub error: Option<SessionError>,
}

impl ViewModel {
    /// Whether `agent_name` has produced at least one progress update
    #[must_use]
    pub fn has_agent_responded(&self, agent_name: &str) -> bool {
        self.agent_updates
            .iter()
            .any(|update| update.agent_name == agent_name)
    }

    /// Most recent progress update from `agent_name`
    #[must_use]
    pub fn latest_update_for(&self, agent_name: &str) -> Option<&AgentProgressEvent> {
        self.agent_updates
            .iter()
            .rev()
            .find(|update| update.agent_name == agent_name)
    }

    /// Error message text, if any
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}
