//! Raw frames and the closed set of decoded stream events

use crate::types::identifiers::ThreadId;
use crate::types::messages::{AgentProgressEvent, Message, VisualizationArtifact};

/// One undecoded unit received over the event stream
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawFrame {
    /// SSE `event:` name, if the transport carries one
    pub event: Option<String>,
    /// SSE `data:` payload, normally a JSON object
    pub data: String,
}

impl RawFrame {
    /// Frame with an explicit event name
    pub fn named(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: Some(event.into()),
            data: data.into(),
        }
    }

    /// Frame whose discriminant is carried in-band
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
        }
    }
}

impl From<serde_json::Value> for RawFrame {
    fn from(value: serde_json::Value) -> Self {
        Self::data(value.to_string())
    }
}

/// Typed event accepted by the session accumulator
///
/// Adding a backend frame kind means adding a variant here, which the
/// compiler then forces every `match` to handle.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Orchestrator assigned or confirmed the thread identity
    Connected {
        /// Thread the exchange belongs to
        thread_id: ThreadId,
    },
    /// A chat message to append
    MessageReceived(Message),
    /// Incremental status from one agent
    AgentProgress(AgentProgressEvent),
    /// A renderable artifact
    VisualizationReady(VisualizationArtifact),
    /// Fatal error, from the orchestrator or the transport
    StreamError {
        /// Display message
        message: String,
    },
    /// Normal completion
    StreamCompleted,
}

impl StreamEvent {
    /// Short name used in log lines
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::MessageReceived(_) => "message",
            Self::AgentProgress(_) => "agent_progress",
            Self::VisualizationReady(_) => "visualization",
            Self::StreamError { .. } => "error",
            Self::StreamCompleted => "done",
        }
    }
}
