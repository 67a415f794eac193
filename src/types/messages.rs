//! Chat payload type definitions
//!
//! These are the immutable entries a session accumulates. They serialize in
//! camelCase because their consumers are presentation-layer collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Messages
// ============================================================================

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The human side of the conversation
    User,
    /// Any backend agent
    #[serde(alias = "assistant")]
    Agent,
    /// Orchestrator notices
    System,
}

/// A chat message appended to the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message author
    pub role: Role,
    /// Message text
    pub content: String,
    /// When the orchestrator produced the message
    pub timestamp: DateTime<Utc>,
}

/// Incremental status reported by one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProgressEvent {
    /// Stable agent identifier
    pub agent_id: String,
    /// Display name; the join key for "has this agent spoken yet"
    pub agent_name: String,
    /// Progress text
    pub response: String,
    /// When the update was produced
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Visualizations
// ============================================================================

/// Kind of renderable artifact
///
/// Unknown kinds are carried through as [`VisualizationKind::Other`] so new
/// chart types on the backend do not require a client release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VisualizationKind {
    /// Pie chart
    PieChart,
    /// Bar chart
    BarChart,
    /// Line chart
    LineChart,
    /// Fan chart (projection bands)
    FanChart,
    /// Tabular data
    Table,
    /// Any kind this client does not name
    Other(String),
}

impl VisualizationKind {
    /// Wire name of the kind
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::PieChart => "pie_chart",
            Self::BarChart => "bar_chart",
            Self::LineChart => "line_chart",
            Self::FanChart => "fan_chart",
            Self::Table => "table",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for VisualizationKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pie_chart" => Self::PieChart,
            "bar_chart" => Self::BarChart,
            "line_chart" => Self::LineChart,
            "fan_chart" => Self::FanChart,
            "table" => Self::Table,
            _ => Self::Other(s),
        }
    }
}

impl From<VisualizationKind> for String {
    fn from(kind: VisualizationKind) -> Self {
        match kind {
            VisualizationKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// A renderable artifact produced by an agent
///
/// `data` and `config` are opaque: the stream core never inspects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationArtifact {
    /// Artifact kind
    pub kind: VisualizationKind,
    /// Display title
    pub title: String,
    /// Opaque payload
    pub data: serde_json::Value,
    /// Opaque rendering options
    pub config: serde_json::Map<String, serde_json::Value>,
    /// When the artifact was produced
    pub timestamp: DateTime<Utc>,
}
