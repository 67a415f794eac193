//! Type definitions for the agent chat stream
//!
//! - [`identifiers`] - Type-safe ID wrappers (`ThreadId`, `UserId`)
//! - [`messages`] - Messages, agent progress, and visualization artifacts
//! - [`session`] - Session aggregate, lifecycle status, and errors
//! - [`view`] - Read-only view model for presentation collaborators
//! - [`options`] - Transport configuration

pub mod identifiers;
pub mod messages;
pub mod options;
pub mod session;
pub mod view;

// Re-export commonly used types
pub use identifiers::{ThreadId, UserId};
pub use messages::{AgentProgressEvent, Message, Role, VisualizationArtifact, VisualizationKind};
pub use options::{StreamOptions, StreamOptionsBuilder};
pub use session::{ErrorPhase, SessionError, SessionStatus, StreamSession};
pub use view::ViewModel;
