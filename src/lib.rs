//! # Agent Chat Stream
//!
//! Client-side streaming session manager for multi-agent chat exchanges.
//! One long-lived Server-Sent Events stream per exchange carries messages,
//! per-agent progress, visualizations, thread identity, errors, and
//! completion; this crate decodes those frames, accumulates them into a
//! session, and publishes a consistent read-only view model.
//!
//! ## Quick Start
//!
//! ```no_run
//! use agent_chat_stream::{StreamManager, StreamOptions};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = StreamOptions::builder()
//!         .endpoint("http://127.0.0.1:8000/api/chat/stream")
//!         .build();
//!     let manager = StreamManager::http(options)?;
//!
//!     manager.start(None, "I want to retire at 60", "user-1").await;
//!
//!     let mut views = Box::pin(manager.updates());
//!     while let Some(view) = views.next().await {
//!         if let Some(agent) = &view.current_agent {
//!             log::info!("{agent} is working...");
//!         }
//!         if !view.is_streaming {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`message`]: event decoder, raw frames to the closed [`StreamEvent`] union
//! - [`session`]: accumulator (`apply`) and view projection (`project`)
//! - [`manager`]: connection controller, single-flight exchange lifecycle
//! - [`transport`]: SSE over HTTP, plus an in-memory transport
//! - [`types`]: identifiers, payloads, session state, options
//! - [`error`]: error types
//!
//! ## Error Handling
//!
//! Nothing fails past [`StreamManager::start`] or [`StreamManager::cancel`].
//! Undecodable frames are logged and dropped; backend and transport
//! failures end the session in `Errored` with a display message in
//! [`ViewModel::error`]. Cancellation is not an error.
//!
//! ## Feature Flags
//!
//! - `http` (default) - enables [`HttpTransport`] (requires `reqwest` and
//!   `eventsource-stream`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod manager;
pub mod message;
pub mod session;
pub mod transport;
pub mod types;

// Re-export commonly used types for external API
pub use error::{ChatStreamError, DecodeError, Result};
pub use manager::{StreamManager, ViewReceiver};
pub use message::{RawFrame, StreamEvent, decode};
pub use session::{ApplyOutcome, apply, project};
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::{ExchangeRequest, FrameStream, MemoryExchange, MemoryTransport, Transport};

pub use types::identifiers::{ThreadId, UserId};
pub use types::messages::{
    AgentProgressEvent, Message, Role, VisualizationArtifact, VisualizationKind,
};
pub use types::options::{StreamOptions, StreamOptionsBuilder};
pub use types::session::{ErrorPhase, SessionError, SessionStatus, StreamSession};
pub use types::view::ViewModel;

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
