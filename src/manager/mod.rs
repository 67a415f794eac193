//! Streaming session management
//!
//! Provides [`StreamManager`], the connection controller that enforces a
//! single active exchange, drives the session lifecycle, and publishes view
//! models.
//!
//! # Module Structure
//!
//! - `stream_manager` - public API (`start`, `cancel`, `dispose`, views)
//! - `state` - generation-guarded session cell and view receiver
//! - `background` - per-exchange task reading and applying frames
//!
//! # Lifecycle
//!
//! ```text
//! Idle --start--> Connecting --open--> Streaming --done--> Completed
//!                     |                    |--error/transport--> Errored
//!                     +------cancel--------+--> Cancelled
//! any state --start--> Connecting (new session)
//! ```

mod background;
mod state;
mod stream_manager;

pub use state::ViewReceiver;
pub use stream_manager::StreamManager;
