//! Event decoding for orchestrator frames
//!
//! Turns [`RawFrame`]s into the closed [`StreamEvent`] union. Decoding only
//! classifies; it never touches session state.

mod event;
mod parser;

pub use event::{RawFrame, StreamEvent};
pub use parser::{decode, decode_at};
