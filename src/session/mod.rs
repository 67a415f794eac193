//! Session accumulation and projection
//!
//! - `accumulator` - folds decoded events into a [`StreamSession`](crate::types::StreamSession)
//! - `projection` - derives the [`ViewModel`](crate::types::ViewModel) consumers see

mod accumulator;
mod projection;

pub use accumulator::{ApplyOutcome, apply};
pub use projection::project;
