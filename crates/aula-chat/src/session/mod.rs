//! Conversation session controller.
//!
//! A `ChatSession` owns the transcript, the session identity and the
//! attachment stager, gates submits to one in-flight exchange, and
//! reconciles each outcome back onto the transcript.

mod chat;
mod manager;
mod types;

pub use manager::ChatSession;
pub use types::{SessionEvent, SessionObserver};
