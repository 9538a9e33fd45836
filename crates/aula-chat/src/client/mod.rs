//! HTTP dispatcher for the chat endpoint.

mod config;
mod http;

pub use config::ClientConfig;
pub use http::{ChatReply, HttpClient};
