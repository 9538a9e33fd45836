//! Conversation core for Aula.
//!
//! Client-side session controller for a tutoring assistant, with:
//! - Append-only transcript (single source of truth for the dialogue)
//! - Attachment staging with tracked display handles
//! - Session identity that the backend may rotate mid-conversation
//! - Multipart request composition and single-attempt HTTP dispatch
//! - Single-flight submits (a second submit is rejected, never queued)

pub mod attachments;
pub mod client;
pub mod identity;
pub mod payload;
pub mod session;
pub mod transcript;

use async_trait::async_trait;

pub use attachments::{Attachment, AttachmentStager, DisplayHandle, FileInput, StagedFile};
pub use client::{ClientConfig, HttpClient};
pub use identity::SessionIdentity;
pub use payload::{FilePart, Payload};
pub use session::{ChatSession, SessionEvent};
pub use transcript::MessageStore;

/// The network seam. The controller only ever sees one classified
/// [`Outcome`] per dispatched payload; retries and queueing do not exist
/// at this layer.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, payload: Payload) -> Outcome;
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn user(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self::new(Sender::User, content, attachments)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, content, Vec::new())
    }

    fn new(sender: Sender, content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender,
            content: content.into(),
            timestamp: chrono::Utc::now(),
            attachments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// Classified result of exactly one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success {
        reply: String,
        /// Present only when the backend supplied a session id in the body.
        session_id: Option<String>,
    },
    Failure {
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("nothing to send: message is empty and no files are staged")]
    EmptySubmit,
    #[error("a send is already in flight")]
    SendInFlight,
    #[error("network error: {0}")]
    Network(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("duplicate message id: {0}")]
    DuplicateId(String),
}
