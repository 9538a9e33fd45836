//! ChatSession struct, state accessors, and outcome reconciliation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::attachments::AttachmentStager;
use crate::identity::SessionIdentity;
use crate::transcript::MessageStore;
use crate::{ChatError, Message, Outcome};

use super::types::{SessionEvent, SessionObserver};

/// Transcript entries for failed exchanges carry this prefix so a renderer
/// can tell them apart from a normal reply.
pub(super) const ERROR_PREFIX: &str = "Assistant Error:";

/// The conversation session controller.
///
/// Exclusively owns the transcript, the session identity and the
/// attachment stager for its lifetime. All mutation flows through the
/// submit sequence; nothing else touches these fields.
pub struct ChatSession {
    pub(super) transcript: MessageStore,
    pub(super) identity: SessionIdentity,
    pub(super) stager: AttachmentStager,
    pub(super) sending: Arc<AtomicBool>,
    pub(super) last_error: Option<String>,
    pub(super) observers: Vec<SessionObserver>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            transcript: MessageStore::new(),
            identity: SessionIdentity::new(),
            stager: AttachmentStager::new(),
            sending: Arc::new(AtomicBool::new(false)),
            last_error: None,
            observers: Vec::new(),
        }
    }

    /// The transcript in display order.
    pub fn messages(&self) -> &[Message] {
        self.transcript.all()
    }

    pub fn session_id(&self) -> &str {
        self.identity.current()
    }

    /// True while exactly one exchange is in flight.
    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    /// The failure message of the most recent exchange, cleared when a new
    /// submit begins.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn stager(&self) -> &AttachmentStager {
        &self.stager
    }

    pub fn stager_mut(&mut self) -> &mut AttachmentStager {
        &mut self.stager
    }

    /// Register an observer. Called after every transcript mutation and on
    /// each sending-flag edge.
    pub fn subscribe(&mut self, observer: impl Fn(SessionEvent) + Send + Sync + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub(super) fn notify(&self, event: SessionEvent) {
        for observer in &self.observers {
            observer(event);
        }
    }

    /// Start over for a different user: staged files are dropped (their
    /// handles released), the transcript is emptied, and a fresh local
    /// session id replaces the current one.
    pub fn reset_identity(&mut self) -> String {
        self.stager.release_all();
        self.transcript.clear();
        let id = self.identity.reset().to_string();
        info!(session_id = %id, "conversation reset");
        self.notify(SessionEvent::TranscriptCleared);
        id
    }

    /// Reconcile one dispatch outcome onto the transcript. Exactly one
    /// assistant message is appended either way.
    pub(super) fn apply(&mut self, outcome: Outcome) -> Result<(), ChatError> {
        match outcome {
            Outcome::Success { reply, session_id } => {
                self.transcript.append(Message::assistant(reply))?;
                if let Some(id) = session_id {
                    self.identity.adopt(&id);
                }
            }
            Outcome::Failure { message } => {
                warn!(error = %message, "exchange failed");
                self.transcript
                    .append(Message::assistant(format!("{ERROR_PREFIX} {message}")))?;
                self.last_error = Some(message);
            }
        }
        self.notify(SessionEvent::MessageAppended);
        Ok(())
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.stager.release_all();
        debug_assert_eq!(
            self.stager.outstanding_handles(),
            0,
            "display handles leaked past session teardown"
        );
    }
}
