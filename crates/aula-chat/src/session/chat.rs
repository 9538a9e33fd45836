//! Async submit path for ChatSession.

use tracing::debug;

use crate::attachments::{DisplayHandle, StagedFile};
use crate::{ChatError, ChatTransport, Message, Payload};

use super::manager::ChatSession;
use super::types::{SendGuard, SessionEvent};

impl ChatSession {
    /// Submit one turn: the text plus whatever is currently staged.
    ///
    /// Rejected up front (no side effects) when there is nothing to send
    /// or a send is already in flight. Otherwise the user message is
    /// appended before the network call resolves, and the reconciled or
    /// failed reply lands as a trailing assistant message.
    pub async fn submit(
        &mut self,
        transport: &dyn ChatTransport,
        text: impl Into<String>,
    ) -> Result<(), ChatError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() && self.stager.is_empty() {
            return Err(ChatError::EmptySubmit);
        }
        let _guard = SendGuard::acquire(&self.sending)?;

        let drained = self.stager.drain_all();
        let attachments = drained.iter().map(StagedFile::as_attachment).collect();
        let handles: Vec<DisplayHandle> = drained.iter().map(|s| s.handle.clone()).collect();

        // Optimistic update: the user sees their own message immediately.
        if let Err(err) = self.transcript.append(Message::user(trimmed, attachments)) {
            release_all(&handles);
            return Err(err);
        }
        self.notify(SessionEvent::MessageAppended);
        self.last_error = None;
        self.notify(SessionEvent::SendingChanged(true));

        debug!(
            session_id = %self.identity.current(),
            files = drained.len(),
            "submitting turn"
        );
        let payload = Payload::compose(trimmed, drained, self.identity.current());
        let outcome = transport.send(payload).await;
        let applied = self.apply(outcome);

        // Display consumers have had their chance once the exchange
        // settles; every handle drained for this send is released here,
        // exactly once.
        release_all(&handles);

        drop(_guard);
        self.notify(SessionEvent::SendingChanged(false));
        applied
    }
}

fn release_all(handles: &[DisplayHandle]) {
    for handle in handles {
        handle.release();
    }
}
