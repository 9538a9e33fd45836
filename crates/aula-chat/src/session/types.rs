//! Session controller types and the single-flight guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::ChatError;

/// State change notifications delivered to subscribers. Coarse on purpose:
/// a renderer re-reads the fields it cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    MessageAppended,
    TranscriptCleared,
    SendingChanged(bool),
}

/// Subscriber callback invoked after every observable state change.
pub type SessionObserver = Box<dyn Fn(SessionEvent) + Send + Sync>;

/// Guard that clears the sending flag on drop, ensuring it is always
/// released even if the future is cancelled or an early return occurs.
pub(crate) struct SendGuard {
    flag: Arc<AtomicBool>,
}

impl SendGuard {
    /// Attempt to acquire the single-flight gate. Returns `Err` if a send
    /// is already in flight — the second submit is rejected, never queued.
    pub(crate) fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, ChatError> {
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(ChatError::SendInFlight);
        }
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for SendGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected_until_drop() {
        let flag = Arc::new(AtomicBool::new(false));

        let guard = SendGuard::acquire(&flag).unwrap();
        assert!(matches!(
            SendGuard::acquire(&flag),
            Err(ChatError::SendInFlight)
        ));

        drop(guard);
        assert!(SendGuard::acquire(&flag).is_ok());
    }
}
