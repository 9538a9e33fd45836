//! Session identity: the opaque token correlating our turns with the
//! backend's conversation state.

use tracing::{debug, info};

/// Owns the single active session id.
///
/// Generated locally at startup; the backend may hand back a different id
/// in a reply (it creates one when we send none it knows), in which case
/// we adopt it and use it for every later turn.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    id: String,
}

impl SessionIdentity {
    pub fn new() -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        debug!(session_id = %id, "session identity created");
        Self { id }
    }

    pub fn current(&self) -> &str {
        &self.id
    }

    /// Adopt a backend-supplied id. No-op unless `candidate` is non-empty
    /// and differs from the current id. Returns whether a replacement
    /// happened.
    pub fn adopt(&mut self, candidate: &str) -> bool {
        if candidate.is_empty() || candidate == self.id {
            return false;
        }
        info!(old = %self.id, new = %candidate, "session id rotated by backend");
        self.id = candidate.to_string();
        true
    }

    /// Replace the identity with a fresh local id unconditionally. Used
    /// when the human behind the session changes.
    pub fn reset(&mut self) -> &str {
        self.id = uuid::Uuid::new_v4().to_string();
        debug!(session_id = %self.id, "session identity reset");
        &self.id
    }
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self::new()
    }
}
