//! Attachment staging and display-handle lifecycle.
//!
//! Files a user has picked but not yet sent live here. Each staged file
//! gets a [`DisplayHandle`] — a transient, revocable reference a renderer
//! can use for previews without the transcript model holding file bytes.
//! Every allocated handle must be released exactly once; release is a CAS
//! on a shared flag, so clones of a handle cannot double-release it.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

/// A file as handed in by the caller (name, mime type, raw bytes).
#[derive(Debug, Clone)]
pub struct FileInput {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileInput {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// Transient display reference for a staged or sent attachment.
///
/// Clonable; all clones share one released flag. `uri()` returns `None`
/// once the handle has been released.
#[derive(Debug, Clone)]
pub struct DisplayHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    uri: String,
    released: AtomicBool,
    outstanding: Arc<AtomicUsize>,
}

impl DisplayHandle {
    /// The display URI, or `None` if the handle was already released.
    pub fn uri(&self) -> Option<&str> {
        if self.inner.released.load(Ordering::Acquire) {
            None
        } else {
            Some(&self.inner.uri)
        }
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    /// Release the underlying display resource. Idempotent: the first call
    /// wins, later calls (from any clone) are no-ops.
    pub fn release(&self) {
        if self
            .inner
            .released
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            self.inner.outstanding.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Allocates display handles and counts the ones not yet released.
#[derive(Debug)]
struct HandleTracker {
    outstanding: Arc<AtomicUsize>,
}

impl HandleTracker {
    fn new() -> Self {
        Self {
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn allocate(&self) -> DisplayHandle {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        DisplayHandle {
            inner: Arc::new(HandleInner {
                uri: format!("mem://attachment/{}", uuid::Uuid::new_v4()),
                released: AtomicBool::new(false),
                outstanding: Arc::clone(&self.outstanding),
            }),
        }
    }

    fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }
}

/// Display metadata for an attachment carried by a transcript message.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub handle: DisplayHandle,
}

/// A staged file: display metadata plus the bytes that will go on the wire.
#[derive(Debug)]
pub struct StagedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub handle: DisplayHandle,
}

impl StagedFile {
    /// Display-side view of this file (shares the handle).
    pub fn as_attachment(&self) -> Attachment {
        Attachment {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            handle: self.handle.clone(),
        }
    }
}

/// Holds the files selected for the next send.
///
/// Staging order is preserved. A file whose name is already staged is
/// ignored, matching the picker behavior the transcript expects.
#[derive(Debug)]
pub struct AttachmentStager {
    tracker: HandleTracker,
    staged: Vec<StagedFile>,
}

impl AttachmentStager {
    pub fn new() -> Self {
        Self {
            tracker: HandleTracker::new(),
            staged: Vec::new(),
        }
    }

    /// Stage a file for the next send. Returns `None` (and allocates
    /// nothing) when a file with the same name is already staged.
    pub fn stage(&mut self, file: FileInput) -> Option<Attachment> {
        if self.staged.iter().any(|s| s.name == file.name) {
            debug!(name = %file.name, "duplicate attachment name ignored");
            return None;
        }
        let handle = self.tracker.allocate();
        let staged = StagedFile {
            name: file.name,
            mime_type: file.mime_type,
            bytes: file.bytes,
            handle,
        };
        let attachment = staged.as_attachment();
        debug!(name = %staged.name, mime = %staged.mime_type, "staged attachment");
        self.staged.push(staged);
        Some(attachment)
    }

    /// Remove one staged file by name, releasing its handle immediately.
    /// No-op if no such file is staged.
    pub fn unstage(&mut self, name: &str) {
        if let Some(pos) = self.staged.iter().position(|s| s.name == name) {
            let staged = self.staged.remove(pos);
            staged.handle.release();
            debug!(name = %name, "unstaged attachment");
        }
    }

    /// Take the whole staged set, transferring handle ownership to the
    /// caller. The stager is empty afterwards; the caller is now on the
    /// hook for releasing each handle.
    pub fn drain_all(&mut self) -> Vec<StagedFile> {
        std::mem::take(&mut self.staged)
    }

    /// Release every held handle and clear the set. Used on teardown or
    /// identity reset, when the staged files will never be sent.
    pub fn release_all(&mut self) {
        for staged in self.staged.drain(..) {
            staged.handle.release();
        }
    }

    /// Display views of the currently staged files, in staging order.
    pub fn previews(&self) -> Vec<Attachment> {
        self.staged.iter().map(StagedFile::as_attachment).collect()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Handles allocated by this stager and not yet released, including
    /// ones currently drained out for a send.
    pub fn outstanding_handles(&self) -> usize {
        self.tracker.outstanding()
    }
}

impl Default for AttachmentStager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> FileInput {
        FileInput::new(name, "image/png", vec![1, 2, 3])
    }

    #[test]
    fn duplicate_name_is_ignored() {
        let mut stager = AttachmentStager::new();
        assert!(stager.stage(file("a.png")).is_some());
        assert!(stager.stage(file("a.png")).is_none());
        assert_eq!(stager.len(), 1);
        // The rejected stage must not have allocated a handle.
        assert_eq!(stager.outstanding_handles(), 1);
    }

    #[test]
    fn staging_order_is_preserved() {
        let mut stager = AttachmentStager::new();
        stager.stage(file("a.png"));
        stager.stage(file("b.png"));
        stager.stage(file("c.png"));
        let names: Vec<_> = stager.previews().iter().map(|a| a.name.clone()).collect();
        assert_eq!(names, ["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn unstage_releases_exactly_one_handle() {
        let mut stager = AttachmentStager::new();
        let a = stager.stage(file("a.png")).unwrap();
        stager.stage(file("b.png"));
        assert_eq!(stager.outstanding_handles(), 2);

        stager.unstage("a.png");
        assert_eq!(stager.len(), 1);
        assert_eq!(stager.outstanding_handles(), 1);
        assert!(a.handle.is_released());

        // Absent name is a no-op.
        stager.unstage("a.png");
        assert_eq!(stager.outstanding_handles(), 1);
    }

    #[test]
    fn release_is_idempotent_across_clones() {
        let mut stager = AttachmentStager::new();
        let a = stager.stage(file("a.png")).unwrap();
        let clone = a.handle.clone();

        a.handle.release();
        clone.release();
        a.handle.release();
        assert_eq!(stager.outstanding_handles(), 0);
    }

    #[test]
    fn uri_is_gone_after_release() {
        let mut stager = AttachmentStager::new();
        let a = stager.stage(file("a.png")).unwrap();
        assert!(a.handle.uri().unwrap().starts_with("mem://attachment/"));
        a.handle.release();
        assert_eq!(a.handle.uri(), None);
    }

    #[test]
    fn drain_transfers_ownership() {
        let mut stager = AttachmentStager::new();
        stager.stage(file("a.png"));
        stager.stage(file("b.png"));

        let drained = stager.drain_all();
        assert_eq!(drained.len(), 2);
        assert!(stager.is_empty());
        // Handles survive the drain until the caller releases them.
        assert_eq!(stager.outstanding_handles(), 2);

        for staged in &drained {
            staged.handle.release();
        }
        assert_eq!(stager.outstanding_handles(), 0);
    }

    #[test]
    fn release_all_clears_everything() {
        let mut stager = AttachmentStager::new();
        stager.stage(file("a.png"));
        stager.stage(file("b.png"));
        stager.release_all();
        assert!(stager.is_empty());
        assert_eq!(stager.outstanding_handles(), 0);
    }

    #[test]
    fn every_stage_gets_exactly_one_release() {
        // Arbitrary stage/unstage sequence: releases observed must equal
        // stages, with no double release possible.
        let mut stager = AttachmentStager::new();
        stager.stage(file("a.png"));
        stager.stage(file("b.png"));
        stager.unstage("a.png");
        stager.stage(file("c.png"));
        stager.stage(file("b.png")); // duplicate, no handle
        stager.unstage("missing"); // no-op
        assert_eq!(stager.outstanding_handles(), 2);
        stager.release_all();
        assert_eq!(stager.outstanding_handles(), 0);
    }
}
