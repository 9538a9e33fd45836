//! Wire payload composition.
//!
//! A [`Payload`] is the inspectable form of one request: trimmed question,
//! session id, and the staged file parts in staging order. The HTTP layer
//! turns it into a multipart form just before the send.

use crate::attachments::StagedFile;
use crate::ChatError;

/// One binary part of the multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// A composed request, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub text: String,
    pub session_id: String,
    pub files: Vec<FilePart>,
}

impl Payload {
    /// Compose a payload from the submitted text, the drained staged files
    /// and the current session id. Callers validate first: a payload with
    /// empty trimmed text and no files is never composed.
    pub fn compose(text: &str, files: Vec<StagedFile>, session_id: &str) -> Self {
        let text = text.trim().to_string();
        debug_assert!(
            !text.is_empty() || !files.is_empty(),
            "composed an empty payload"
        );
        Self {
            text,
            session_id: session_id.to_string(),
            files: files
                .into_iter()
                .map(|f| FilePart {
                    name: f.name,
                    mime_type: f.mime_type,
                    bytes: f.bytes,
                })
                .collect(),
        }
    }

    /// Build the multipart form: one `pregunta` text field, one
    /// `session_id` field, one `files` part per attachment carrying its
    /// original filename.
    pub fn into_form(self) -> Result<reqwest::multipart::Form, ChatError> {
        let mut form = reqwest::multipart::Form::new()
            .text("pregunta", self.text)
            .text("session_id", self.session_id);

        for file in self.files {
            let part = reqwest::multipart::Part::bytes(file.bytes)
                .file_name(file.name)
                .mime_str(&file.mime_type)
                .map_err(|e| {
                    ChatError::Network(format!("could not build file part: {e}"))
                })?;
            form = form.part("files", part);
        }

        Ok(form)
    }
}
