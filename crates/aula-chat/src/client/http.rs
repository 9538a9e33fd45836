//! The reqwest-backed transport: one attempt per call, outcome classified.

use async_trait::async_trait;
use tracing::debug;

use crate::{ChatError, ChatTransport, Outcome, Payload};

use super::config::ClientConfig;

const CHAT_PATH: &str = "/api/chat";

/// Successful response body from `POST /api/chat`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ChatReply {
    pub respuesta: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Error response body. The backend usually sends a `detail` string; when
/// it does not, the status line is used instead.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// HTTP client for the chat backend.
pub struct HttpClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { config, http }
    }

    fn chat_url(&self) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), CHAT_PATH)
    }

    /// Perform one exchange. No retries: a failed attempt surfaces as an
    /// error and the caller decides whether to submit again.
    pub async fn exchange(&self, payload: Payload) -> Result<ChatReply, ChatError> {
        debug!(
            session_id = %payload.session_id,
            files = payload.files.len(),
            text_len = payload.text.len(),
            "dispatching chat request"
        );

        let form = payload.into_form()?;
        let response = self
            .http
            .post(self.chat_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(ErrorBody {
                    detail: Some(detail),
                }) if !detail.is_empty() => detail,
                _ => status_line(status),
            };
            return Err(ChatError::Server(message));
        }

        response
            .json::<ChatReply>()
            .await
            .map_err(|e| ChatError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChatTransport for HttpClient {
    async fn send(&self, payload: Payload) -> Outcome {
        match self.exchange(payload).await {
            Ok(reply) => Outcome::Success {
                reply: reply.respuesta,
                session_id: reply.session_id.filter(|id| !id.is_empty()),
            },
            Err(err) => {
                debug!(error = %err, "chat request failed");
                Outcome::Failure {
                    message: failure_message(err),
                }
            }
        }
    }
}

/// The human-readable failure text shown in the transcript. Server errors
/// surface the backend's own `detail` verbatim; transport and decode
/// failures keep their descriptive prefix.
fn failure_message(err: ChatError) -> String {
    match err {
        ChatError::Server(message) => message,
        other => other.to_string(),
    }
}

/// Fallback error text when the error body carries no detail.
fn status_line(status: reqwest::StatusCode) -> String {
    format!(
        "Error: {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
    .trim_end()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_parses_with_and_without_session_id() {
        let full: ChatReply =
            serde_json::from_str(r#"{"respuesta":"4","session_id":"s2"}"#).unwrap();
        assert_eq!(full.respuesta, "4");
        assert_eq!(full.session_id.as_deref(), Some("s2"));

        let bare: ChatReply = serde_json::from_str(r#"{"respuesta":"Got it"}"#).unwrap();
        assert_eq!(bare.respuesta, "Got it");
        assert_eq!(bare.session_id, None);
    }

    #[test]
    fn error_body_detail_is_optional() {
        let with: ErrorBody = serde_json::from_str(r#"{"detail":"rate limited"}"#).unwrap();
        assert_eq!(with.detail.as_deref(), Some("rate limited"));

        let without: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(without.detail, None);
    }

    #[test]
    fn status_line_includes_code_and_reason() {
        assert_eq!(
            status_line(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
            "Error: 500 Internal Server Error"
        );
    }

    #[test]
    fn server_detail_surfaces_verbatim() {
        let message = failure_message(ChatError::Server("rate limited".into()));
        assert_eq!(message, "rate limited");
    }

    #[test]
    fn decode_failures_are_marked_malformed() {
        let message = failure_message(ChatError::Decode("missing field".into()));
        assert!(message.starts_with("malformed response"));
    }

    #[test]
    fn chat_url_handles_trailing_slash() {
        let client = HttpClient::new(ClientConfig::new("http://localhost:8000/"));
        assert_eq!(client.chat_url(), "http://localhost:8000/api/chat");
    }
}
