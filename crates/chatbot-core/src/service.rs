//! HTTP access to the question-answering service.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::error::ChatError;
use crate::history::UNKNOWN_METADATA;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    metadata: Option<String>,
}

/// A successful answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub answer: String,
    pub metadata: String,
}

/// The two endpoints the chat client needs.
pub trait QaService {
    /// `true` when the service reports healthy. Never fails.
    fn health(&self) -> impl Future<Output = bool> + Send;

    /// Ask one question and wait for the full answer.
    fn ask(&self, question: &str) -> impl Future<Output = Result<Reply, ChatError>> + Send;
}

#[derive(Clone)]
pub struct HttpService {
    client: Client,
    base_url: String,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl QaService for HttpService {
    async fn health(&self) -> bool {
        let url = format!("{}/health", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "health check returned error status");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "connection error");
                false
            }
        }
    }

    async fn ask(&self, question: &str) -> Result<Reply, ChatError> {
        let url = format!("{}/ask", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&AskRequest { question })
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Transport(status_message(status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        parse_reply(&body)
    }
}

fn status_message(status: StatusCode) -> String {
    format!(
        "Server returned {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
}

/// Interpret an `/ask` response body. `error` wins over `answer` when both are set.
pub fn parse_reply(body: &str) -> Result<Reply, ChatError> {
    let parsed: AskResponse = serde_json::from_str(body)
        .map_err(|e| ChatError::Transport(format!("Malformed response: {}", e)))?;

    if let Some(error) = parsed.error {
        return Err(ChatError::Service(error));
    }

    match parsed.answer {
        Some(answer) => Ok(Reply {
            answer,
            metadata: parsed
                .metadata
                .unwrap_or_else(|| UNKNOWN_METADATA.to_string()),
        }),
        None => Err(ChatError::Transport(
            "Malformed response: missing answer or error".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer_with_metadata() {
        let reply = parse_reply(r#"{"answer":"Hi","metadata":"m1"}"#).unwrap();
        assert_eq!(reply.answer, "Hi");
        assert_eq!(reply.metadata, "m1");
    }

    #[test]
    fn test_parse_answer_without_metadata() {
        let reply = parse_reply(r#"{"answer":"Hi"}"#).unwrap();
        assert_eq!(reply.metadata, "Unknown metadata");
    }

    #[test]
    fn test_parse_service_error() {
        assert_eq!(
            parse_reply(r#"{"error":"bad"}"#),
            Err(ChatError::Service("bad".to_string()))
        );
    }

    #[test]
    fn test_error_wins_over_answer() {
        assert_eq!(
            parse_reply(r#"{"answer":"Hi","error":"bad"}"#),
            Err(ChatError::Service("bad".to_string()))
        );
    }

    #[test]
    fn test_parse_malformed_json() {
        match parse_reply("<html>oops</html>") {
            Err(ChatError::Transport(msg)) => assert!(msg.starts_with("Malformed response")),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_object() {
        assert!(matches!(parse_reply("{}"), Err(ChatError::Transport(_))));
    }

    #[test]
    fn test_status_message() {
        assert_eq!(
            status_message(StatusCode::INTERNAL_SERVER_ERROR),
            "Server returned 500: Internal Server Error"
        );
        assert_eq!(
            status_message(StatusCode::from_u16(599).unwrap()),
            "Server returned 599: "
        );
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let service = HttpService::new("http://localhost:5000/");
        assert_eq!(service.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_string(&AskRequest { question: "Hello" }).unwrap();
        assert_eq!(body, r#"{"question":"Hello"}"#);
    }
}
