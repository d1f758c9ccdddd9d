//! Persisted question/answer log.
//!
//! The whole log is one pretty-printed JSON array under [`LOG_KEY`]. Appends are
//! read-modify-write; a log that can't be read back is left alone rather than
//! overwritten.

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::storage::KeyValueStore;

pub const LOG_KEY: &str = "chatbot_logs";

/// Default metadata when the service answers without any.
pub const UNKNOWN_METADATA: &str = "Unknown metadata";

/// One logged round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatExchange {
    pub timestamp: String,
    pub question: String,
    pub response: String,
    pub metadata: String,
}

impl ChatExchange {
    pub fn new(question: &str, response: &str, metadata: &str) -> Self {
        Self::at(Utc::now(), question, response, metadata)
    }

    pub fn at(time: DateTime<Utc>, question: &str, response: &str, metadata: &str) -> Self {
        Self {
            timestamp: time.to_rfc3339_opts(SecondsFormat::Millis, true),
            question: question.to_string(),
            response: response.to_string(),
            metadata: metadata.to_string(),
        }
    }

    /// Local wall-clock time of the exchange as `HH:MM:SS`.
    pub fn time_label(&self) -> String {
        match DateTime::parse_from_rfc3339(&self.timestamp) {
            Ok(time) => time.with_timezone(&Local).format("%H:%M:%S").to_string(),
            Err(_) => "--:--:--".to_string(),
        }
    }

    /// One-line summary for history lists: `HH:MM:SS - question`.
    pub fn summary(&self) -> String {
        format!("{} - {}", self.time_label(), truncate_question(&self.question))
    }
}

fn truncate_question(question: &str) -> String {
    // Newlines would break single-line list rendering
    let flat = question.replace('\n', " ");
    if flat.chars().count() > 30 {
        let head: String = flat.chars().take(27).collect();
        format!("{}...", head)
    } else {
        flat
    }
}

pub struct HistoryLog {
    store: Box<dyn KeyValueStore>,
}

impl HistoryLog {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Append an exchange stamped with the current time.
    ///
    /// Storage failures are logged and the entry is dropped; this never fails
    /// the caller.
    pub fn record(&mut self, question: &str, response: &str, metadata: &str) -> Option<ChatExchange> {
        let entry = ChatExchange::new(question, response, metadata);
        match self.append(entry) {
            Ok(entry) => {
                tracing::debug!(question = %entry.question, metadata = %entry.metadata, "chat log saved");
                Some(entry)
            }
            Err(e) => {
                tracing::error!(error = %e, "error saving chat log");
                None
            }
        }
    }

    fn append(&mut self, entry: ChatExchange) -> StorageResult<ChatExchange> {
        let mut entries = self.load()?;
        entries.push(entry.clone());
        let serialized = serde_json::to_string_pretty(&entries)?;
        self.store.set(LOG_KEY, &serialized)?;
        Ok(entry)
    }

    fn load(&self) -> StorageResult<Vec<ChatExchange>> {
        match self.store.get(LOG_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Every logged exchange, oldest first. Empty if the log is absent or unreadable.
    pub fn entries(&self) -> Vec<ChatExchange> {
        self.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read chat log");
            Vec::new()
        })
    }

    /// The newest `limit` exchanges, newest first.
    pub fn recent(&self, limit: usize) -> Vec<ChatExchange> {
        self.entries().into_iter().rev().take(limit).collect()
    }
}
