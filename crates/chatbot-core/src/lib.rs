pub mod clipboard;
pub mod config;
pub mod connection;
pub mod error;
pub mod history;
pub mod normalize;
pub mod service;
pub mod session;
pub mod storage;
pub mod transcript;

// Re-export main types for convenience
pub use clipboard::{copy_response, Clipboard, SystemClipboard};
pub use config::Config;
pub use connection::ConnectionState;
pub use error::{ChatError, StorageError};
pub use history::{ChatExchange, HistoryLog, LOG_KEY, UNKNOWN_METADATA};
pub use normalize::normalize;
pub use service::{HttpService, QaService, Reply};
pub use session::{ChatClient, ChatSession};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use transcript::Transcript;
