//! The per-question interaction flow.
//!
//! A send moves through `start` (validate, take the in-flight guard),
//! `preflight` (apply the health check) and `finish` (apply the reply, log,
//! release the guard). UIs that run the network calls on a background task
//! drive these steps themselves; [`ChatClient`] runs them in sequence.

use crate::clipboard::{self, Clipboard};
use crate::connection::ConnectionState;
use crate::error::ChatError;
use crate::history::{ChatExchange, HistoryLog};
use crate::normalize::normalize;
use crate::service::{QaService, Reply};
use crate::transcript::Transcript;

pub struct ChatSession {
    connection: ConnectionState,
    transcript: Transcript,
    in_flight: bool,
    history: HistoryLog,
}

impl ChatSession {
    pub fn new(history: HistoryLog) -> Self {
        Self {
            connection: ConnectionState::Checking,
            transcript: Transcript::new(),
            in_flight: false,
            history,
        }
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn set_connection(&mut self, state: ConnectionState) {
        if state != self.connection {
            tracing::info!(status = state.label(), "connection status changed");
        }
        self.connection = state;
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Validate `input` and take the in-flight guard.
    ///
    /// Returns `Ok(None)` for blank input (nothing changes) and `Err(Busy)`
    /// while another send is unresolved.
    pub fn start(&mut self, input: &str) -> Result<Option<String>, ChatError> {
        let question = input.trim();
        if question.is_empty() {
            return Ok(None);
        }
        if self.in_flight {
            tracing::debug!("send rejected, request already in flight");
            return Err(ChatError::Busy);
        }

        self.in_flight = true;
        self.connection = ConnectionState::Checking;
        Ok(Some(question.to_string()))
    }

    /// Apply the pre-send health check.
    pub fn preflight(&mut self, question: &str, state: ConnectionState) -> Result<(), ChatError> {
        self.set_connection(state);

        if !state.is_connected() {
            self.in_flight = false;
            self.transcript.show_error(&ChatError::NotConnected.to_string());
            return Err(ChatError::NotConnected);
        }

        self.transcript.show_question(question);
        Ok(())
    }

    /// Apply the service's reply, record the exchange and release the guard.
    pub fn finish(
        &mut self,
        question: &str,
        result: Result<Reply, ChatError>,
    ) -> Result<Reply, ChatError> {
        self.in_flight = false;

        match &result {
            Ok(reply) => {
                self.set_connection(ConnectionState::Connected);
                self.transcript.append_answer(&normalize(&reply.answer));
                self.history.record(question, &reply.answer, &reply.metadata);
            }
            Err(e) => {
                let message = e.to_string();
                match e {
                    ChatError::Service(_) => self.set_connection(ConnectionState::Connected),
                    ChatError::Transport(_) | ChatError::NotConnected => {
                        self.set_connection(ConnectionState::Disconnected)
                    }
                    ChatError::Busy => {}
                }
                tracing::warn!(error = %message, "question failed");
                self.transcript.show_error(&message);
                if let Some(tag) = e.log_tag() {
                    self.history.record(question, &message, tag);
                }
            }
        }

        result
    }

    /// Redisplay a logged exchange.
    pub fn show_exchange(&mut self, exchange: &ChatExchange) {
        self.transcript
            .show_exchange(&exchange.question, &normalize(&exchange.response));
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    pub fn copy_response(&self, clipboard: &mut dyn Clipboard) -> bool {
        clipboard::copy_response(&self.transcript, clipboard)
    }
}

/// A [`ChatSession`] bound to a service, for callers that can await each send.
pub struct ChatClient<S: QaService> {
    service: S,
    session: ChatSession,
}

impl<S: QaService> ChatClient<S> {
    pub fn new(service: S, history: HistoryLog) -> Self {
        Self {
            service,
            session: ChatSession::new(history),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn check_connection(&mut self) -> ConnectionState {
        let state = ConnectionState::from_healthy(self.service.health().await);
        self.session.set_connection(state);
        state
    }

    /// Send `input` through the full flow. `Ok(None)` means the input was blank.
    ///
    /// Whatever the outcome, the transcript already reflects it when this returns.
    pub async fn send(&mut self, input: &str) -> Result<Option<Reply>, ChatError> {
        let Some(question) = self.session.start(input)? else {
            return Ok(None);
        };

        let state = ConnectionState::from_healthy(self.service.health().await);
        self.session.preflight(&question, state)?;

        let result = self.service.ask(&question).await;
        self.session.finish(&question, result).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::LOG_KEY;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Store handle that tests can keep reading after handing a clone to the log.
    #[derive(Clone, Default)]
    struct SharedStore(Arc<Mutex<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> crate::error::StorageResult<Option<String>> {
            self.0.lock().unwrap().get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> crate::error::StorageResult<()> {
            self.0.lock().unwrap().set(key, value)
        }
    }

    impl SharedStore {
        fn entries(&self) -> Vec<ChatExchange> {
            match self.get(LOG_KEY).unwrap() {
                Some(raw) => serde_json::from_str(&raw).unwrap(),
                None => Vec::new(),
            }
        }
    }

    struct FakeService {
        healthy: AtomicBool,
        reply: Result<Reply, ChatError>,
        asks: AtomicUsize,
    }

    impl FakeService {
        fn new(healthy: bool, reply: Result<Reply, ChatError>) -> Self {
            Self {
                healthy: AtomicBool::new(healthy),
                reply,
                asks: AtomicUsize::new(0),
            }
        }
    }

    impl QaService for FakeService {
        async fn health(&self) -> bool {
            self.healthy.load(Ordering::SeqCst)
        }

        async fn ask(&self, _question: &str) -> Result<Reply, ChatError> {
            self.asks.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn answer(text: &str, metadata: &str) -> Result<Reply, ChatError> {
        Ok(Reply {
            answer: text.to_string(),
            metadata: metadata.to_string(),
        })
    }

    fn client(service: FakeService) -> (ChatClient<FakeService>, SharedStore) {
        let store = SharedStore::default();
        let history = HistoryLog::new(Box::new(store.clone()));
        (ChatClient::new(service, history), store)
    }

    #[tokio::test]
    async fn test_successful_send() {
        let (mut client, store) = client(FakeService::new(true, answer("Hi", "m1")));

        let reply = client.send("Hello").await.unwrap().unwrap();
        assert_eq!(reply.answer, "Hi");
        assert_eq!(client.session().transcript().as_str(), "You: Hello\n\nBot: Hi");
        assert_eq!(client.session().connection(), ConnectionState::Connected);
        assert!(!client.session().is_busy());

        let entries = store.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].question, "Hello");
        assert_eq!(entries[0].response, "Hi");
        assert_eq!(entries[0].metadata, "m1");
    }

    #[tokio::test]
    async fn test_answer_is_normalized_but_logged_raw() {
        let (mut client, store) =
            client(FakeService::new(true, answer("# Title\n**bold** [a](http://b)", "m")));

        client.send("q").await.unwrap();
        assert_eq!(
            client.session().transcript().as_str(),
            "You: q\n\nBot: Title\nbold a (http://b)"
        );
        assert_eq!(store.entries()[0].response, "# Title\n**bold** [a](http://b)");
    }

    #[tokio::test]
    async fn test_input_is_trimmed() {
        let (mut client, store) = client(FakeService::new(true, answer("Hi", "m")));
        client.send("  Hello \n").await.unwrap();
        assert_eq!(client.session().transcript().as_str(), "You: Hello\n\nBot: Hi");
        assert_eq!(store.entries()[0].question, "Hello");
    }

    #[tokio::test]
    async fn test_blank_input_is_noop() {
        let (mut client, store) = client(FakeService::new(true, answer("Hi", "m")));
        client.send("Hello").await.unwrap();
        let before = client.session().transcript().clone();

        for input in ["", "   ", "\n\t "] {
            assert_eq!(client.send(input).await, Ok(None));
        }

        assert_eq!(client.session().transcript(), &before);
        assert_eq!(store.entries().len(), 1);
        assert_eq!(client.service().asks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disconnected_send_never_posts() {
        let (mut client, store) = client(FakeService::new(false, answer("Hi", "m")));

        assert_eq!(client.send("Hello").await, Err(ChatError::NotConnected));
        assert_eq!(
            client.session().transcript().as_str(),
            "Error: Not connected to the server"
        );
        assert_eq!(client.session().connection(), ConnectionState::Disconnected);
        assert_eq!(client.service().asks.load(Ordering::SeqCst), 0);
        assert!(store.entries().is_empty());
        assert!(!client.session().is_busy());
    }

    #[tokio::test]
    async fn test_recovers_when_service_comes_back() {
        let (mut client, _store) = client(FakeService::new(false, answer("Hi", "m")));
        assert!(client.send("Hello").await.is_err());

        client.service().healthy.store(true, Ordering::SeqCst);
        assert!(client.send("Hello").await.is_ok());
        assert_eq!(client.session().connection(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_service_error() {
        let (mut client, store) =
            client(FakeService::new(true, Err(ChatError::Service("bad".into()))));

        assert_eq!(client.send("Hello").await, Err(ChatError::Service("bad".into())));
        assert_eq!(client.session().transcript().as_str(), "Error: bad");
        assert_eq!(client.session().connection(), ConnectionState::Connected);

        let entries = store.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].response, "bad");
        assert_eq!(entries[0].metadata, "Error");
    }

    #[tokio::test]
    async fn test_transport_error_flips_status() {
        let (mut client, store) = client(FakeService::new(
            true,
            Err(ChatError::Transport("Server returned 500: Internal Server Error".into())),
        ));

        assert!(client.send("Hello").await.is_err());
        assert_eq!(
            client.session().transcript().as_str(),
            "Error: Server returned 500: Internal Server Error"
        );
        assert_eq!(client.session().connection(), ConnectionState::Disconnected);

        let entries = store.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].metadata, "Connection Error");
        assert_eq!(entries[0].response, "Server returned 500: Internal Server Error");
    }

    #[tokio::test]
    async fn test_check_connection_updates_status() {
        let (mut client, _store) = client(FakeService::new(true, answer("Hi", "m")));
        assert_eq!(client.session().connection(), ConnectionState::Checking);
        assert_eq!(client.check_connection().await, ConnectionState::Connected);
        assert_eq!(client.session().connection().label(), "Connected");
    }

    #[test]
    fn test_second_start_rejected_while_in_flight() {
        let mut session = ChatSession::new(HistoryLog::new(Box::new(MemoryStore::new())));

        let first = session.start("one").unwrap();
        assert_eq!(first.as_deref(), Some("one"));
        assert!(session.is_busy());
        assert_eq!(session.start("two"), Err(ChatError::Busy));

        session.preflight("one", ConnectionState::Connected).unwrap();
        assert_eq!(session.start("two"), Err(ChatError::Busy));
        assert_eq!(session.transcript().as_str(), "You: one\n\n");

        session.finish("one", answer("1", "m")).unwrap();
        assert!(!session.is_busy());
        assert_eq!(session.start("two").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_blank_start_while_busy_is_still_noop() {
        let mut session = ChatSession::new(HistoryLog::new(Box::new(MemoryStore::new())));
        session.start("one").unwrap();
        assert_eq!(session.start("  "), Ok(None));
    }

    #[test]
    fn test_show_logged_exchange() {
        let mut session = ChatSession::new(HistoryLog::new(Box::new(MemoryStore::new())));
        let exchange = ChatExchange::new("Hello", "**Hi**", "m");
        session.show_exchange(&exchange);
        assert_eq!(session.transcript().as_str(), "You: Hello\n\nBot: Hi");
    }
}
