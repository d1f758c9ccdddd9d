/// Line prefix marking the user's question.
pub const USER_MARKER: &str = "You: ";
/// Line prefix marking the bot's answer.
pub const BOT_MARKER: &str = "Bot: ";

const CLEARED_GREETING: &str = "Chat cleared! How can I help you today?";

/// The text currently on screen. Replaced per exchange, never accumulated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    text: String,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    /// Start a new exchange: the transcript becomes just the echoed question.
    pub fn show_question(&mut self, question: &str) {
        self.text = format!("{}{}\n\n", USER_MARKER, question);
    }

    pub fn append_answer(&mut self, plain_text: &str) {
        self.text.push_str(BOT_MARKER);
        self.text.push_str(plain_text);
    }

    /// Errors always supersede whatever was displayed.
    pub fn show_error(&mut self, message: &str) {
        self.text = format!("Error: {}", message);
    }

    /// Show a past exchange as if it had just happened.
    pub fn show_exchange(&mut self, question: &str, plain_text: &str) {
        self.show_question(question);
        self.append_answer(plain_text);
    }

    pub fn clear(&mut self) {
        self.text = format!("{}{}", BOT_MARKER, CLEARED_GREETING);
    }

    /// Text of the last bot segment: everything after the last line starting
    /// with [`BOT_MARKER`], through to the end. `None` if there is no such
    /// line or the segment is empty.
    pub fn last_bot_segment(&self) -> Option<String> {
        let mut segment: Option<String> = None;

        for line in self.text.split('\n') {
            if let Some(rest) = line.strip_prefix(BOT_MARKER) {
                segment = Some(rest.to_string());
                continue;
            }
            if let Some(segment) = segment.as_mut() {
                segment.push('\n');
                segment.push_str(line);
            }
        }

        segment.filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_then_answer() {
        let mut transcript = Transcript::new();
        transcript.show_question("Hello");
        transcript.append_answer("Hi");
        assert_eq!(transcript.as_str(), "You: Hello\n\nBot: Hi");
    }

    #[test]
    fn test_error_replaces_everything() {
        let mut transcript = Transcript::new();
        transcript.show_question("Hello");
        transcript.show_error("bad");
        assert_eq!(transcript.as_str(), "Error: bad");
    }

    #[test]
    fn test_bot_segment_multiline() {
        let mut transcript = Transcript::new();
        transcript.show_exchange("q", "line one\nline two");
        assert_eq!(
            transcript.last_bot_segment().as_deref(),
            Some("line one\nline two")
        );
    }

    #[test]
    fn test_bot_segment_takes_last_marker() {
        let mut transcript = Transcript::new();
        transcript.show_exchange("q", "first\nBot: second\nmore");
        assert_eq!(transcript.last_bot_segment().as_deref(), Some("second\nmore"));
    }

    #[test]
    fn test_no_bot_segment() {
        let mut transcript = Transcript::new();
        assert!(transcript.last_bot_segment().is_none());
        transcript.show_question("Hello");
        assert!(transcript.last_bot_segment().is_none());
        transcript.show_error("bad");
        assert!(transcript.last_bot_segment().is_none());
    }

    #[test]
    fn test_empty_bot_segment_is_none() {
        let mut transcript = Transcript::new();
        transcript.show_exchange("q", "");
        assert!(transcript.last_bot_segment().is_none());
    }

    #[test]
    fn test_clear_shows_greeting() {
        let mut transcript = Transcript::new();
        transcript.show_exchange("q", "a");
        transcript.clear();
        assert_eq!(
            transcript.last_bot_segment().as_deref(),
            Some("Chat cleared! How can I help you today?")
        );
    }
}
