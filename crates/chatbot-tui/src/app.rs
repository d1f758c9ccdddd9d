use chatbot_core::{
    ChatError, ChatExchange, ChatSession, Clipboard, ConnectionState, HttpService, Reply,
};
use ratatui::widgets::ListState;

/// How many logged exchanges the history panel shows.
pub const HISTORY_PANEL_LEN: usize = 10;

/// Ticks (300ms each) a footer notice stays visible.
const NOTICE_TICKS: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    History,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: FocusPane,
    pub session: ChatSession,
    pub service: HttpService,
    pub clipboard: Box<dyn Clipboard>,

    // Input state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars
    recall_index: Option<usize>,

    // Transcript view
    pub transcript_scroll: u16,
    pub transcript_height: u16, // Inner height of transcript area for scroll calculations
    pub transcript_width: u16,  // Inner width of transcript area for wrap calculations

    // History panel
    pub recent: Vec<ChatExchange>,
    pub history_state: ListState,

    // Animation / feedback
    pub animation_frame: u8, // 0-2 for ellipsis animation
    pub notice: Option<(String, u8)>,
}

impl App {
    pub fn new(session: ChatSession, service: HttpService, clipboard: Box<dyn Clipboard>) -> Self {
        let mut app = Self {
            should_quit: false,
            focus: FocusPane::Input,
            session,
            service,
            clipboard,

            input: String::new(),
            cursor: 0,
            recall_index: None,

            transcript_scroll: 0,
            transcript_height: 0,
            transcript_width: 0,

            recent: Vec::new(),
            history_state: ListState::default(),

            animation_frame: 0,
            notice: None,
        };
        app.refresh_history();
        app
    }

    pub fn connection(&self) -> ConnectionState {
        self.session.connection()
    }

    pub fn is_busy(&self) -> bool {
        self.session.is_busy()
    }

    pub fn refresh_history(&mut self) {
        self.recent = self.session.history().recent(HISTORY_PANEL_LEN);
        if self.recent.is_empty() {
            self.history_state.select(None);
        } else if self.history_state.selected().map_or(true, |i| i >= self.recent.len()) {
            self.history_state.select(Some(0));
        }
    }

    // Sending

    /// Validate the input and take the in-flight guard. Returns the question to
    /// dispatch, or `None` if nothing should be sent.
    pub fn begin_send(&mut self) -> Option<String> {
        match self.session.start(&self.input) {
            Ok(question) => question,
            Err(ChatError::Busy) => None,
            Err(e) => {
                tracing::warn!(error = %e, "send rejected");
                None
            }
        }
    }

    pub fn on_connection(&mut self, state: ConnectionState) {
        self.session.set_connection(state);
    }

    pub fn on_preflight(&mut self, question: &str, state: ConnectionState) {
        // Input stays put when we're offline so the user can retry it
        if self.session.preflight(question, state).is_ok() {
            self.input.clear();
            self.cursor = 0;
            self.recall_index = None;
        }
        self.transcript_scroll = 0;
    }

    pub fn on_reply(&mut self, question: &str, result: Result<Reply, ChatError>) {
        let _ = self.session.finish(question, result);
        self.refresh_history();
        self.scroll_transcript_to_bottom();
    }

    // Transcript actions

    pub fn copy_response(&mut self) {
        if self.session.copy_response(self.clipboard.as_mut()) {
            self.notice = Some(("Copied!".to_string(), NOTICE_TICKS));
        }
    }

    /// No-op while a request is in flight; the transcript belongs to that exchange.
    pub fn clear_chat(&mut self) {
        if self.is_busy() {
            return;
        }
        self.session.clear();
        self.transcript_scroll = 0;
    }

    pub fn load_selected_history(&mut self) {
        if self.is_busy() {
            return;
        }
        let Some(exchange) = self
            .history_state
            .selected()
            .and_then(|i| self.recent.get(i))
            .cloned()
        else {
            return;
        };
        self.session.show_exchange(&exchange);
        self.transcript_scroll = 0;
        self.focus = FocusPane::Input;
    }

    pub fn history_nav_down(&mut self) {
        let len = self.recent.len();
        if len > 0 {
            let i = self.history_state.selected().unwrap_or(0);
            self.history_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn history_nav_up(&mut self) {
        let i = self.history_state.selected().unwrap_or(0);
        self.history_state.select(Some(i.saturating_sub(1)));
    }

    // Question recall (Up/Down in the input)

    pub fn recall_older(&mut self) {
        let questions = self.session.history().entries();
        if questions.is_empty() {
            return;
        }
        let next = match self.recall_index {
            None => 0,
            Some(i) if i + 1 < questions.len() => i + 1,
            Some(i) => i,
        };
        self.recall_index = Some(next);
        self.set_input(&questions[questions.len() - 1 - next].question);
    }

    pub fn recall_newer(&mut self) {
        match self.recall_index {
            None => {}
            Some(0) => {
                self.recall_index = None;
                self.set_input("");
            }
            Some(i) => {
                let questions = self.session.history().entries();
                let next = (i - 1).min(questions.len().saturating_sub(1));
                self.recall_index = Some(next);
                if let Some(entry) = questions.get(questions.len().saturating_sub(1 + next)) {
                    let question = entry.question.clone();
                    self.set_input(&question);
                }
            }
        }
    }

    fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        self.cursor = self.input.chars().count();
    }

    // Scrolling

    pub fn scroll_down(&mut self) {
        let max_scroll = self.transcript_line_count().saturating_sub(self.transcript_height);
        if self.transcript_scroll < max_scroll {
            self.transcript_scroll = self.transcript_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(1);
    }

    pub fn scroll_page_down(&mut self) {
        let page = self.transcript_height.max(1);
        let max_scroll = self.transcript_line_count().saturating_sub(self.transcript_height);
        self.transcript_scroll = (self.transcript_scroll + page).min(max_scroll);
    }

    pub fn scroll_page_up(&mut self) {
        let page = self.transcript_height.max(1);
        self.transcript_scroll = self.transcript_scroll.saturating_sub(page);
    }

    pub fn scroll_transcript_to_bottom(&mut self) {
        let visible_height = if self.transcript_height > 0 {
            self.transcript_height
        } else {
            20
        };
        self.transcript_scroll = self.transcript_line_count().saturating_sub(visible_height);
    }

    /// Rendered line count of the transcript after wrapping.
    fn transcript_line_count(&self) -> u16 {
        // Use actual width for wrap calculation, default to 50 if not set
        let wrap_width = if self.transcript_width > 0 {
            self.transcript_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for line in self.session.transcript().lines() {
            // Use character count, not byte length, for proper UTF-8 handling
            let char_count = line.chars().count();
            let wrapped = if char_count == 0 { 1 } else { char_count.div_ceil(wrap_width) };
            total_lines = total_lines.saturating_add(wrapped as u16);
        }
        total_lines
    }

    /// Tick animation frame and expire notices (called by Tick event)
    pub fn tick(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if let Some((_, ticks)) = self.notice.as_mut() {
            *ticks = ticks.saturating_sub(1);
            if *ticks == 0 {
                self.notice = None;
            }
        }
    }
}
