use chatbot_core::transcript::{BOT_MARKER, USER_MARKER};
use crate::app::{App, FocusPane};
use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

const INPUT_PLACEHOLDER: &str = "ask me anything...";

fn status_color(app: &App) -> Color {
    let (r, g, b) = app.connection().rgb();
    Color::Rgb(r, g, b)
}

/// Style a transcript line by its marker. Text is never interpreted beyond that.
fn transcript_line(line: &str) -> Line<'static> {
    let styled_prefix = |prefix: &str, color: Color, rest: &str| {
        Line::from(vec![
            Span::styled(
                prefix.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(rest.to_string()),
        ])
    };

    if let Some(rest) = line.strip_prefix(USER_MARKER) {
        styled_prefix(USER_MARKER, Color::Cyan, rest)
    } else if let Some(rest) = line.strip_prefix(BOT_MARKER) {
        styled_prefix(BOT_MARKER, Color::Yellow, rest)
    } else if let Some(rest) = line.strip_prefix("Error: ") {
        styled_prefix("Error: ", Color::Red, rest)
    } else {
        Line::from(line.to_string())
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_body(app, frame, body_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Chatbot ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("{} ", app.service.base_url()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled("● ", Style::default().fg(status_color(app))),
        Span::styled(
            app.connection().label(),
            Style::default().fg(status_color(app)).add_modifier(Modifier::BOLD),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_body(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, history_area] = Layout::horizontal([
        Constraint::Percentage(70),
        Constraint::Percentage(30),
    ])
    .areas(area);

    // Input grows with its line count, up to 6 lines of text
    let input_lines = app.input.split('\n').count().clamp(1, 6) as u16;
    let [transcript_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(input_lines + 2),
    ])
    .areas(chat_area);

    render_transcript(app, frame, transcript_area);
    render_input(app, frame, input_area);
    render_history(app, frame, history_area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store inner dimensions for scroll calculations
    app.transcript_height = area.height.saturating_sub(2);
    app.transcript_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let transcript = app.session.transcript();
    let mut lines: Vec<Line> = if transcript.is_empty() {
        vec![Line::from(Span::styled(
            "Type a question below and press Enter.",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        transcript.lines().map(transcript_line).collect()
    };

    if app.is_busy() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.transcript_scroll, 0));

    frame.render_widget(paragraph, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Input && !app.is_busy();
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let title = if app.is_busy() {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        format!(" generating{} ", dots)
    } else {
        " Ask (Enter to send, Shift+Enter for newline) ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let text = if app.input.is_empty() {
        Text::from(Span::styled(INPUT_PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        Text::from(app.input.split('\n').map(|l| Line::from(l.to_string())).collect::<Vec<_>>())
    };

    // Keep the cursor line visible when the input is taller than the box
    let (cursor_row, cursor_col) = cursor_row_col(&app.input, app.cursor);
    let inner_height = area.height.saturating_sub(2);
    let scroll = cursor_row.saturating_sub(inner_height.saturating_sub(1));

    let input = Paragraph::new(text).block(block).scroll((scroll, 0));
    frame.render_widget(input, area);

    if focused {
        frame.set_cursor_position(Position::new(
            area.x + 1 + cursor_col,
            area.y + 1 + cursor_row - scroll,
        ));
    }
}

/// Row and column (in chars) of the cursor within multi-line input.
fn cursor_row_col(input: &str, cursor: usize) -> (u16, u16) {
    let before: String = input.chars().take(cursor).collect();
    let row = before.matches('\n').count();
    let col = before.rsplit('\n').next().map_or(0, |l| l.chars().count());
    (row as u16, col as u16)
}

fn render_history(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::History;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" History ");

    if app.recent.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No questions yet",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .recent
        .iter()
        .map(|exchange| ListItem::new(exchange.summary()))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(if focused { Color::Cyan } else { Color::DarkGray })
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.history_state);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: &[(&str, &str)] = match app.focus {
        FocusPane::Input => &[
            ("Enter", "send"),
            ("↑↓", "recall"),
            ("Tab", "history"),
            ("^Y", "copy"),
            ("^L", "clear"),
            ("PgUp/PgDn", "scroll"),
            ("^C", "quit"),
        ],
        FocusPane::History => &[
            ("j/k", "select"),
            ("Enter", "open"),
            ("c", "copy"),
            ("Tab", "input"),
            ("^C", "quit"),
        ],
    };

    let mut spans: Vec<Span> = Vec::new();
    if let Some((notice, _)) = &app.notice {
        spans.push(Span::styled(
            format!(" {} ", notice),
            Style::default().bg(Color::Green).fg(Color::Black).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
    }
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
        spans.push(Span::raw(" "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
