//! Chat screen rendering
//!
//! Everything here is a pure function of the latest session snapshot and
//! the local input state.

use super::input::InputState;
use crate::conversation::Message;
use crate::runtime::SessionSnapshot;
use crate::state_machine::HealthState;
use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const TITLE: &str = "Stock Support Chatbot";
const SUBTITLE: &str = concat!(
    "Ask me about stock trading information, ",
    "like \"What is the notional traded for stock 0148.HK?\""
);

const EXAMPLE_QUERIES: [&str; 3] = [
    "What is the notional traded for stock 0148.HK?",
    "Show me today's trading for 0700.HK",
    "How much was traded for 0148.HK today?",
];

/// Status banner text and colour for a health state
pub fn status_line(health: HealthState) -> (&'static str, Color) {
    match health {
        HealthState::Disconnected => ("Backend server not connected", Color::Red),
        HealthState::Unknown | HealthState::Checking => {
            ("Checking AI model status...", Color::Yellow)
        }
        HealthState::ConnectedReady => ("AI Models: Fully Loaded ✓", Color::Green),
        HealthState::ConnectedLoading => (
            "AI Models: Loading... (First time may take a few minutes)",
            Color::Yellow,
        ),
    }
}

/// Hint shown under the transcript
pub fn input_hint(snapshot: &SessionSnapshot) -> &'static str {
    if snapshot.is_busy() {
        "AI is thinking..."
    } else if snapshot.health() == HealthState::Disconnected {
        "Backend not connected. Press Ctrl+R to retry the connection."
    } else {
        "Enter to send, Ctrl+R to re-check status, PgUp/PgDn to scroll, Esc to quit"
    }
}

/// `HK$` amount with thousands separators and two decimals
pub fn format_notional(amount: f64) -> String {
    let fixed = format!("{amount:.2}");
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("HK${grouped}.{cents}")
}

fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

pub fn draw(frame: &mut Frame<'_>, snapshot: &SessionSnapshot, input: &InputState) {
    let [header, status, transcript, hint, composer] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(3),
    ])
    .areas(frame.area());

    draw_header(frame, header);
    draw_status(frame, status, snapshot.health());
    draw_transcript(frame, transcript, snapshot, input.scroll_back());

    frame.render_widget(
        Paragraph::new(input_hint(snapshot)).style(Style::default().fg(Color::DarkGray)),
        hint,
    );

    draw_composer(frame, composer, snapshot.can_submit(), input.text());
}

fn draw_header(frame: &mut Frame<'_>, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            TITLE,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(SUBTITLE, Style::default().fg(Color::Gray))),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn draw_status(frame: &mut Frame<'_>, area: Rect, health: HealthState) {
    let (text, color) = status_line(health);
    let mut spans = vec![Span::styled(
        text,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if health == HealthState::Disconnected {
        spans.push(Span::raw("  [Ctrl+R] Retry Connection"));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn welcome_lines() -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::default(),
        Line::from("Welcome! How can I help you with stock information today?"),
        Line::default(),
        Line::from(Span::styled(
            "Try asking:",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    lines.extend(EXAMPLE_QUERIES.iter().map(|query| {
        Line::from(Span::styled(
            format!("\"{query}\""),
            Style::default().fg(Color::Blue),
        ))
    }));
    lines
}

fn message_lines(message: &Message) -> Vec<Line<'_>> {
    let (author, color) = if message.is_user() {
        ("You", Color::Cyan)
    } else {
        ("Assistant", Color::White)
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(author, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("  {}", format_time(message.created_at)),
            Style::default().fg(Color::DarkGray),
        ),
    ])];
    lines.extend(message.text.lines().map(Line::from));

    let detail = Style::default().fg(Color::Green);
    if let Some(amount) = message.notional_amount {
        lines.push(Line::from(Span::styled(
            format!("Notional: {}", format_notional(amount)),
            detail.add_modifier(Modifier::BOLD),
        )));
    }
    if let Some(code) = &message.stock_code {
        lines.push(Line::from(Span::styled(format!("Stock: {code}"), detail)));
    }
    if let Some(date) = &message.query_date {
        lines.push(Line::from(Span::styled(format!("Date: {date}"), detail)));
    }

    lines.push(Line::default());
    lines
}

fn draw_transcript(
    frame: &mut Frame<'_>,
    area: Rect,
    snapshot: &SessionSnapshot,
    scroll_back: u16,
) {
    let block = Block::default().borders(Borders::ALL).title("Chat");

    if snapshot.is_empty() {
        frame.render_widget(
            Paragraph::new(welcome_lines())
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let mut lines: Vec<Line<'_>> = snapshot.messages.iter().flat_map(message_lines).collect();
    if snapshot.is_busy() {
        lines.push(Line::from(Span::styled(
            "AI is thinking...",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    // Stick to the bottom unless the user paged up. Scroll offsets count
    // wrapped rows, not logical lines.
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    let height = area.height.saturating_sub(2);
    let rows = paragraph.line_count(area.width.saturating_sub(2));
    let total = u16::try_from(rows).unwrap_or(u16::MAX);
    let offset = total.saturating_sub(height).saturating_sub(scroll_back);

    frame.render_widget(paragraph.block(block).scroll((offset, 0)), area);
}

fn draw_composer(frame: &mut Frame<'_>, area: Rect, enabled: bool, text: &str) {
    let (content, style) = if enabled {
        (text, Style::default())
    } else if text.is_empty() {
        ("Type your question about stock trading...", Style::default().fg(Color::DarkGray))
    } else {
        (text, Style::default().fg(Color::DarkGray))
    };

    frame.render_widget(
        Paragraph::new(content)
            .style(style)
            .block(Block::default().borders(Borders::ALL).title("Message")),
        area,
    );

    if enabled {
        let width = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
        let x = area
            .x
            .saturating_add(1)
            .saturating_add(width)
            .min(area.right().saturating_sub(2));
        frame.set_cursor_position((x, area.y + 1));
    }
}
