use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::tui::{app::ChatApp, message::MessageRole};

/// Render the main UI
pub fn render_ui(f: &mut Frame, app: &ChatApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar
            Constraint::Min(5),    // Messages
            Constraint::Length(3), // Input box
        ])
        .split(f.size());

    render_status_bar(f, app, chunks[0]);
    render_messages(f, app, chunks[1]);
    render_input_box(f, app, chunks[2]);
}

/// Render the status bar
fn render_status_bar(f: &mut Frame, app: &ChatApp, area: Rect) {
    let mut spans = vec![
        Span::styled("Model: ", Style::default().fg(Color::Gray)),
        Span::styled(app.model_name(), Style::default().fg(Color::Green)),
    ];

    if app.is_loading() {
        spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled("streaming...", Style::default().fg(Color::Yellow)));
    }

    let status_bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Parley"));

    f.render_widget(status_bar, area);
}

/// Render the messages area
fn render_messages(f: &mut Frame, app: &ChatApp, area: Rect) {
    let messages: Vec<ListItem> = app
        .messages()
        .iter()
        .map(|msg| {
            let (color, role_name) = match msg.role {
                MessageRole::User => (Color::Cyan, "You"),
                MessageRole::Assistant => (Color::Green, "Parley"),
            };

            // Create role label with appropriate color
            let role_span = Span::styled(
                format!("{}: ", role_name),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            );

            let content_span = Span::raw(&msg.content);

            let mut lines = Vec::new();
            lines.push(Line::from(vec![role_span, content_span]));

            // Streamed responses show a cursor until they are finalized
            if msg.pending {
                lines.push(Line::from(Span::styled(
                    "  ...",
                    Style::default().fg(Color::DarkGray),
                )));
            }

            // The terminal cannot draw images; show the asset reference
            for attachment in &msg.attachments {
                lines.push(Line::from(Span::styled(
                    format!("  [image: {} ({})]", attachment.name, attachment.path.display()),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                )));
            }

            ListItem::new(Text::from(lines))
        })
        .collect();

    let messages_list = List::new(messages)
        .block(Block::default().borders(Borders::ALL).title("Conversation"))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));

    f.render_widget(messages_list, area);
}

/// Render the input box
fn render_input_box(f: &mut Frame, app: &ChatApp, area: Rect) {
    let input = Paragraph::new(app.input())
        .style(Style::default())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Input")
                .style(Style::default().fg(if app.is_loading() {
                    Color::DarkGray
                } else {
                    Color::White
                })),
        );

    f.render_widget(input, area);

    // Show cursor if not loading
    if !app.is_loading() {
        f.set_cursor(
            // Put cursor past the end of the input text
            area.x + app.input().len() as u16 + 1,
            // Position at the start of the input line
            area.y + 1,
        );
    }
}
