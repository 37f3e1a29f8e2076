use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::{App, Focus, InputMode};
use crate::conversation::Role;
use crate::input::TextField;
use crate::upload::{Notice, CHUNK_OVERLAP_RANGE, CHUNK_SIZE_RANGE};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after_open = &rest[start + 2..];
        let Some(len) = after_open.find("**") else { break };
        if len == 0 {
            // "****" is not bold text
            spans.push(Span::raw(rest[..start + 4].to_string()));
            rest = &rest[start + 4..];
            continue;
        }

        if start > 0 {
            spans.push(Span::raw(rest[..start].to_string()));
        }
        spans.push(Span::styled(
            after_open[..len].to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        rest = &after_open[len + 2..];
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    Line::from(spans)
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

    // Upload panel on the left, chat on the right
    let [upload_area, chat_area] = Layout::horizontal([
        Constraint::Length(36),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_header(app, frame, header_area);
    render_upload_panel(app, frame, upload_area);
    render_chat(app, frame, chat_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let pending = app.dispatcher.in_flight();
    let status = if pending > 0 {
        format!(" [{} messages, {} pending]", app.conversation.len(), pending)
    } else {
        format!(" [{} messages]", app.conversation.len())
    };

    let title = Line::from(vec![
        Span::styled(" RAG Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.base_url.clone(), Style::default().fg(Color::Gray)),
        Span::styled(status, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" EDIT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: &[(&str, &str)] = match (app.input_mode, app.focus) {
        (InputMode::Editing, Focus::ChatInput) => &[
            (" Enter ", " send "),
            (" Alt+Enter ", " newline "),
            (" Tab ", " focus "),
            (" ^U ", " upload "),
            (" Esc ", " stop typing "),
        ],
        (InputMode::Editing, _) => &[
            (" Enter ", " upload "),
            (" Up/Down ", " step "),
            (" Tab ", " focus "),
            (" Esc ", " stop typing "),
        ],
        (InputMode::Normal, _) => &[
            (" i ", " edit "),
            (" j/k ", " scroll "),
            (" +/- ", " step "),
            (" u ", " upload "),
            (" Tab ", " focus "),
            (" q ", " quit "),
        ],
    };

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    for (key, label) in pairs {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_upload_panel(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Upload Document ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [path_area, size_area, overlap_area, notice_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(inner);

    let form = &app.uploader.form;
    render_field(app, frame, path_area, " PDF file path ", &form.file_path, Focus::FilePath);

    let (min, max, step) = CHUNK_SIZE_RANGE;
    let size_title = format!(" Chunk Size ({}-{}, step {}) ", min, max, step);
    render_field(app, frame, size_area, &size_title, &form.chunk_size, Focus::ChunkSize);

    let (min, max, step) = CHUNK_OVERLAP_RANGE;
    let overlap_title = format!(" Chunk Overlap ({}-{}, step {}) ", min, max, step);
    render_field(app, frame, overlap_area, &overlap_title, &form.chunk_overlap, Focus::ChunkOverlap);

    let notice_text = if app.uploader.is_uploading() {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Text::from(Span::styled(
            format!("Uploading{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else {
        match app.uploader.notice() {
            Some(Notice::Success(text)) => {
                Text::from(Span::styled(text.clone(), Style::default().fg(Color::Green)))
            }
            Some(Notice::Failure(text)) => {
                Text::from(Span::styled(text.clone(), Style::default().fg(Color::Red)))
            }
            None => Text::from(Span::styled(
                "Enter a path and press Ctrl+U to upload",
                Style::default().fg(Color::DarkGray),
            )),
        }
    };

    let notice = Paragraph::new(notice_text).wrap(Wrap { trim: true });
    frame.render_widget(notice, notice_area);
}

fn render_field(app: &App, frame: &mut Frame, area: Rect, title: &str, field: &TextField, focus: Focus) {
    let focused = app.focus == focus;
    render_text_input(app, frame, area, title, field, focused, Color::White);
}

fn render_text_input(
    app: &App,
    frame: &mut Frame,
    area: Rect,
    title: &str,
    field: &TextField,
    focused: bool,
    text_color: Color,
) {
    let border_color = match (focused, app.input_mode) {
        (true, InputMode::Editing) => Color::Yellow,
        (true, InputMode::Normal) => Color::Cyan,
        _ => Color::DarkGray,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_col) = field.visible(inner_width);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(text_color))
        .block(block);
    frame.render_widget(input, area);

    // Show cursor when editing
    if focused && app.input_mode == InputMode::Editing {
        frame.set_cursor_position((area.x + cursor_col as u16 + 1, area.y + 1));
    }
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [transcript_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    app.chat_area = Some(transcript_area);

    // Inner size minus borders
    app.chat_height = transcript_area.height.saturating_sub(2);
    let inner_width = transcript_area.width.saturating_sub(2);

    // Measure with the same wrapping the frame uses, before the block adds borders
    let chat = Paragraph::new(transcript_text(app)).wrap(Wrap { trim: false });
    app.transcript_height = chat.line_count(inner_width).min(u16::MAX as usize) as u16;

    // Follow the newest message once the new sizes are known
    if app.conversation.take_follow() {
        app.scroll_chat_to_bottom();
    }

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, transcript_area);

    let app = &*app;
    let focused = app.focus == Focus::ChatInput;
    render_text_input(app, frame, input_area, " Ask me anything... ", &app.chat_input, focused, Color::Cyan);
}

fn transcript_text(app: &App) -> Text<'static> {
    let waiting = app.dispatcher.is_waiting();
    if app.conversation.is_empty() && !waiting {
        return Text::from(Line::from(Span::styled(
            "No messages yet. Ask me anything!",
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Center);
    }

    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.conversation.messages() {
        match msg.role {
            Role::User => {
                lines.push(
                    Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ))
                    .alignment(Alignment::Right),
                );
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()).alignment(Alignment::Right));
                }
            }
            Role::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Assistant:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if waiting {
        lines.push(Line::from(Span::styled(
            "Assistant:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    Text::from(lines)
}
