use bubblechat_core::{format_time, ChatModel, ChatRole, RenderedMessage, VoiceState};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, InputMode};

/// Bubbles never grow wider than this share of the chat area.
const BUBBLE_WIDTH_PERCENT: usize = 75;

/// Word-wrap `text` to `width` display columns, hard-breaking words that
/// don't fit. Wide glyphs (CJK, emoji) count as two columns.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            let mut word_width = word.width();

            if word_width > width {
                if current_width > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                let mut chunk = String::new();
                let mut chunk_width = 0;
                for ch in word.chars() {
                    let ch_width = ch.width().unwrap_or(0);
                    if chunk_width > 0 && chunk_width + ch_width > width {
                        lines.push(std::mem::take(&mut chunk));
                        chunk_width = 0;
                    }
                    chunk.push(ch);
                    chunk_width += ch_width;
                }
                word = chunk;
                word_width = chunk_width;
            }

            if current_width > 0 && current_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            if current_width > 0 {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(&word);
            current_width += word_width;
        }

        lines.push(current);
    }

    lines
}

fn role_color(role: ChatRole) -> Color {
    match role {
        ChatRole::User => Color::Cyan,
        ChatRole::Assistant => Color::Yellow,
    }
}

/// Lines for one bubble. Corners facing a grouped neighbour are drawn square,
/// free corners rounded; the sender label only heads the first bubble of a run.
fn bubble_lines(item: &RenderedMessage, chat_width: u16) -> Vec<Line<'static>> {
    let message = item.message;
    let max_inner = (chat_width as usize * BUBBLE_WIDTH_PERCENT / 100)
        .saturating_sub(4)
        .max(8);
    let wrapped = wrap_text(message.content(), max_inner);
    let inner = wrapped
        .iter()
        .map(|l| l.width())
        .max()
        .unwrap_or(0)
        .max(1);

    let border = Style::default().fg(role_color(message.role()));
    let alignment = match message.role() {
        ChatRole::User => Alignment::Right,
        ChatRole::Assistant => Alignment::Left,
    };

    let mut lines = Vec::with_capacity(wrapped.len() + 4);

    if !item.grouped_with_previous {
        lines.push(
            Line::from(vec![
                Span::styled(message.role().label(), border.add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!(" {}", format_time(&message.timestamp())),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
            .alignment(alignment),
        );
    }

    let (top_left, top_right) = if item.grouped_with_previous { ('┌', '┐') } else { ('╭', '╮') };
    let (bottom_left, bottom_right) = if item.grouped_with_next { ('└', '┘') } else { ('╰', '╯') };
    let rule = "─".repeat(inner + 2);

    lines.push(Line::styled(format!("{top_left}{rule}{top_right}"), border).alignment(alignment));
    for text in wrapped {
        let pad = inner.saturating_sub(text.width());
        lines.push(
            Line::from(vec![
                Span::styled("│ ", border),
                Span::raw(format!("{}{}", text, " ".repeat(pad))),
                Span::styled(" │", border),
            ])
            .alignment(alignment),
        );
    }
    lines.push(
        Line::styled(format!("{bottom_left}{rule}{bottom_right}"), border).alignment(alignment),
    );

    // Breathing room between runs of different senders
    if !item.grouped_with_next {
        lines.push(Line::default());
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    // Render popups (in order of priority)
    if app.session.alert().is_some() {
        render_alert(app, frame, area);
    } else if app.session.voice_state() == VoiceState::Listening {
        render_listening(frame, area);
    } else if app.show_model_picker {
        render_model_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (status, status_color) = match app.backend_online {
        Some(true) => ("online", Color::Green),
        Some(false) => ("offline", Color::Red),
        None => ("checking", Color::Gray),
    };

    let title = Line::from(vec![
        Span::styled(" bubblechat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("[{}] ", app.session.selected_model().display_name()),
            Style::default().fg(Color::White),
        ),
        Span::styled(format!("● {} ", status), Style::default().fg(status_color)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);

    let border_color = if app.input_mode == InputMode::Normal {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", app.session.selected_model().display_name()));

    let rendered = app.session.transcript().render();
    let text = if rendered.is_empty() && !app.session.is_sending() {
        Text::from(Span::styled(
            "Say hello to start the conversation...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = rendered
            .iter()
            .flat_map(|item| bubble_lines(item, inner_width))
            .collect();

        if app.session.is_sending() {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("AI is typing{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let total_lines = u16::try_from(text.lines.len()).unwrap_or(u16::MAX);
    app.update_chat_metrics(total_lines, inner_height, inner_width);

    let chat = Paragraph::new(text)
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let sending = app.session.is_sending();
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if sending {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    if sending {
        let waiting = Paragraph::new("Waiting for reply...")
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
            .block(block);
        frame.render_widget(waiting, area);
        return;
    }

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    // Scroll offset keeps the cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .session
        .input()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " CHAT ",
        InputMode::Editing => " TYPE ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Normal => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" v ", key_style),
            Span::styled(" voice ", label_style),
            Span::styled(" M ", key_style),
            Span::styled(" model ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" ^R ", key_style),
            Span::styled(" voice ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

/// Centered popup rect clamped to the frame.
fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn render_alert(app: &App, frame: &mut Frame, area: Rect) {
    let Some(alert) = app.session.alert() else {
        return;
    };

    let popup_area = popup_rect(area, 60, 8);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(format!(" {} ", alert.title));

    let text = Text::from(vec![
        Line::from(alert.body.clone()),
        Line::default(),
        Line::from(Span::styled("Press Enter to dismiss", Style::default().fg(Color::DarkGray))),
    ]);

    let popup = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(popup, popup_area);
}

fn render_listening(frame: &mut Frame, area: Rect) {
    let popup_area = popup_rect(area, 40, 5);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Voice input ");

    let text = Text::from(vec![
        Line::from(Span::styled("Listening... speak now", Style::default().bold())),
        Line::from(Span::styled("Esc to cancel", Style::default().fg(Color::DarkGray))),
    ]);

    let popup = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(popup, popup_area);
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let models = ChatModel::all();
    let popup_area = popup_rect(area, 60, models.len() as u16 + 2);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Model (Enter to select, Esc to cancel) ");

    let selected = app.session.selected_model();
    let items: Vec<ListItem> = models
        .iter()
        .map(|model| {
            let style = if *model == selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} ", model.display_name()), style),
                Span::styled(model.backend_id(), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.model_picker_state);
}
