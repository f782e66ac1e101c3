use chrono::{Local, TimeZone};
use nova_core::{Message, Role};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, CredentialSource, FocusPane, SettingsField, CATEGORIES};
use crate::palette::{palette, Palette};
use crate::wrap::{visible_window, wrap_text_to_width};

/// Below this width the sidebar is hidden.
const SIDEBAR_MIN_TERMINAL_WIDTH: u16 = 80;
const SIDEBAR_WIDTH: u16 = 24;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let colors = palette(app.theme());

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(2),
    ])
    .areas(area);

    render_header(app, frame, header_area, &colors);

    let chat_column = if area.width >= SIDEBAR_MIN_TERMINAL_WIDTH {
        let [sidebar_area, chat_column] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)]).areas(body_area);
        render_sidebar(app, frame, sidebar_area, &colors);
        chat_column
    } else {
        app.sidebar_area = None;
        body_area
    };

    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(chat_column);
    render_chat(app, frame, chat_area, &colors);
    render_input(app, frame, input_area, &colors);

    render_footer(app, frame, footer_area, &colors);

    // Render popups (in order of priority)
    if let Some(alert) = &app.alert {
        render_alert(alert, frame, area, &colors);
    } else if app.show_settings {
        render_settings(app, frame, area, &colors);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect, colors: &Palette) {
    let title = Line::from(vec![
        Span::styled(" Nova — AI Chat ", Style::default().fg(colors.accent).add_modifier(Modifier::BOLD)),
        Span::styled(format!("v{} ", env!("CARGO_PKG_VERSION")), Style::default().fg(colors.muted)),
        Span::styled(format!("· {} ", app.model_name), Style::default().fg(colors.muted)),
    ]);
    let hint = Line::from(Span::styled(" Ctrl+S Settings ", Style::default().fg(colors.accent)))
        .alignment(Alignment::Right);

    let block = Paragraph::new(title).style(Style::default().bg(colors.header_bg));
    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(hint), area);
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect, colors: &Palette) {
    app.sidebar_area = Some(area);

    let focused = app.focus == FocusPane::Sidebar;
    let border_color = if focused { colors.accent } else { colors.muted };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [brand_area, list_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(inner);

    let brand = Text::from(vec![
        Line::from(Span::styled(" ◆ Nova", Style::default().fg(colors.accent).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled("   Futuristic Chat", Style::default().fg(colors.muted))),
    ]);
    frame.render_widget(Paragraph::new(brand), brand_area);

    let mut items: Vec<ListItem> = CATEGORIES
        .iter()
        .map(|name| ListItem::new(format!(" ✦ {}", name)))
        .collect();
    items.push(ListItem::new(" ⚙ Settings").style(Style::default().fg(colors.muted)));

    let highlight = if focused {
        Style::default()
            .bg(colors.highlight_bg)
            .fg(colors.highlight_fg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let list = List::new(items).highlight_style(highlight);
    frame.render_stateful_widget(list, list_area, &mut app.sidebar_state);
}

fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(time) => time.format("%H:%M:%S").to_string(),
        None => String::new(),
    }
}

/// Lines for one message, pre-wrapped so the scroll maths is exact.
fn message_lines(msg: &Message, width: usize, colors: &Palette) -> Vec<Line<'static>> {
    let (label, color, alignment) = match msg.role {
        Role::User => ("You", colors.user, Alignment::Right),
        Role::Model => ("Nova", colors.model, Alignment::Left),
    };

    let mut lines = Vec::new();
    lines.push(
        Line::from(vec![
            Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("  {}", format_timestamp(msg.timestamp)),
                Style::default().fg(colors.muted),
            ),
        ])
        .alignment(alignment),
    );

    // Keep bubbles narrower than the pane so sides are distinguishable
    let bubble_width = (width * 4 / 5).max(1);
    let is_error = msg.role == Role::Model && msg.text.starts_with("Error: ");
    let text_style = if is_error {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(color)
    };
    for line in wrap_text_to_width(&msg.text, bubble_width) {
        lines.push(Line::from(Span::styled(line, text_style)).alignment(alignment));
    }

    lines.push(Line::default());
    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect, colors: &Palette) {
    app.chat_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.border))
        .title(" Chat ");
    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2);

    let pending = app.conversation.is_pending();
    let lines: Vec<Line> = if app.conversation.messages().is_empty() && !pending {
        vec![Line::from(Span::styled(
            "Say hello to start the conversation...",
            Style::default().fg(colors.muted),
        ))]
    } else {
        let mut lines: Vec<Line> = app
            .conversation
            .messages()
            .iter()
            .flat_map(|msg| message_lines(msg, inner_width, colors))
            .collect();

        if pending {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat(app.animation_frame as usize + 1);
            lines.push(Line::from(Span::styled(
                format!("typing{}", dots),
                Style::default().fg(colors.muted).add_modifier(Modifier::ITALIC),
            )));
        }
        lines
    };

    let total = lines.len() as u16;
    app.chat_max_scroll = total.saturating_sub(inner_height);
    if app.follow || app.chat_scroll > app.chat_max_scroll {
        app.chat_scroll = app.chat_max_scroll;
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect, colors: &Palette) {
    let focused = app.focus == FocusPane::Input && !app.show_settings && app.alert.is_none();
    let border_color = if focused { colors.accent } else { colors.muted };

    let title = if app.conversation.is_pending() {
        " Waiting for reply... "
    } else {
        " Message (Enter to send) "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let (shown, cursor_col) = visible_window(&app.input, app.input_cursor, inner_width);

    let visible = if app.input.is_empty() {
        Span::styled("Type your message…", Style::default().fg(colors.muted))
    } else {
        Span::styled(shown, Style::default().fg(colors.user))
    };

    frame.render_widget(Paragraph::new(Line::from(visible)).block(input_block), area);

    if focused {
        frame.set_cursor_position((area.x + cursor_col as u16 + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect, colors: &Palette) {
    let key_style = Style::default().bg(colors.highlight_bg).fg(colors.highlight_fg);
    let label_style = Style::default().fg(colors.muted);

    let hints: Vec<Span> = if app.show_settings {
        vec![
            Span::styled(" ↑/↓ ", key_style),
            Span::styled(" field ", label_style),
            Span::styled(" ←/→ ", key_style),
            Span::styled(" change ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" save ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ]
    } else if app.focus == FocusPane::Sidebar {
        vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" nav ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" select ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" chat ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ]
    } else {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" sidebar ", label_style),
            Span::styled(" Ctrl+S ", key_style),
            Span::styled(" settings ", label_style),
            Span::styled(" Ctrl+C ", key_style),
            Span::styled(" quit ", label_style),
        ]
    };

    let note = match &app.status {
        Some(status) => Span::styled(format!(" {}", status), Style::default().fg(colors.accent)),
        None => Span::styled(
            " Responses will be read aloud. Adjust voice pitch & theme in Settings.",
            label_style,
        ),
    };

    let footer = Paragraph::new(vec![Line::from(hints), Line::from(note)]);
    frame.render_widget(footer, area);
}

/// A centered rect of at most `width` x `height` inside `area`.
fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(2));
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

fn render_alert(message: &str, frame: &mut Frame, area: Rect, colors: &Palette) {
    let popup_area = popup_rect(area, 50, 5);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Notice ");

    let text = Text::from(vec![
        Line::from(message.to_string()),
        Line::default(),
        Line::from(Span::styled("Press any key to continue", Style::default().fg(colors.muted))),
    ]);
    let alert = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(alert, popup_area);
}

/// Mask the key, showing only the last four characters
fn mask_key(key: &str) -> String {
    let len = key.chars().count();
    if len <= 4 {
        "*".repeat(len)
    } else {
        let masked_len = len - 4;
        let last_four: String = key.chars().skip(masked_len).collect();
        format!("{}{}", "*".repeat(masked_len.min(20)), last_four)
    }
}

fn render_settings(app: &App, frame: &mut Frame, area: Rect, colors: &Palette) {
    let popup_area = popup_rect(area, 60, 14);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.accent))
        .title(" Settings ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let form = &app.settings;
    let key_source = match app.credential_source() {
        CredentialSource::Saved => "(saved)",
        CredentialSource::Env => "(using GEMINI_API_KEY)",
        CredentialSource::Missing => "(needs key)",
    };

    let row = |field: SettingsField, label: &str, value: String| -> Line<'static> {
        let selected = form.field == field;
        let marker = if selected { "> " } else { "  " };
        let label_style = if selected {
            Style::default().fg(colors.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let value_style = if selected {
            Style::default().fg(colors.highlight_fg).bg(colors.highlight_bg)
        } else {
            Style::default().fg(colors.user)
        };
        Line::from(vec![
            Span::styled(format!("{}{:<16}", marker, label), label_style),
            Span::styled(value, value_style),
        ])
    };

    let pitch_bar = {
        let filled = ((form.pitch / 2.0 * 20.0).round() as usize).min(20);
        format!("{}{} {:.2}", "█".repeat(filled), "░".repeat(20 - filled), form.pitch)
    };

    let lines = vec![
        row(SettingsField::ApiKey, "Gemini API Key", mask_key(&form.api_key)),
        Line::from(Span::styled(format!("  {:<16}{}", "", key_source), Style::default().fg(colors.muted))),
        Line::default(),
        row(SettingsField::Theme, "Theme", format!("◀ {} ▶", form.theme.display_name())),
        Line::default(),
        row(SettingsField::Voice, "Voice", format!("◀ {} ▶", app.settings_voice_label())),
        Line::default(),
        row(SettingsField::Pitch, "Voice Pitch", pitch_bar),
        Line::default(),
        Line::from(Span::styled(
            if app.conversation.speech_available() {
                "Enter to save, Esc to cancel."
            } else {
                "No speech synthesizer found; replies will not be spoken."
            },
            Style::default().fg(colors.muted),
        )),
    ];

    frame.render_widget(Paragraph::new(lines), inner);

    if form.field == SettingsField::ApiKey {
        let shown = mask_key(&form.api_key).chars().count();
        let total = form.api_key.chars().count();
        // Cursor sits over the masked text, which may be shorter than the key
        let cursor = form.api_key_cursor.saturating_sub(total.saturating_sub(shown));
        let cursor_x = inner.x + 18 + cursor as u16;
        if cursor_x < inner.x + inner.width {
            frame.set_cursor_position((cursor_x, inner.y));
        }
    }
}
