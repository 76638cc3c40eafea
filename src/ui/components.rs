//! Shared UI components (status bar, spinner, modals).
//!
//! Small building blocks reused by the users page and the overlays.
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::AppState;
use crate::app::keymap::KeyAction;
use crate::error::ErrorInfo;
use crate::form::{EditUserForm, FormField};
use crate::row::UserRow;

const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Block with the themed border around every panel.
fn bordered<'a>(title: &'a str, app: &AppState) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border))
}

/// Bottom line: pending writes, the error banner, or a key hint.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let c = &app.controller;
    let mut pending = Vec::new();
    if c.create_state().pending {
        pending.push("creating");
    }
    if c.edit_state().pending {
        pending.push("saving");
    }
    if c.delete_state().pending {
        pending.push("deleting");
    }
    let (text, style) = if let Some(err) = c.last_error() {
        (
            format!(" Error: {err}  (Esc: dismiss)"),
            Style::default().fg(app.theme.error_fg).bg(app.theme.status_bg),
        )
    } else if !pending.is_empty() {
        (
            format!(" {}...", pending.join(", ")),
            Style::default().fg(app.theme.status_fg).bg(app.theme.status_bg),
        )
    } else {
        (
            " ?: help  n: new  e: edit  d: delete  r: refresh  q: quit".to_string(),
            Style::default().fg(app.theme.status_fg).bg(app.theme.status_bg),
        )
    };
    f.render_widget(Paragraph::new(text).style(style), area);
}

/// Animated placeholder while the list query is loading.
pub fn render_spinner(f: &mut Frame, area: Rect, app: &AppState) {
    let frame = (app.started_at.elapsed().as_millis() / 120) as usize % SPINNER.len();
    let rect = centered_rect(24, 3, area);
    let p = Paragraph::new(format!("{} Loading users", SPINNER[frame]))
        .style(Style::default().fg(app.theme.title))
        .block(bordered("", app));
    f.render_widget(p, rect);
}

/// Plain message panel, used when the page is not available.
pub fn render_notice(f: &mut Frame, area: Rect, app: &AppState, message: &str) {
    let p = Paragraph::new(message.to_string())
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(app.theme.text))
        .block(bordered("Users", app));
    f.render_widget(p, area);
}

/// Full-page error list shown when the list query failed.
pub fn render_errors(f: &mut Frame, area: Rect, app: &AppState, err: &ErrorInfo) {
    let lines = vec![
        Line::from(Span::styled(
            "Could not load users",
            Style::default().fg(app.theme.error_fg).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(vec![Span::raw("Kind: "), Span::raw(err.class.to_string())]),
        Line::from(vec![Span::raw("Message: "), Span::raw(err.message.clone())]),
        Line::raw(""),
        Line::from(Span::styled("r: retry   q: quit", Style::default().fg(app.theme.muted))),
    ];
    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(bordered("Errors", app));
    f.render_widget(p, area);
}

/// Create/edit form. `pending` disables the submit affordance.
pub fn render_form_modal(f: &mut Frame, area: Rect, app: &AppState, form: &EditUserForm, pending: bool) {
    let rect = centered_rect(60, 12, area);
    let marker = |field: FormField| if form.focus == field { "▶" } else { " " };
    let check = |on: bool| if on { "[x]" } else { "[ ]" };
    let submit = match (pending, form.is_create()) {
        (true, _) => "Saving...",
        (false, true) => "Create",
        (false, false) => "Save",
    };
    let mut lines = vec![
        Line::raw(format!("{} Name:  {}", marker(FormField::Name), form.name)),
        Line::raw(format!("{} Email: {}", marker(FormField::Email), form.email)),
        Line::raw(format!("{} Image: {}", marker(FormField::ImageUri), form.image_uri)),
        Line::raw(format!("{} {} Admin", marker(FormField::Admin), check(form.roles.admin))),
        Line::raw(format!("{} {} Editor", marker(FormField::Editor), check(form.roles.editor))),
        Line::raw(""),
        Line::from(Span::styled(
            format!("{} {}", marker(FormField::Submit), submit),
            if pending {
                Style::default().fg(app.theme.muted)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            },
        )),
    ];
    if let Some(err) = &form.error {
        lines.push(Line::from(Span::styled(err.to_string(), Style::default().fg(app.theme.error_fg))));
    }
    let title = match form.init_user() {
        Some(user) => format!("Edit {}", user.name),
        None => "New user".to_string(),
    };
    let p = Paragraph::new(lines).block(bordered(&title, app));
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Yes/no confirmation for deleting `row`. `pending` replaces the choices.
pub fn render_delete_confirm(f: &mut Frame, area: Rect, app: &AppState, row: &UserRow, pending: bool) {
    let rect = centered_rect(50, 7, area);
    let mut body = format!("Delete user '{}' ({})?\n\n", row.user.name, row.user.email);
    if pending {
        body.push_str("Deleting...");
    } else {
        body.push_str("  y: Yes    n: No");
    }
    let p = Paragraph::new(body).block(bordered("Confirm delete", app));
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Help overlay listing the current key bindings.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState) {
    let width = 64u16.min(area.width.saturating_sub(4)).max(40);
    let height = 20u16.min(area.height.saturating_sub(4)).max(12);
    let rect = centered_rect(width, height, area);

    let mut lines = vec![
        Line::from(Span::styled("Help", Style::default().add_modifier(Modifier::BOLD))),
        Line::raw(""),
    ];
    for (label, action) in [
        ("Create user", KeyAction::NewUser),
        ("Edit selected", KeyAction::EditSelection),
        ("Delete selected", KeyAction::DeleteSelection),
        ("Reload list", KeyAction::Refresh),
        ("Dismiss error", KeyAction::DismissError),
        ("Move", KeyAction::MoveDown),
        ("Sign out", KeyAction::Logout),
        ("Quit", KeyAction::Quit),
    ] {
        lines.push(Line::from(vec![
            Span::raw(format!("{label:<18}")),
            Span::styled(app.keymap.keys_for(action).join(", "), Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled("Forms", Style::default().add_modifier(Modifier::BOLD))));
    lines.push(Line::raw("Tab/Up/Down: move   Space: toggle role   Enter: submit   Esc: close"));
    lines.push(Line::raw("Closing a form does not cancel a request already sent."));

    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(bordered("Help", app));
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
