pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::AppState;
use crate::auth;
use crate::controller::PageView;

/// Draw one frame: navbar, the page body for the current view, the status
/// bar, and the help overlay on top.
pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)].as_ref())
        .split(f.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
        .split(root[1]);

    let body_height = body[0].height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }
    let app = &*app;

    render_navbar(f, root[0], app);

    match app.controller.view() {
        PageView::Unauthorized { signed_in } => {
            components::render_notice(f, root[1], app, if signed_in {
                "The Users page requires the admin role."
            } else {
                "Signed out. Restart with --user and --roles to sign in."
            });
        }
        PageView::Loading => components::render_spinner(f, root[1], app),
        PageView::Failed(err) => components::render_errors(f, root[1], app, err),
        PageView::List(view) => {
            users::render_users_table(f, body[0], app, &view);
            users::render_user_card(f, body[1], app, &view);
            users::render_row_modals(f, f.area(), app, &view);
            if let Some(form) = view.create_form {
                components::render_form_modal(f, f.area(), app, form, view.creating);
            }
        }
    }

    components::render_status_bar(f, root[2], app);

    if app.show_help {
        components::render_help_modal(f, f.area(), app);
    }
}

/// Brand, the role-gated "Users" entry, and the sign-in state.
fn render_navbar(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans = vec![Span::styled("usradmin", Style::default().add_modifier(Modifier::BOLD)), Span::raw("  ")];
    if auth::can_view_users(app.auth.as_ref()) {
        spans.push(Span::styled("[Users]", Style::default().fg(app.theme.title)));
        spans.push(Span::raw("  "));
    }
    match app.auth.current_user() {
        Some(user) => spans.push(Span::raw(format!("{}  (Ctrl+l: Sign Out)", user.name))),
        None => spans.push(Span::raw("Sign In")),
    }
    spans.push(Span::styled(format!("  {}", app.endpoint), Style::default().fg(app.theme.muted)));

    let p = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, area);
}
