use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};

use crate::app::AppState;
use crate::controller::ListView;

/// Paginated users table; the page follows the selection cursor.
pub fn render_users_table(f: &mut Frame, area: Rect, app: &AppState, view: &ListView<'_>) {
    let rpp = app.rows_per_page.max(1);
    let start = (app.selected_user_index / rpp) * rpp;
    let end = (start + rpp).min(view.rows.len());
    let slice = &view.rows[start.min(end)..end];

    let rows = slice.iter().enumerate().map(|(i, r)| {
        let style = if start + i == app.selected_user_index {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        Row::new(vec![
            Cell::from(r.user.name.clone()),
            Cell::from(r.user.email.clone()),
            Cell::from(r.roles_label()),
        ])
        .style(style)
    });

    let widths = [Constraint::Percentage(30), Constraint::Percentage(45), Constraint::Percentage(25)];
    let header = Row::new(vec!["NAME", "EMAIL", "ROLES"])
        .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD));

    let mut title = format!("Users ({})", view.rows.len());
    if !view.can_write {
        title.push_str(" read-only");
    } else if !view.create_enabled {
        title.push_str(" creating...");
    } else {
        title.push_str(" n: create");
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);
    f.render_widget(table, area);
}

/// Detail card of the highlighted user.
pub fn render_user_card(f: &mut Frame, area: Rect, app: &AppState, view: &ListView<'_>) {
    let text = match view.rows.get(app.selected_user_index) {
        Some(row) => {
            let image = row.user.image_uri.as_deref().unwrap_or("(placeholder avatar)");
            let mut text = format!(
                "{}\n{}\n\nImage: {}\n\nRoles\n{}",
                row.user.name,
                row.user.email,
                image,
                row.roles_label()
            );
            if view.can_write {
                let edit = if view.editing { "edit (saving...)" } else { "e: edit" };
                let delete = if view.deleting { "delete (deleting...)" } else { "d: delete" };
                text.push_str(&format!("\n\n{edit}   {delete}"));
            }
            text
        }
        None => "No users.".to_string(),
    };
    let p = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title("User")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(p, area);
}

/// Edit panels first, then delete confirmations, so a confirmation sits on top.
pub fn render_row_modals(f: &mut Frame, area: Rect, app: &AppState, view: &ListView<'_>) {
    for row in view.rows {
        if let Some(form) = row.edit_form() {
            crate::ui::components::render_form_modal(f, area, app, form, view.editing);
        }
    }
    for row in view.rows.iter().filter(|r| r.delete_confirm_open()) {
        crate::ui::components::render_delete_confirm(f, area, app, row, view.deleting);
    }
}
