use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind};
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info};

use crate::api::UserApi;
use crate::app::keymap::KeyAction;
use crate::app::{ActiveModal, AppState};
use crate::controller::{Request, Response, execute};
use crate::ui;

/// Drive the terminal until the operator quits.
///
/// Remote calls run on spawned tasks and report back over a channel; every
/// state transition happens here, one event at a time.
pub async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut app: AppState,
    api: Arc<dyn UserApi>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Response>();
    let mut events = EventStream::new();
    // Redraw periodically so the loading spinner animates.
    let mut tick = tokio::time::interval(Duration::from_millis(120));

    let first = app.controller.list();
    dispatch(&api, &tx, first);

    loop {
        terminal.draw(|f| ui::render(f, &mut app))?;

        tokio::select! {
            Some(response) = rx.recv() => {
                if let Some(next) = app.controller.resolve(response) {
                    dispatch(&api, &tx, next);
                }
                app.clamp_selection();
            }
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if let Some(request) = handle_key(&mut app, key) {
                        dispatch(&api, &tx, request);
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
                None => break,
            },
            _ = tick.tick() => {}
        }

        if app.should_quit {
            break;
        }
    }

    info!(uptime = ?app.started_at.elapsed(), "leaving");
    Ok(())
}

/// Run `request` on its own task; the response comes back through `tx`.
/// There is no cancellation: the call runs to completion.
fn dispatch(api: &Arc<dyn UserApi>, tx: &UnboundedSender<Response>, request: Request) {
    debug!(?request, "dispatch");
    let api = Arc::clone(api);
    let tx = tx.clone();
    tokio::spawn(async move {
        let response = execute(api.as_ref(), request).await;
        deliver(&tx, response);
    });
}

/// Hand a response to the event loop. Returns `false` when the loop has
/// already exited and the response is dropped.
fn deliver(tx: &UnboundedSender<Response>, response: Response) -> bool {
    match tx.send(response) {
        Ok(()) => true,
        Err(err) => {
            debug!(response = ?err.0, "event loop gone, response dropped");
            false
        }
    }
}

/// Apply one key press. Returns the remote call it triggered, if any.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Option<Request> {
    match app.active_modal() {
        ActiveModal::Help => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?')) {
                app.show_help = false;
            }
            None
        }
        ActiveModal::Create => handle_create_key(app, key.code),
        ActiveModal::Edit(id) => handle_edit_key(app, &id, key.code),
        ActiveModal::DeleteConfirm(id) => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => app.controller.confirm_row_delete(&id),
            KeyCode::Char('n') | KeyCode::Esc => {
                if let Some(row) = app.controller.row_mut(&id) {
                    row.close_delete();
                }
                None
            }
            _ => None,
        },
        ActiveModal::None => handle_list_key(app, key),
    }
}

/// Keys while the create form is topmost: Esc closes, Enter submits.
fn handle_create_key(app: &mut AppState, code: KeyCode) -> Option<Request> {
    if code == KeyCode::Esc {
        app.controller.close_create_form();
        return None;
    }
    if code == KeyCode::Enter {
        return app.controller.submit_create_form();
    }
    let form = app.controller.create_form_mut()?;
    match code {
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) => form.input_char(c),
        _ => {}
    }
    None
}

/// Keys while row `id`'s edit panel is topmost.
fn handle_edit_key(app: &mut AppState, id: &str, code: KeyCode) -> Option<Request> {
    if code == KeyCode::Enter {
        return app.controller.submit_row_edit(id);
    }
    let row = app.controller.row_mut(id)?;
    if code == KeyCode::Esc {
        row.close_edit();
        return None;
    }
    let form = row.edit_form_mut()?;
    match code {
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) => form.input_char(c),
        _ => {}
    }
    None
}

/// Keys on the bare list, resolved through the keymap.
fn handle_list_key(app: &mut AppState, key: KeyEvent) -> Option<Request> {
    let action = app.keymap.resolve(&key)?;
    let len = app.controller.rows().len();
    let rpp = app.rows_per_page.max(1);
    match action {
        KeyAction::Quit => app.should_quit = true,
        KeyAction::OpenHelp => app.show_help = true,
        KeyAction::NewUser => {
            if !app.controller.open_create_form() {
                debug!("create trigger disabled");
            }
        }
        KeyAction::EditSelection => {
            if let Some(id) = app.selected_id() {
                app.controller.open_edit(&id);
            }
        }
        KeyAction::DeleteSelection => {
            if let Some(id) = app.selected_id() {
                app.controller.open_delete(&id);
            }
        }
        KeyAction::Refresh => return Some(app.controller.list()),
        KeyAction::DismissError => app.controller.dismiss_error(),
        KeyAction::Logout => app.auth.logout(),
        KeyAction::MoveUp => app.selected_user_index = app.selected_user_index.saturating_sub(1),
        KeyAction::MoveDown => {
            if app.selected_user_index + 1 < len {
                app.selected_user_index += 1;
            }
        }
        KeyAction::PageUp => app.selected_user_index = app.selected_user_index.saturating_sub(rpp),
        KeyAction::PageDown => {
            app.selected_user_index = app.selected_user_index.saturating_add(rpp).min(len.saturating_sub(1));
        }
        KeyAction::Ignore => {}
    }
    None
}
