// Unit tests for usradmin key handling: key presses in, requests out.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use usradmin::app::update::handle_key;
use usradmin::app::{ActiveModal, AppState};
use usradmin::auth::{AuthContext, CurrentUser, Session};
use usradmin::controller::{Request, Response, SyncPolicy, UserListController};
use usradmin::user::{Roles, UserFields, WireRole, WireUser};

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn type_text(app: &mut AppState, text: &str) {
    for c in text.chars() {
        handle_key(app, key(KeyCode::Char(c)));
    }
}

fn wire(id: &str, name: &str, email: &str) -> WireUser {
    WireUser {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        image_uri: None,
        roles: vec![WireRole { name: "editor".into() }],
    }
}

/// App with a list already loaded from a synthetic response.
fn loaded_app(users: Vec<WireUser>) -> AppState {
    let auth = Arc::new(Session::signed_in(CurrentUser {
        name: "op".into(),
        roles: Roles { admin: true, editor: false },
    }));
    let mut controller = UserListController::new(auth.clone(), 10, SyncPolicy::DEFAULT);
    let Request::List { generation, .. } = controller.list() else {
        panic!("expected list request");
    };
    controller.resolve(Response::Listed {
        generation,
        result: Ok(users),
    });
    AppState::new(controller, auth, "test")
}

#[test]
fn create_flow_produces_create_request() {
    let mut app = loaded_app(vec![]);
    assert_eq!(handle_key(&mut app, key(KeyCode::Char('n'))), None);
    assert_eq!(app.active_modal(), ActiveModal::Create);

    type_text(&mut app, "Bo");
    handle_key(&mut app, key(KeyCode::Tab));
    type_text(&mut app, "b@x.com");
    for _ in 0..3 {
        handle_key(&mut app, key(KeyCode::Tab));
    }
    // Space on the editor checkbox toggles it.
    type_text(&mut app, " ");

    let req = handle_key(&mut app, key(KeyCode::Enter));
    assert_eq!(
        req,
        Some(Request::Create {
            fields: UserFields {
                name: "Bo".into(),
                email: "b@x.com".into(),
                image_uri: None,
                roles: Roles { admin: false, editor: true },
            }
        })
    );
    assert!(app.controller.create_state().pending);
    // The modal stays up until the response resolves.
    assert_eq!(app.active_modal(), ActiveModal::Create);
}

#[test]
fn invalid_create_form_stays_open_without_request() {
    let mut app = loaded_app(vec![]);
    handle_key(&mut app, key(KeyCode::Char('n')));
    type_text(&mut app, "Bo");
    assert_eq!(handle_key(&mut app, key(KeyCode::Enter)), None);
    assert!(app.controller.create_form().and_then(|f| f.error.as_ref()).is_some());
    assert!(!app.controller.create_state().pending);

    handle_key(&mut app, key(KeyCode::Esc));
    assert_eq!(app.active_modal(), ActiveModal::None);
}

#[test]
fn delete_flow_confirms_selected_row() {
    let mut app = loaded_app(vec![wire("1", "Ann", "a@x.com"), wire("2", "Bo", "b@x.com")]);
    handle_key(&mut app, key(KeyCode::Down));
    assert_eq!(app.selected_id().as_deref(), Some("2"));

    handle_key(&mut app, key(KeyCode::Char('d')));
    assert_eq!(app.active_modal(), ActiveModal::DeleteConfirm("2".into()));
    let req = handle_key(&mut app, key(KeyCode::Char('y')));
    assert_eq!(req, Some(Request::Delete { id: "2".into() }));
    assert!(app.controller.delete_state().pending);
}

#[test]
fn delete_can_be_declined() {
    let mut app = loaded_app(vec![wire("1", "Ann", "a@x.com")]);
    handle_key(&mut app, key(KeyCode::Char('d')));
    assert_eq!(handle_key(&mut app, key(KeyCode::Char('n'))), None);
    assert_eq!(app.active_modal(), ActiveModal::None);
    assert!(!app.controller.delete_state().pending);
}

#[test]
fn edit_flow_sends_changed_fields() {
    let mut app = loaded_app(vec![wire("1", "Ann", "a@x.com")]);
    handle_key(&mut app, key(KeyCode::Char('e')));
    assert_eq!(app.active_modal(), ActiveModal::Edit("1".into()));

    // Name is prefilled; append to it.
    type_text(&mut app, "ie");
    let req = handle_key(&mut app, key(KeyCode::Enter));
    match req {
        Some(Request::Edit { id, fields }) => {
            assert_eq!(id, "1");
            assert_eq!(fields.name, "Annie");
            assert_eq!(fields.email, "a@x.com");
            assert!(fields.roles.editor);
        }
        other => panic!("expected edit request, got {other:?}"),
    }
    assert!(app.controller.edit_state().pending);
}

#[test]
fn delete_confirmation_sits_above_edit_panel() {
    let mut app = loaded_app(vec![wire("1", "Ann", "a@x.com")]);
    assert!(app.controller.open_edit("1"));
    assert!(app.controller.open_delete("1"));
    assert_eq!(app.active_modal(), ActiveModal::DeleteConfirm("1".into()));
}

#[test]
fn help_toggles_and_swallows_keys() {
    let mut app = loaded_app(vec![]);
    handle_key(&mut app, key(KeyCode::Char('?')));
    assert_eq!(app.active_modal(), ActiveModal::Help);
    handle_key(&mut app, key(KeyCode::Char('n')));
    assert!(app.controller.create_form().is_none());
    handle_key(&mut app, key(KeyCode::Esc));
    assert_eq!(app.active_modal(), ActiveModal::None);
}

#[test]
fn refresh_and_quit() {
    let mut app = loaded_app(vec![]);
    assert!(matches!(
        handle_key(&mut app, key(KeyCode::Char('r'))),
        Some(Request::List { generation: 2, .. })
    ));
    handle_key(&mut app, key(KeyCode::Char('q')));
    assert!(app.should_quit);

    let mut app = loaded_app(vec![]);
    handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
}

#[test]
fn logout_hides_the_page() {
    let mut app = loaded_app(vec![wire("1", "Ann", "a@x.com")]);
    handle_key(&mut app, KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL));
    assert!(app.auth.current_user().is_none());
    // No modal can open without the page.
    handle_key(&mut app, key(KeyCode::Char('n')));
    assert_eq!(app.active_modal(), ActiveModal::None);
}

#[test]
fn selection_stays_within_rows() {
    let mut app = loaded_app(vec![wire("1", "Ann", "a@x.com"), wire("2", "Bo", "b@x.com")]);
    for _ in 0..5 {
        handle_key(&mut app, key(KeyCode::Down));
    }
    assert_eq!(app.selected_user_index, 1);
    handle_key(&mut app, key(KeyCode::PageUp));
    assert_eq!(app.selected_user_index, 0);

    app.selected_user_index = 7;
    app.clamp_selection();
    assert_eq!(app.selected_user_index, 1);
}
