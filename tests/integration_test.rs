// Integration tests for usradmin: the synchronization core against the
// in-memory user API.

use std::sync::Arc;

use usradmin::api::{ApiOp, InMemoryUserApi, UserApi};
use usradmin::auth::{AuthContext, CurrentUser, Session};
use usradmin::controller::{
    DEFAULT_PAGE_LIMIT, ErrorPolicy, ListQueryState, PageView, RefreshStrategy, Request, SyncPolicy,
    UserListController, execute,
};
use usradmin::error::{ErrorClass, ErrorInfo};
use usradmin::user::{Roles, UserFields, WireRole, WireUser};

fn session(admin: bool, editor: bool) -> Arc<Session> {
    Arc::new(Session::signed_in(CurrentUser {
        name: "operator".into(),
        roles: Roles { admin, editor },
    }))
}

fn ann() -> WireUser {
    WireUser {
        id: "1".into(),
        name: "Ann".into(),
        email: "a@x.com".into(),
        image_uri: None,
        roles: vec![WireRole { name: "admin".into() }],
    }
}

fn fields(name: &str, email: &str) -> UserFields {
    UserFields {
        name: name.into(),
        email: email.into(),
        image_uri: None,
        roles: Roles::default(),
    }
}

async fn loaded(api: &InMemoryUserApi, policy: SyncPolicy) -> UserListController {
    let mut c = UserListController::new(session(true, false), DEFAULT_PAGE_LIMIT, policy);
    let req = c.list();
    c.run(api, req).await;
    c
}

fn loaded_users(c: &UserListController) -> Vec<String> {
    match c.list_state() {
        ListQueryState::Loaded(users) => users.iter().map(|u| u.name.clone()).collect(),
        other => panic!("list not loaded: {other:?}"),
    }
}

// 1) Read one user, delete it, list becomes empty
#[tokio::test]
async fn delete_then_list_shows_no_rows() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    let mut c = loaded(&api, SyncPolicy::DEFAULT).await;

    assert_eq!(c.rows().len(), 1);
    let row = &c.rows()[0];
    assert_eq!(row.user.name, "Ann");
    assert_eq!(row.user.email, "a@x.com");
    assert_eq!(row.roles_label(), "Admin");

    assert!(c.open_delete("1"));
    let req = c.confirm_row_delete("1").expect("delete dispatched");
    assert!(c.delete_state().pending);
    c.run(&api, req).await;

    assert!(!c.delete_state().pending);
    assert!(c.rows().is_empty());
    assert_eq!(c.list_state(), &ListQueryState::Loaded(vec![]));
    assert!(c.last_error().is_none());
}

// 2) Failed create closes the form, keeps the list, records the error
#[tokio::test]
async fn failed_create_closes_form_and_records_error() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    let mut c = loaded(&api, SyncPolicy::DEFAULT).await;
    let before = c.list_state().clone();

    assert!(c.open_create_form());
    api.fail_next(ApiOp::Create, ErrorInfo::network("connection reset"));
    let req = c.create(fields("Bo", "b@x.com")).expect("create dispatched");
    assert!(c.create_state().pending);
    c.run(&api, req).await;

    assert!(c.create_form().is_none());
    assert!(!c.create_state().pending);
    assert_eq!(c.list_state(), &before);
    assert_eq!(c.last_error().map(|e| e.class), Some(ErrorClass::Network));
    assert_eq!(c.create_state().error.as_ref().map(|e| e.class), Some(ErrorClass::Network));
}

#[tokio::test]
async fn successful_create_appears_with_server_id() {
    let api = InMemoryUserApi::new();
    let mut c = loaded(&api, SyncPolicy::DEFAULT).await;

    assert!(c.open_create_form());
    let req = c.create(fields("Bo", "b@x.com")).unwrap();
    c.run(&api, req).await;

    assert!(c.create_form().is_none());
    let rows = c.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user.name, "Bo");
    assert_eq!(rows[0].user.email, "b@x.com");
    assert!(!rows[0].user.id.is_empty());
    let id = rows[0].user.id.clone();

    // A later read keeps the same id.
    let req = c.list();
    c.run(&api, req).await;
    assert_eq!(c.rows()[0].user.id, id);
}

#[tokio::test]
async fn only_one_create_in_flight() {
    let api = InMemoryUserApi::new();
    let mut c = loaded(&api, SyncPolicy::DEFAULT).await;

    let first = c.create(fields("A", "a@x.com")).unwrap();
    assert!(!c.create_trigger_enabled());
    assert!(!c.open_create_form());
    assert!(c.create(fields("B", "b@x.com")).is_none());

    c.run(&api, first).await;
    assert!(c.create_trigger_enabled());
    assert_eq!(loaded_users(&c), vec!["A".to_string()]);
}

#[tokio::test]
async fn edit_patches_only_the_edited_record() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    let bo_id = api.seed("Bo", "b@x.com", &["editor"]);
    let mut c = loaded(&api, SyncPolicy::DEFAULT).await;
    let bo_before = c.row(&bo_id).unwrap().user.clone();

    assert!(c.open_edit("1"));
    let mut changed = fields("Annie", "annie@x.com");
    changed.roles.editor = true;
    let req = c.edit("1", changed).unwrap();
    assert!(c.edit_state().pending);
    // Patch strategy: no list read follows, so a failing read would show.
    api.fail_next(ApiOp::List, ErrorInfo::network("should not be called"));
    c.run(&api, req).await;

    assert!(!c.edit_state().pending);
    let ann = &c.row("1").unwrap().user;
    assert_eq!(ann.name, "Annie");
    assert_eq!(ann.email, "annie@x.com");
    assert_eq!(ann.roles, Roles { admin: false, editor: true });
    assert!(!c.row("1").unwrap().edit_panel_open());
    assert_eq!(c.row(&bo_id).unwrap().user, bo_before);
    assert!(matches!(c.list_state(), ListQueryState::Loaded(_)));
}

#[tokio::test]
async fn failed_edit_is_absorbed_by_default() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    let mut c = loaded(&api, SyncPolicy::DEFAULT).await;

    assert!(c.open_edit("1"));
    api.fail_next(ApiOp::Edit, ErrorInfo::new(ErrorClass::Input, "bad email"));
    let req = c.submit_row_edit("1").unwrap();
    c.run(&api, req).await;

    assert!(!c.edit_state().pending);
    assert!(c.edit_state().error.is_some());
    assert!(c.last_error().is_none());
    assert!(!c.row("1").unwrap().edit_panel_open());
    assert_eq!(c.row("1").unwrap().user.name, "Ann");
}

#[tokio::test]
async fn failed_edit_recorded_when_policy_says_so() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    let mut policy = SyncPolicy::DEFAULT;
    policy.edit.errors = ErrorPolicy::Record;
    let mut c = loaded(&api, policy).await;

    api.fail_next(ApiOp::Edit, ErrorInfo::new(ErrorClass::Internal, "db down"));
    let req = c.edit("1", fields("X", "x@x.com")).unwrap();
    c.run(&api, req).await;

    assert_eq!(c.last_error().map(|e| e.message.as_str()), Some("db down"));
}

#[tokio::test]
async fn edit_can_refetch_instead_of_patching() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    let mut policy = SyncPolicy::DEFAULT;
    policy.edit.refresh = RefreshStrategy::Refetch;
    let mut c = loaded(&api, policy).await;

    let req = c.edit("1", fields("Annie", "a@x.com")).unwrap();
    let response = execute(&api, req).await;
    let follow_up = c.resolve(response).expect("refetch requested");
    assert!(matches!(follow_up, Request::List { .. }));
    assert_eq!(c.list_state(), &ListQueryState::Loading);
    c.run(&api, follow_up).await;
    assert_eq!(loaded_users(&c), vec!["Annie".to_string()]);
}

#[tokio::test]
async fn delete_can_patch_without_refetch() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    api.seed("Bo", "b@x.com", &[]);
    let mut policy = SyncPolicy::DEFAULT;
    policy.delete.refresh = RefreshStrategy::PatchById;
    let mut c = loaded(&api, policy).await;

    let req = c.delete_user("1").unwrap();
    let response = execute(&api, req).await;
    assert!(c.resolve(response).is_none());
    assert_eq!(loaded_users(&c), vec!["Bo".to_string()]);
}

#[tokio::test]
async fn failed_delete_closes_confirmation_and_keeps_row() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    let mut c = loaded(&api, SyncPolicy::DEFAULT).await;

    assert!(c.open_delete("1"));
    api.fail_next(ApiOp::Delete, ErrorInfo::new(ErrorClass::Authorization, "nope"));
    let req = c.confirm_row_delete("1").unwrap();
    c.run(&api, req).await;

    assert!(!c.row("1").unwrap().delete_confirm_open());
    assert_eq!(c.last_error().map(|e| e.class), Some(ErrorClass::Authorization));
    assert_eq!(c.rows().len(), 1);
}

#[tokio::test]
async fn read_error_replaces_the_page() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    let mut c = loaded(&api, SyncPolicy::DEFAULT).await;

    assert!(c.open_create_form());
    assert!(c.open_edit("1"));
    let edit = c.edit("1", fields("Annie", "a@x.com")).unwrap();

    api.fail_next(ApiOp::List, ErrorInfo::network("offline"));
    let list = c.list();
    c.run(&api, list).await;
    assert!(matches!(c.view(), PageView::Failed(e) if e.message == "offline"));

    // The edit resolves afterwards; the page stays on the error.
    c.run(&api, edit).await;
    assert!(!c.edit_state().pending);
    assert!(matches!(c.view(), PageView::Failed(_)));
    // Writes cannot start from an error page.
    assert!(c.create(fields("Z", "z@x.com")).is_none());
}

#[tokio::test]
async fn stale_list_response_is_discarded() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    let mut c = UserListController::new(session(true, false), DEFAULT_PAGE_LIMIT, SyncPolicy::DEFAULT);

    let old = c.list();
    let old_response = execute(&api, old).await;
    api.seed("Bo", "b@x.com", &[]);
    let new = c.list();
    let new_response = execute(&api, new).await;

    c.resolve(new_response);
    c.resolve(old_response);
    assert_eq!(loaded_users(&c), vec!["Ann".to_string(), "Bo".to_string()]);
}

#[tokio::test]
async fn new_operation_clears_previous_error() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    let mut c = loaded(&api, SyncPolicy::DEFAULT).await;

    api.fail_next(ApiOp::Create, ErrorInfo::network("x"));
    let req = c.create(fields("Bo", "b@x.com")).unwrap();
    c.run(&api, req).await;
    assert!(c.last_error().is_some());

    let _pending = c.delete_user("1").unwrap();
    assert!(c.last_error().is_none());
}

#[tokio::test]
async fn list_honours_configured_limit() {
    let api = InMemoryUserApi::new();
    for i in 0..15 {
        api.seed(&format!("u{i}"), &format!("u{i}@x.com"), &[]);
    }
    let c = loaded(&api, SyncPolicy::DEFAULT).await;
    assert_eq!(c.rows().len(), DEFAULT_PAGE_LIMIT);
}

#[tokio::test]
async fn role_gating() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());

    // Editors may write but do not see the Users page.
    let mut c = UserListController::new(session(false, true), DEFAULT_PAGE_LIMIT, SyncPolicy::DEFAULT);
    let req = c.list();
    c.run(&api, req).await;
    assert!(matches!(c.view(), PageView::Unauthorized { signed_in: true }));

    // No writing role: every write is refused.
    let mut c = UserListController::new(session(false, false), DEFAULT_PAGE_LIMIT, SyncPolicy::DEFAULT);
    let req = c.list();
    c.run(&api, req).await;
    assert!(c.create(fields("Bo", "b@x.com")).is_none());
    assert!(c.delete_user("1").is_none());
    assert!(!c.open_edit("1"));

    // Signing out hides everything.
    let auth = session(true, false);
    let c = UserListController::new(auth.clone(), DEFAULT_PAGE_LIMIT, SyncPolicy::DEFAULT);
    auth.logout();
    assert!(matches!(c.view(), PageView::Unauthorized { signed_in: false }));
}

#[tokio::test]
async fn row_toggles_survive_refresh() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    let mut c = loaded(&api, SyncPolicy::DEFAULT).await;

    assert!(c.open_edit("1"));
    let req = c.list();
    c.run(&api, req).await;
    assert!(c.row("1").unwrap().edit_panel_open());
}

#[tokio::test]
async fn api_trait_object_is_usable_behind_arc() {
    let api: Arc<dyn UserApi> = Arc::new(InMemoryUserApi::new());
    let mut c = UserListController::new(session(true, false), DEFAULT_PAGE_LIMIT, SyncPolicy::DEFAULT);
    let req = c.list();
    c.run(api.as_ref(), req).await;
    assert!(c.rows().is_empty());
    assert!(matches!(c.view(), PageView::List(_)));
}

#[tokio::test]
async fn edit_resolving_during_refetch_is_not_lost() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    let mut c = loaded(&api, SyncPolicy::DEFAULT).await;

    let edit = c.edit("1", fields("Annie", "a@x.com")).unwrap();
    let create = c.create(fields("Bo", "b@x.com")).unwrap();

    // The create lands first and its refetch is served before the edit.
    let created = execute(&api, create).await;
    let refetch = c.resolve(created).expect("create refetches");
    let early_list = execute(&api, refetch).await;
    assert_eq!(c.list_state(), &ListQueryState::Loading);

    // The edit succeeds while that read is still on its way back.
    let edited = execute(&api, edit).await;
    let follow_up = c.resolve(edited).expect("edit supersedes the loading read");
    assert!(matches!(follow_up, Request::List { .. }));

    // The early read is now stale and must not restore the old name.
    assert!(c.resolve(early_list).is_none());
    assert_eq!(c.list_state(), &ListQueryState::Loading);

    c.run(&api, follow_up).await;
    assert_eq!(loaded_users(&c), vec!["Annie".to_string(), "Bo".to_string()]);
    assert!(!c.edit_state().pending);
    assert!(!c.create_state().pending);
}

#[tokio::test]
async fn writes_resolving_out_of_order_all_show() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    let bo_id = api.seed("Bo", "b@x.com", &[]);
    let mut c = loaded(&api, SyncPolicy::DEFAULT).await;

    let delete = c.delete_user(&bo_id).unwrap();
    let edit = c.edit("1", fields("Annie", "a@x.com")).unwrap();
    let create = c.create(fields("Cy", "c@x.com")).unwrap();

    // Server order: edit, create, delete. Resolution order: delete, create, edit.
    let edited = execute(&api, edit).await;
    let created = execute(&api, create).await;
    let deleted = execute(&api, delete).await;

    let after_delete = c.resolve(deleted).expect("delete refetches");
    let after_create = c.resolve(created).expect("create refetches");
    let after_edit = c.resolve(edited).expect("edit supersedes the loading read");

    // Only the newest read may land.
    let first = execute(&api, after_delete).await;
    let second = execute(&api, after_create).await;
    assert!(c.resolve(first).is_none());
    assert!(c.resolve(second).is_none());
    assert_eq!(c.list_state(), &ListQueryState::Loading);

    c.run(&api, after_edit).await;
    assert_eq!(loaded_users(&c), vec!["Annie".to_string(), "Cy".to_string()]);
    assert!(c.last_error().is_none());
}

#[tokio::test]
async fn edits_and_deletes_are_serialized_across_rows() {
    let api = InMemoryUserApi::new();
    api.seed_with_id(ann());
    let bo_id = api.seed("Bo", "b@x.com", &[]);
    let mut c = loaded(&api, SyncPolicy::DEFAULT).await;

    assert!(c.open_edit("1"));
    assert!(c.open_edit(&bo_id));
    let first = c.submit_row_edit("1").expect("first edit dispatched");
    assert!(c.submit_row_edit(&bo_id).is_none());
    assert!(c.edit(&bo_id, fields("Bob", "b@x.com")).is_none());
    assert!(c.row(&bo_id).unwrap().edit_panel_open());

    assert!(c.open_delete("1"));
    assert!(c.open_delete(&bo_id));
    let delete = c.confirm_row_delete(&bo_id).expect("first delete dispatched");
    assert!(c.confirm_row_delete("1").is_none());
    assert!(c.delete_user("1").is_none());

    c.run(&api, first).await;
    assert!(!c.edit_state().pending);
    assert!(c.delete_state().pending);
    // The edit kind is free again even though a delete is still out.
    assert!(c.edit("1", fields("Ann", "a@x.com")).is_some());

    c.run(&api, delete).await;
    assert!(!c.delete_state().pending);
    assert!(c.row(&bo_id).is_none());
}

#[tokio::test]
async fn edit_can_clear_the_image() {
    let api = InMemoryUserApi::new();
    let mut user = ann();
    user.image_uri = Some("a.png".into());
    api.seed_with_id(user);
    let mut c = loaded(&api, SyncPolicy::DEFAULT).await;
    assert_eq!(c.row("1").unwrap().user.image_uri.as_deref(), Some("a.png"));

    let req = c.edit("1", fields("Ann", "a@x.com")).unwrap();
    c.run(&api, req).await;

    assert_eq!(c.row("1").unwrap().user.image_uri, None);
    assert_eq!(api.snapshot()[0].image_uri, None);
}
