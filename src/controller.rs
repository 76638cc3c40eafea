//! User list synchronization core.
//!
//! [`UserListController`] owns the list query, one [`MutationState`] per
//! write kind, the single error slot, and the refresh policy applied after
//! each write. It never awaits the network itself: initiating an operation
//! applies the state transition and hands back a [`Request`]; the caller
//! runs it with [`execute`] and feeds the [`Response`] to
//! [`UserListController::resolve`]. Every transition therefore happens
//! inside one `&mut self` call, and the outcome of a write is read only
//! from its own response.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::UserApi;
use crate::auth::{self, AuthContext};
use crate::error::ErrorInfo;
use crate::form::EditUserForm;
use crate::row::{RowAction, UserRow};
use crate::user::{IntoUserRecord, UserFields, UserRecord, WireUser};

/// Page size requested by the list query.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListQueryState {
    Loading,
    Loaded(Vec<UserRecord>),
    Failed(ErrorInfo),
}

/// Page-wide state of one write kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutationState {
    pub pending: bool,
    pub error: Option<ErrorInfo>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteKind {
    Create,
    Edit,
    Delete,
}

/// What a failed write does to the page-level error slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Surface the failure as `last_error`.
    Record,
    /// Reset the pending flag and log; the page shows nothing.
    Ignore,
}

/// How the list catches up with a successful write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshStrategy {
    /// Re-run the list query.
    Refetch,
    /// Apply the write's own response to the loaded list by id.
    PatchById,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WritePolicy {
    pub errors: ErrorPolicy,
    pub refresh: RefreshStrategy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncPolicy {
    pub create: WritePolicy,
    pub edit: WritePolicy,
    pub delete: WritePolicy,
}

impl SyncPolicy {
    /// Create and delete surface errors and refetch; edit absorbs errors and
    /// patches the edited record from the server response.
    pub const DEFAULT: SyncPolicy = SyncPolicy {
        create: WritePolicy {
            errors: ErrorPolicy::Record,
            refresh: RefreshStrategy::Refetch,
        },
        edit: WritePolicy {
            errors: ErrorPolicy::Ignore,
            refresh: RefreshStrategy::PatchById,
        },
        delete: WritePolicy {
            errors: ErrorPolicy::Record,
            refresh: RefreshStrategy::Refetch,
        },
    };

    pub fn for_kind(&self, kind: WriteKind) -> WritePolicy {
        match kind {
            WriteKind::Create => self.create,
            WriteKind::Edit => self.edit,
            WriteKind::Delete => self.delete,
        }
    }
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A remote call to perform, produced by the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    List { limit: usize, generation: u64 },
    Create { fields: UserFields },
    Edit { id: String, fields: UserFields },
    Delete { id: String },
}

/// The resolved outcome of a [`Request`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Listed {
        generation: u64,
        result: Result<Vec<WireUser>, ErrorInfo>,
    },
    Created(Result<WireUser, ErrorInfo>),
    Edited {
        id: String,
        result: Result<WireUser, ErrorInfo>,
    },
    Deleted {
        id: String,
        result: Result<String, ErrorInfo>,
    },
}

/// Run one request against the remote API.
pub async fn execute(api: &dyn UserApi, request: Request) -> Response {
    match request {
        Request::List { limit, generation } => Response::Listed {
            generation,
            result: api.list(limit).await,
        },
        Request::Create { fields } => Response::Created(api.create(&fields.to_wire_input(None)).await),
        Request::Edit { id, fields } => {
            let result = api.edit(&id, &fields.to_wire_input(Some(&id))).await;
            Response::Edited { id, result }
        }
        Request::Delete { id } => {
            let result = api.delete(&id).await;
            Response::Deleted { id, result }
        }
    }
}

/// What the page should draw right now.
#[derive(Debug)]
pub enum PageView<'a> {
    /// No acting user, or one without the admin flag.
    Unauthorized { signed_in: bool },
    Loading,
    /// A read failure replaces the list and every modal.
    Failed(&'a ErrorInfo),
    List(ListView<'a>),
}

#[derive(Debug)]
pub struct ListView<'a> {
    pub rows: &'a [UserRow],
    pub create_form: Option<&'a EditUserForm>,
    pub can_write: bool,
    pub create_enabled: bool,
    pub creating: bool,
    pub editing: bool,
    pub deleting: bool,
    pub banner: Option<&'a ErrorInfo>,
}

pub struct UserListController {
    auth: Arc<dyn AuthContext>,
    limit: usize,
    policy: SyncPolicy,
    list_state: ListQueryState,
    list_generation: u64,
    create_state: MutationState,
    edit_state: MutationState,
    delete_state: MutationState,
    last_error: Option<ErrorInfo>,
    create_form: Option<EditUserForm>,
    rows: Vec<UserRow>,
}

impl UserListController {
    pub fn new(auth: Arc<dyn AuthContext>, limit: usize, policy: SyncPolicy) -> Self {
        Self {
            auth,
            limit,
            policy,
            list_state: ListQueryState::Loading,
            list_generation: 0,
            create_state: MutationState::default(),
            edit_state: MutationState::default(),
            delete_state: MutationState::default(),
            last_error: None,
            create_form: None,
            rows: Vec::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub fn list_state(&self) -> &ListQueryState {
        &self.list_state
    }

    pub fn create_state(&self) -> &MutationState {
        &self.create_state
    }

    pub fn edit_state(&self) -> &MutationState {
        &self.edit_state
    }

    pub fn delete_state(&self) -> &MutationState {
        &self.delete_state
    }

    pub fn mutation_state(&self, kind: WriteKind) -> &MutationState {
        match kind {
            WriteKind::Create => &self.create_state,
            WriteKind::Edit => &self.edit_state,
            WriteKind::Delete => &self.delete_state,
        }
    }

    pub fn last_error(&self) -> Option<&ErrorInfo> {
        self.last_error.as_ref()
    }

    pub fn rows(&self) -> &[UserRow] {
        &self.rows
    }

    pub fn row(&self, id: &str) -> Option<&UserRow> {
        self.rows.iter().find(|r| r.id() == id)
    }

    pub fn row_mut(&mut self, id: &str) -> Option<&mut UserRow> {
        self.rows.iter_mut().find(|r| r.id() == id)
    }

    pub fn create_form(&self) -> Option<&EditUserForm> {
        self.create_form.as_ref()
    }

    pub fn create_form_mut(&mut self) -> Option<&mut EditUserForm> {
        self.create_form.as_mut()
    }

    pub fn can_write(&self) -> bool {
        auth::can_write_users(self.auth.as_ref())
    }

    fn is_loaded(&self) -> bool {
        matches!(self.list_state, ListQueryState::Loaded(_))
    }

    /// The create trigger is clickable only while no create is in flight.
    pub fn create_trigger_enabled(&self) -> bool {
        self.can_write() && self.is_loaded() && !self.create_state.pending
    }

    pub fn view(&self) -> PageView<'_> {
        if !auth::can_view_users(self.auth.as_ref()) {
            return PageView::Unauthorized {
                signed_in: self.auth.current_user().is_some(),
            };
        }
        match &self.list_state {
            ListQueryState::Loading => PageView::Loading,
            ListQueryState::Failed(err) => PageView::Failed(err),
            ListQueryState::Loaded(_) => PageView::List(ListView {
                rows: &self.rows,
                create_form: self.create_form.as_ref(),
                can_write: self.can_write(),
                create_enabled: self.create_trigger_enabled(),
                creating: self.create_state.pending,
                editing: self.edit_state.pending,
                deleting: self.delete_state.pending,
                banner: self.last_error.as_ref(),
            }),
        }
    }

    /// Start (or restart) the list query. Responses of earlier list
    /// requests are discarded once this one is issued.
    pub fn list(&mut self) -> Request {
        self.list_generation += 1;
        self.list_state = ListQueryState::Loading;
        self.last_error = None;
        debug!(generation = self.list_generation, limit = self.limit, "list users");
        Request::List {
            limit: self.limit,
            generation: self.list_generation,
        }
    }

    /// Show the create modal. Refused while a create is pending.
    pub fn open_create_form(&mut self) -> bool {
        if !self.create_trigger_enabled() {
            return false;
        }
        if self.create_form.is_none() {
            self.create_form = Some(EditUserForm::create());
        }
        true
    }

    pub fn close_create_form(&mut self) {
        self.create_form = None;
    }

    /// Open a row's edit panel, if the acting user may write.
    pub fn open_edit(&mut self, id: &str) -> bool {
        if !self.can_write() || !self.is_loaded() {
            return false;
        }
        match self.row_mut(id) {
            Some(row) => {
                row.open_edit();
                true
            }
            None => false,
        }
    }

    /// Open a row's delete confirmation, if the acting user may write.
    pub fn open_delete(&mut self, id: &str) -> bool {
        if !self.can_write() || !self.is_loaded() {
            return false;
        }
        match self.row_mut(id) {
            Some(row) => {
                row.open_delete();
                true
            }
            None => false,
        }
    }

    /// Validate the open create form and dispatch it.
    pub fn submit_create_form(&mut self) -> Option<Request> {
        if self.create_state.pending {
            return None;
        }
        let fields = self.create_form.as_mut()?.submit()?;
        self.create(fields)
    }

    pub fn create(&mut self, fields: UserFields) -> Option<Request> {
        if !self.begin(WriteKind::Create) {
            return None;
        }
        info!(email = %fields.email, "create user");
        Some(Request::Create { fields })
    }

    pub fn edit(&mut self, id: &str, fields: UserFields) -> Option<Request> {
        if self.row(id).is_none() || !self.begin(WriteKind::Edit) {
            return None;
        }
        info!(%id, "edit user");
        Some(Request::Edit {
            id: id.to_string(),
            fields,
        })
    }

    pub fn delete_user(&mut self, id: &str) -> Option<Request> {
        if self.row(id).is_none() || !self.begin(WriteKind::Delete) {
            return None;
        }
        info!(%id, "delete user");
        Some(Request::Delete { id: id.to_string() })
    }

    /// Submit the edit panel of row `id`. Nothing happens while an edit is
    /// pending anywhere on the page.
    pub fn submit_row_edit(&mut self, id: &str) -> Option<Request> {
        if self.edit_state.pending {
            return None;
        }
        let action = self.row_mut(id)?.submit_edit()?;
        self.dispatch_row(action)
    }

    /// Confirm the delete panel of row `id`.
    pub fn confirm_row_delete(&mut self, id: &str) -> Option<Request> {
        if self.delete_state.pending {
            return None;
        }
        let action = self.row(id)?.confirm_delete()?;
        self.dispatch_row(action)
    }

    /// Route a row's confirmed modal to the matching write.
    pub fn dispatch_row(&mut self, action: RowAction) -> Option<Request> {
        match action {
            RowAction::Edit { id, fields } => self.edit(&id, fields),
            RowAction::Delete { id } => self.delete_user(&id),
        }
    }

    /// Clear the error banner without starting anything.
    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    fn begin(&mut self, kind: WriteKind) -> bool {
        if !self.can_write() {
            warn!(?kind, "write refused: acting user lacks a writing role");
            return false;
        }
        if !self.is_loaded() {
            return false;
        }
        let state = self.mutation_state_mut(kind);
        if state.pending {
            debug!(?kind, "write refused: already pending");
            return false;
        }
        state.pending = true;
        state.error = None;
        self.last_error = None;
        true
    }

    fn mutation_state_mut(&mut self, kind: WriteKind) -> &mut MutationState {
        match kind {
            WriteKind::Create => &mut self.create_state,
            WriteKind::Edit => &mut self.edit_state,
            WriteKind::Delete => &mut self.delete_state,
        }
    }

    /// Apply a resolved response. Returns the follow-up list request when
    /// the policy asks for a refetch.
    pub fn resolve(&mut self, response: Response) -> Option<Request> {
        match response {
            Response::Listed { generation, result } => {
                if generation != self.list_generation {
                    debug!(generation, latest = self.list_generation, "discarding stale list response");
                    return None;
                }
                match result {
                    Ok(users) => {
                        let records = users.iter().map(IntoUserRecord::into_user_record).collect();
                        self.set_users(records);
                    }
                    Err(err) => {
                        warn!(%err, "list users failed");
                        self.list_state = ListQueryState::Failed(err.clone());
                        self.last_error = Some(err);
                    }
                }
                None
            }
            Response::Created(result) => {
                self.create_form = None;
                let user = self.settle(WriteKind::Create, result)?;
                self.catch_up(WriteKind::Create, |users| users.push(user))
            }
            Response::Edited { id, result } => {
                if let Some(row) = self.row_mut(&id) {
                    row.close_edit();
                }
                let user = self.settle(WriteKind::Edit, result)?;
                self.catch_up(WriteKind::Edit, |users| {
                    if let Some(slot) = users.iter_mut().find(|u| u.id == user.id) {
                        *slot = user;
                    }
                })
            }
            Response::Deleted { id, result } => {
                if let Some(row) = self.row_mut(&id) {
                    row.close_delete();
                }
                let deleted = self.settle(WriteKind::Delete, result)?;
                self.catch_up(WriteKind::Delete, |users| users.retain(|u| u.id != deleted))
            }
        }
    }

    /// Reset the pending flag and apply the error policy. Yields the
    /// transformed payload on success.
    fn settle<T: Settled>(&mut self, kind: WriteKind, result: Result<T, ErrorInfo>) -> Option<T::Output> {
        let policy = self.policy.for_kind(kind);
        let state = self.mutation_state_mut(kind);
        state.pending = false;
        match result {
            Ok(payload) => {
                state.error = None;
                info!(?kind, "write succeeded");
                Some(payload.settle())
            }
            Err(err) => {
                warn!(?kind, %err, "write failed");
                state.error = Some(err.clone());
                if policy.errors == ErrorPolicy::Record {
                    self.last_error = Some(err);
                }
                None
            }
        }
    }

    fn catch_up(&mut self, kind: WriteKind, patch: impl FnOnce(&mut Vec<UserRecord>)) -> Option<Request> {
        match self.policy.for_kind(kind).refresh {
            RefreshStrategy::Refetch => Some(self.list()),
            RefreshStrategy::PatchById => {
                if let ListQueryState::Loaded(users) = &self.list_state {
                    let mut users = users.clone();
                    patch(&mut users);
                    self.set_users(users);
                    None
                } else if self.list_state == ListQueryState::Loading {
                    // The read in flight may predate this write.
                    debug!(?kind, "list loading, superseding it instead of patching");
                    Some(self.list())
                } else {
                    None
                }
            }
        }
    }

    /// Install a fresh list, carrying row toggles over by id.
    fn set_users(&mut self, users: Vec<UserRecord>) {
        let mut previous: HashMap<String, UserRow> =
            self.rows.drain(..).map(|r| (r.id().to_string(), r)).collect();
        self.rows = users
            .iter()
            .map(|user| match previous.remove(&user.id) {
                Some(mut row) => {
                    row.rebind(user.clone());
                    row
                }
                None => UserRow::new(user.clone()),
            })
            .collect();
        self.list_state = ListQueryState::Loaded(users);
    }

    /// Issue `request` and every follow-up it triggers, awaiting each.
    pub async fn run(&mut self, api: &dyn UserApi, request: Request) {
        let mut next = Some(request);
        while let Some(request) = next {
            let response = execute(api, request).await;
            next = self.resolve(response);
        }
    }
}

/// Success payloads of the three writes, reduced to what the list needs.
trait Settled {
    type Output;
    fn settle(self) -> Self::Output;
}

impl Settled for WireUser {
    type Output = UserRecord;
    fn settle(self) -> UserRecord {
        self.into_user_record()
    }
}

impl Settled for String {
    type Output = String;
    fn settle(self) -> String {
        self
    }
}
