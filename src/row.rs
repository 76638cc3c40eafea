//! One rendered user with its row-local modal toggles.
//!
//! A row never talks to the remote API. Confirming a modal yields a
//! [`RowAction`] carrying only this row's data; the controller turns it
//! into a request and closes the modal once the request resolves.

use crate::form::EditUserForm;
use crate::user::{UserFields, UserRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowAction {
    Edit { id: String, fields: UserFields },
    Delete { id: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRow {
    pub user: UserRecord,
    edit_panel: Option<EditUserForm>,
    delete_confirm_open: bool,
}

impl UserRow {
    pub fn new(user: UserRecord) -> Self {
        Self {
            user,
            edit_panel: None,
            delete_confirm_open: false,
        }
    }

    /// Replace the record, keeping local toggles.
    pub(crate) fn rebind(&mut self, user: UserRecord) {
        self.user = user;
    }

    pub fn id(&self) -> &str {
        &self.user.id
    }

    /// "Admin, Editor", or "None" when no role flag is set.
    pub fn roles_label(&self) -> String {
        let labels = self.user.roles.labels();
        if labels.is_empty() {
            "None".to_string()
        } else {
            labels.join(", ")
        }
    }

    pub fn edit_panel_open(&self) -> bool {
        self.edit_panel.is_some()
    }

    pub fn delete_confirm_open(&self) -> bool {
        self.delete_confirm_open
    }

    pub fn edit_form(&self) -> Option<&EditUserForm> {
        self.edit_panel.as_ref()
    }

    pub fn edit_form_mut(&mut self) -> Option<&mut EditUserForm> {
        self.edit_panel.as_mut()
    }

    /// Opening the edit panel leaves the delete confirmation alone.
    pub fn open_edit(&mut self) {
        if self.edit_panel.is_none() {
            self.edit_panel = Some(EditUserForm::edit(&self.user));
        }
    }

    pub fn close_edit(&mut self) {
        self.edit_panel = None;
    }

    pub fn open_delete(&mut self) {
        self.delete_confirm_open = true;
    }

    pub fn close_delete(&mut self) {
        self.delete_confirm_open = false;
    }

    /// Validate the edit form. `None` when the panel is closed or invalid.
    pub fn submit_edit(&mut self) -> Option<RowAction> {
        let id = self.user.id.clone();
        let fields = self.edit_panel.as_mut()?.submit()?;
        Some(RowAction::Edit { id, fields })
    }

    pub fn confirm_delete(&self) -> Option<RowAction> {
        self.delete_confirm_open.then(|| RowAction::Delete {
            id: self.user.id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::Roles;

    fn row(admin: bool, editor: bool) -> UserRow {
        UserRow::new(UserRecord {
            id: "1".into(),
            name: "Ann".into(),
            email: "a@x.com".into(),
            image_uri: None,
            roles: Roles { admin, editor },
        })
    }

    #[test]
    fn role_labels() {
        assert_eq!(row(true, false).roles_label(), "Admin");
        assert_eq!(row(true, true).roles_label(), "Admin, Editor");
        assert_eq!(row(false, false).roles_label(), "None");
    }

    #[test]
    fn toggles_are_independent() {
        let mut r = row(false, false);
        r.open_edit();
        r.open_delete();
        assert!(r.edit_panel_open() && r.delete_confirm_open());
        r.close_delete();
        assert!(r.edit_panel_open());
    }

    #[test]
    fn actions_carry_only_row_data() {
        let mut r = row(true, false);
        assert_eq!(r.confirm_delete(), None);
        r.open_delete();
        assert_eq!(r.confirm_delete(), Some(RowAction::Delete { id: "1".into() }));
        assert_eq!(r.submit_edit(), None);
        r.open_edit();
        match r.submit_edit() {
            Some(RowAction::Edit { id, fields }) => {
                assert_eq!(id, "1");
                assert_eq!(fields.name, "Ann");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
