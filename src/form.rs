//! Modal form used both to create a user and to edit an existing one.

use thiserror::Error;

use crate::user::{Roles, UserFields, UserRecord};

/// Focusable elements of the form, in tab order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
    ImageUri,
    Admin,
    Editor,
    Submit,
}

impl FormField {
    const ORDER: [FormField; 6] = [
        FormField::Name,
        FormField::Email,
        FormField::ImageUri,
        FormField::Admin,
        FormField::Editor,
        FormField::Submit,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn is_text(self) -> bool {
        matches!(self, FormField::Name | FormField::Email | FormField::ImageUri)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("name is required")]
    MissingName,
    #[error("email must look like name@domain")]
    InvalidEmail,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditUserForm {
    init_user: Option<UserRecord>,
    pub name: String,
    pub email: String,
    pub image_uri: String,
    pub roles: Roles,
    pub focus: FormField,
    pub error: Option<FormError>,
}

impl EditUserForm {
    /// Empty form for creating a user.
    pub fn create() -> Self {
        Self {
            init_user: None,
            name: String::new(),
            email: String::new(),
            image_uri: String::new(),
            roles: Roles::default(),
            focus: FormField::Name,
            error: None,
        }
    }

    /// Form pre-populated from an existing record.
    pub fn edit(user: &UserRecord) -> Self {
        Self {
            init_user: Some(user.clone()),
            name: user.name.clone(),
            email: user.email.clone(),
            image_uri: user.image_uri.clone().unwrap_or_default(),
            roles: user.roles,
            focus: FormField::Name,
            error: None,
        }
    }

    pub fn init_user(&self) -> Option<&UserRecord> {
        self.init_user.as_ref()
    }

    pub fn is_create(&self) -> bool {
        self.init_user.is_none()
    }

    pub fn focus_next(&mut self) {
        let i = (self.focus.index() + 1) % FormField::ORDER.len();
        self.focus = FormField::ORDER[i];
    }

    pub fn focus_prev(&mut self) {
        let len = FormField::ORDER.len();
        let i = (self.focus.index() + len - 1) % len;
        self.focus = FormField::ORDER[i];
    }

    /// Type a character into the focused element. Space toggles role flags.
    pub fn input_char(&mut self, c: char) {
        match self.focus {
            FormField::Name => self.name.push(c),
            FormField::Email => self.email.push(c),
            FormField::ImageUri => self.image_uri.push(c),
            FormField::Admin if c == ' ' => self.roles.admin = !self.roles.admin,
            FormField::Editor if c == ' ' => self.roles.editor = !self.roles.editor,
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            FormField::Name => {
                self.name.pop();
            }
            FormField::Email => {
                self.email.pop();
            }
            FormField::ImageUri => {
                self.image_uri.pop();
            }
            _ => {}
        }
    }

    pub fn validate(&self) -> Result<UserFields, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingName);
        }
        let email = self.email.trim();
        let valid_email = match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
            None => false,
        };
        if !valid_email {
            return Err(FormError::InvalidEmail);
        }
        let image = self.image_uri.trim();
        Ok(UserFields {
            name: name.to_string(),
            email: email.to_string(),
            image_uri: (!image.is_empty()).then(|| image.to_string()),
            roles: self.roles,
        })
    }

    /// Validate and return the field set, keeping the failure on the form.
    pub fn submit(&mut self) -> Option<UserFields> {
        match self.validate() {
            Ok(fields) => {
                self.error = None;
                Some(fields)
            }
            Err(err) => {
                self.error = Some(err);
                None
            }
        }
    }
}
