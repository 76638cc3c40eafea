//! Acting-user context.
//!
//! The session is consumed read-only: the page asks who is signed in and
//! which role flags they carry, and may ask to log out. Nothing here is
//! mutated by the user list itself.

use std::sync::RwLock;

use tracing::info;

use crate::user::Roles;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub name: String,
    pub roles: Roles,
}

pub trait AuthContext: Send + Sync {
    fn current_user(&self) -> Option<CurrentUser>;
    fn logout(&self);
}

/// Whether the "Users" navigation entry and page are available.
pub fn can_view_users(auth: &dyn AuthContext) -> bool {
    auth.current_user().is_some_and(|u| u.roles.admin)
}

/// Whether create, edit and delete affordances are available.
pub fn can_write_users(auth: &dyn AuthContext) -> bool {
    auth.current_user()
        .is_some_and(|u| u.roles.admin || u.roles.editor)
}

/// Session established out of band (CLI flags or a login flow elsewhere).
#[derive(Debug, Default)]
pub struct Session {
    user: RwLock<Option<CurrentUser>>,
}

impl Session {
    pub fn signed_in(user: CurrentUser) -> Self {
        Self {
            user: RwLock::new(Some(user)),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Parse a comma separated role list such as `admin,editor`.
    pub fn parse_roles(spec: &str) -> Roles {
        let mut roles = Roles::default();
        for part in spec.split(',') {
            match part.trim().to_ascii_lowercase().as_str() {
                "admin" => roles.admin = true,
                "editor" => roles.editor = true,
                _ => {}
            }
        }
        roles
    }
}

impl AuthContext for Session {
    fn current_user(&self) -> Option<CurrentUser> {
        self.user
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn logout(&self) {
        let mut guard = self
            .user
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(user) = guard.take() {
            info!(user = %user.name, "signed out");
        }
    }
}
