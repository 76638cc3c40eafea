//! User records in wire and internal form, and the transform between them.
//!
//! The remote API speaks [`WireUser`] (roles as a list of named objects,
//! optional image URI). The page renders [`UserRecord`] (roles as fixed
//! boolean flags, image absent means placeholder art). The transform is
//! pure and idempotent: see [`IntoUserRecord`].

use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_EDITOR: &str = "editor";

/// A role entry as transmitted by the remote API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRole {
    pub name: String,
}

/// A user as transmitted by the remote API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image_uri: Option<String>,
    #[serde(default)]
    pub roles: Vec<WireRole>,
}

/// Write payload for `createUser` / `editUser`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUserInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    pub roles: Vec<String>,
}

/// Fixed set of role flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Roles {
    pub admin: bool,
    pub editor: bool,
}

impl Roles {
    /// Display labels, in a stable order.
    pub fn labels(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.admin {
            out.push("Admin");
        }
        if self.editor {
            out.push("Editor");
        }
        out
    }

    /// Wire names of the set flags.
    pub fn wire_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.admin {
            out.push(ROLE_ADMIN.to_string());
        }
        if self.editor {
            out.push(ROLE_EDITOR.to_string());
        }
        out
    }

    fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut roles = Roles::default();
        for name in names {
            match name.trim().to_ascii_lowercase().as_str() {
                ROLE_ADMIN => roles.admin = true,
                ROLE_EDITOR => roles.editor = true,
                _ => {}
            }
        }
        roles
    }
}

/// Editable fields of a user (everything except the server-assigned id).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserFields {
    pub name: String,
    pub email: String,
    pub image_uri: Option<String>,
    pub roles: Roles,
}

impl UserFields {
    /// Build the wire payload; `id` is present for edits only.
    ///
    /// Servers leave the image untouched when `imageUri` is absent, so an
    /// edit always sends it, as `""` when the image is cleared.
    pub fn to_wire_input(&self, id: Option<&str>) -> WireUserInput {
        let image_uri = normalize_image(self.image_uri.as_deref());
        WireUserInput {
            id: id.map(str::to_string),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            image_uri: match id {
                Some(_) => Some(image_uri.unwrap_or_default()),
                None => image_uri,
            },
            roles: self.roles.wire_names(),
        }
    }
}

/// A user as rendered by the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    /// `None` means "use placeholder avatar".
    pub image_uri: Option<String>,
    pub roles: Roles,
}

impl UserRecord {
    pub fn from_wire(wire: &WireUser) -> Self {
        Self {
            id: wire.id.trim().to_string(),
            name: wire.name.trim().to_string(),
            email: wire.email.trim().to_string(),
            image_uri: normalize_image(wire.image_uri.as_deref()),
            roles: Roles::from_names(wire.roles.iter().map(|r| r.name.as_str())),
        }
    }

    pub fn to_wire(&self) -> WireUser {
        WireUser {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            image_uri: self.image_uri.clone(),
            roles: self
                .roles
                .wire_names()
                .into_iter()
                .map(|name| WireRole { name })
                .collect(),
        }
    }

    pub fn fields(&self) -> UserFields {
        UserFields {
            name: self.name.clone(),
            email: self.email.clone(),
            image_uri: self.image_uri.clone(),
            roles: self.roles,
        }
    }

    pub fn has_placeholder_image(&self) -> bool {
        self.image_uri.is_none()
    }
}

/// Conversion into the internal form. Applying it to an already-internal
/// record yields the same record.
pub trait IntoUserRecord {
    fn into_user_record(&self) -> UserRecord;
}

impl IntoUserRecord for WireUser {
    fn into_user_record(&self) -> UserRecord {
        UserRecord::from_wire(self)
    }
}

impl IntoUserRecord for UserRecord {
    fn into_user_record(&self) -> UserRecord {
        UserRecord {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            image_uri: normalize_image(self.image_uri.as_deref()),
            roles: self.roles,
        }
    }
}

fn normalize_image(uri: Option<&str>) -> Option<String> {
    uri.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
