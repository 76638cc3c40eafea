use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::{ApiOp, UserApi};
use crate::error::{ErrorClass, ErrorInfo};
use crate::user::{WireRole, WireUser, WireUserInput};

#[derive(Default)]
struct Store {
    users: Vec<WireUser>,
    faults: HashMap<ApiOp, ErrorInfo>,
}

/// In-process user store with server-side semantics: ids are fresh UUIDs,
/// emails are unique, deleting an unknown id fails.
#[derive(Default)]
pub struct InMemoryUserApi {
    store: Mutex<Store>,
    latency: Option<Duration>,
}

impl InMemoryUserApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` before it touches the store.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Seed a user directly, bypassing validation. Returns the assigned id.
    pub fn seed(&self, name: &str, email: &str, roles: &[&str]) -> String {
        let id = Uuid::new_v4().to_string();
        self.lock().users.push(WireUser {
            id: id.clone(),
            name: name.to_string(),
            email: email.to_string(),
            image_uri: None,
            roles: roles
                .iter()
                .map(|r| WireRole { name: (*r).to_string() })
                .collect(),
        });
        id
    }

    /// Seed a user with a caller-chosen id.
    pub fn seed_with_id(&self, user: WireUser) {
        self.lock().users.push(user);
    }

    /// Make the next call of `op` fail with `error`.
    pub fn fail_next(&self, op: ApiOp, error: ErrorInfo) {
        self.lock().faults.insert(op, error);
    }

    /// Snapshot of everything stored, ignoring any list limit.
    pub fn snapshot(&self) -> Vec<WireUser> {
        self.lock().users.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn enter(&self, op: ApiOp) -> Result<MutexGuard<'_, Store>, ErrorInfo> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut store = self.lock();
        if let Some(err) = store.faults.remove(&op) {
            debug!(?op, %err, "injected failure");
            return Err(err);
        }
        Ok(store)
    }
}

fn validate(fields: &WireUserInput) -> Result<(), ErrorInfo> {
    if fields.name.trim().is_empty() {
        return Err(ErrorInfo::new(ErrorClass::Input, "name is required"));
    }
    if !fields.email.contains('@') {
        return Err(ErrorInfo::new(ErrorClass::Input, "email is invalid"));
    }
    Ok(())
}

fn roles_from_input(fields: &WireUserInput) -> Vec<WireRole> {
    fields
        .roles
        .iter()
        .map(|name| WireRole { name: name.clone() })
        .collect()
}

#[async_trait]
impl UserApi for InMemoryUserApi {
    async fn list(&self, limit: usize) -> Result<Vec<WireUser>, ErrorInfo> {
        let store = self.enter(ApiOp::List).await?;
        Ok(store.users.iter().take(limit).cloned().collect())
    }

    async fn create(&self, fields: &WireUserInput) -> Result<WireUser, ErrorInfo> {
        let mut store = self.enter(ApiOp::Create).await?;
        validate(fields)?;
        if store.users.iter().any(|u| u.email.eq_ignore_ascii_case(&fields.email)) {
            return Err(ErrorInfo::new(ErrorClass::Input, format!("email already in use: {}", fields.email)));
        }
        let user = WireUser {
            id: Uuid::new_v4().to_string(),
            name: fields.name.clone(),
            email: fields.email.clone(),
            image_uri: fields.image_uri.clone(),
            roles: roles_from_input(fields),
        };
        store.users.push(user.clone());
        Ok(user)
    }

    async fn edit(&self, id: &str, fields: &WireUserInput) -> Result<WireUser, ErrorInfo> {
        let mut store = self.enter(ApiOp::Edit).await?;
        validate(fields)?;
        if store
            .users
            .iter()
            .any(|u| u.id != id && u.email.eq_ignore_ascii_case(&fields.email))
        {
            return Err(ErrorInfo::new(ErrorClass::Input, format!("email already in use: {}", fields.email)));
        }
        let user = store
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ErrorInfo::new(ErrorClass::NotFound, format!("no user with id {id}")))?;
        user.name = fields.name.clone();
        user.email = fields.email.clone();
        // Absent keeps the image, empty clears it.
        if let Some(image) = &fields.image_uri {
            user.image_uri = (!image.trim().is_empty()).then(|| image.clone());
        }
        user.roles = roles_from_input(fields);
        Ok(user.clone())
    }

    async fn delete(&self, id: &str) -> Result<String, ErrorInfo> {
        let mut store = self.enter(ApiOp::Delete).await?;
        let before = store.users.len();
        store.users.retain(|u| u.id != id);
        if store.users.len() == before {
            return Err(ErrorInfo::new(ErrorClass::NotFound, format!("no user with id {id}")));
        }
        Ok(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, email: &str) -> WireUserInput {
        WireUserInput {
            id: None,
            name: name.into(),
            email: email.into(),
            image_uri: None,
            roles: vec!["editor".into()],
        }
    }

    #[tokio::test]
    async fn create_assigns_unique_ids() {
        let api = InMemoryUserApi::new();
        let a = api.create(&input("A", "a@x.com")).await.unwrap();
        let b = api.create(&input("B", "b@x.com")).await.unwrap();
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let api = InMemoryUserApi::new();
        api.create(&input("A", "a@x.com")).await.unwrap();
        let err = api.create(&input("A2", "A@x.com")).await.unwrap_err();
        assert_eq!(err.class, ErrorClass::Input);
    }

    #[tokio::test]
    async fn list_honours_limit() {
        let api = InMemoryUserApi::new();
        for i in 0..5 {
            api.seed(&format!("u{i}"), &format!("u{i}@x.com"), &[]);
        }
        assert_eq!(api.list(3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn edit_keeps_absent_image_and_clears_empty_one() {
        let api = InMemoryUserApi::new();
        api.seed_with_id(WireUser {
            id: "1".into(),
            name: "A".into(),
            email: "a@x.com".into(),
            image_uri: Some("a.png".into()),
            roles: vec![],
        });
        let mut fields = input("A", "a@x.com");
        fields.id = Some("1".into());
        let kept = api.edit("1", &fields).await.unwrap();
        assert_eq!(kept.image_uri.as_deref(), Some("a.png"));

        fields.image_uri = Some(String::new());
        let cleared = api.edit("1", &fields).await.unwrap();
        assert_eq!(cleared.image_uri, None);
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let api = InMemoryUserApi::new();
        let err = api.delete("nope").await.unwrap_err();
        assert_eq!(err.class, ErrorClass::NotFound);
    }

    #[tokio::test]
    async fn injected_fault_fires_once() {
        let api = InMemoryUserApi::new();
        api.fail_next(ApiOp::List, ErrorInfo::network("down"));
        assert!(api.list(10).await.is_err());
        assert!(api.list(10).await.is_ok());
    }
}
