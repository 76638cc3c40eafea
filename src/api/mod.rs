//! Remote user API: one read and three writes.
//!
//! [`UserApi`] is the seam the controller talks through. Two adapters are
//! provided: [`graphql::GraphqlUserApi`] for a real server and
//! [`memory::InMemoryUserApi`] for demo mode and tests.

pub mod graphql;
pub mod memory;

use async_trait::async_trait;

use crate::error::ErrorInfo;
use crate::user::{WireUser, WireUserInput};

pub use graphql::GraphqlUserApi;
pub use memory::InMemoryUserApi;

/// Operation kinds, used for logging and fault injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiOp {
    List,
    Create,
    Edit,
    Delete,
}

#[async_trait]
pub trait UserApi: Send + Sync {
    /// Read up to `limit` users.
    async fn list(&self, limit: usize) -> Result<Vec<WireUser>, ErrorInfo>;
    /// Create a user; the server assigns the id.
    async fn create(&self, fields: &WireUserInput) -> Result<WireUser, ErrorInfo>;
    /// Edit the user with `id`, returning the server's view of it.
    async fn edit(&self, id: &str, fields: &WireUserInput) -> Result<WireUser, ErrorInfo>;
    /// Delete the user with `id`, returning the deleted id.
    async fn delete(&self, id: &str) -> Result<String, ErrorInfo>;
}
