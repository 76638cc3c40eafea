use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use super::UserApi;
use crate::error::{ErrorClass, ErrorInfo};
use crate::user::{WireUser, WireUserInput};

const USER_FIELDS: &str = "id name email imageUri roles { name }";

fn get_users_query() -> String {
    format!("query GetUsers($limit: Int) {{ users(limit: $limit) {{ {USER_FIELDS} }} }}")
}

fn create_user_mutation() -> String {
    format!("mutation CreateUser($user: UserInput!) {{ createdUser: createUser(user: $user) {{ {USER_FIELDS} }} }}")
}

fn edit_user_mutation() -> String {
    format!("mutation EditUser($user: UserInput!) {{ editedUser: editUser(user: $user) {{ {USER_FIELDS} }} }}")
}

const DELETE_USER_MUTATION: &str = "mutation DeleteUser($id: ID!) { deleteUser(id: $id) }";

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct UsersData {
    users: Vec<WireUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedData {
    created_user: WireUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditedData {
    edited_user: WireUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeletedData {
    delete_user: String,
}

/// GraphQL client for the user endpoint. Keeps cookies so a session set by
/// the server is reused across calls.
#[derive(Clone, Debug)]
pub struct GraphqlUserApi {
    endpoint: String,
    client: Client,
}

impl GraphqlUserApi {
    /// No local request timeout: a call fails only when the transport or the
    /// server reports a failure.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::builder()
                .cookie_store(true)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, ErrorInfo> {
        debug!(endpoint = %self.endpoint, "graphql request");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        // GraphQL servers may report errors with a non-2xx status; prefer the
        // structured errors when the body carries them.
        match decode_response::<T>(&body) {
            Ok(data) => Ok(data),
            Err(err) if status.is_success() || err.class != ErrorClass::Decode => Err(err),
            Err(_) => Err(ErrorInfo::new(
                ErrorClass::Http(status.as_u16()),
                format!("HTTP {status}"),
            )),
        }
    }
}

/// Decode a GraphQL response body into its `data` payload.
fn decode_response<T: DeserializeOwned>(body: &str) -> Result<T, ErrorInfo> {
    let parsed: GraphqlResponse<T> = serde_json::from_str(body)
        .map_err(|e| ErrorInfo::new(ErrorClass::Decode, format!("parse error: {e}")))?;
    if let Some(first) = parsed.errors.first() {
        let class = first
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("type").or_else(|| ext.get("code")))
            .and_then(Value::as_str)
            .map(ErrorClass::from_tag)
            .unwrap_or(ErrorClass::Remote);
        let message = parsed
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ErrorInfo::new(class, message));
    }
    parsed
        .data
        .ok_or_else(|| ErrorInfo::new(ErrorClass::Decode, "response carried no data"))
}

#[async_trait]
impl UserApi for GraphqlUserApi {
    async fn list(&self, limit: usize) -> Result<Vec<WireUser>, ErrorInfo> {
        let data: UsersData = self
            .execute(&get_users_query(), json!({ "limit": limit }))
            .await?;
        Ok(data.users)
    }

    async fn create(&self, fields: &WireUserInput) -> Result<WireUser, ErrorInfo> {
        let data: CreatedData = self
            .execute(&create_user_mutation(), json!({ "user": fields }))
            .await?;
        Ok(data.created_user)
    }

    async fn edit(&self, id: &str, fields: &WireUserInput) -> Result<WireUser, ErrorInfo> {
        let mut user = fields.clone();
        user.id = Some(id.to_string());
        let data: EditedData = self
            .execute(&edit_user_mutation(), json!({ "user": user }))
            .await?;
        Ok(data.edited_user)
    }

    async fn delete(&self, id: &str) -> Result<String, ErrorInfo> {
        let data: DeletedData = self
            .execute(DELETE_USER_MUTATION, json!({ "id": id }))
            .await?;
        Ok(data.delete_user)
    }
}
