use std::fmt::{Display, Formatter};

use thiserror::Error;

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type Result<T> = std::result::Result<T, DynError>;

/// Classification of a failure reported by the remote user API.
///
/// Classes are forwarded as reported; the core never reinterprets them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request never produced a response (connect, timeout, reset).
    Network,
    /// Non-success HTTP status.
    Http(u16),
    /// Response body could not be decoded.
    Decode,
    Authentication,
    Authorization,
    /// Rejected input (validation, duplicate email).
    Input,
    NotFound,
    Internal,
    /// A GraphQL error without a recognised `extensions.type`.
    Remote,
}

impl ErrorClass {
    /// Map a GraphQL `extensions.type` tag onto a class.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "AUTHENTICATION" => ErrorClass::Authentication,
            "AUTHORIZATION" | "FORBIDDEN" => ErrorClass::Authorization,
            "INPUT" | "VALIDATION" => ErrorClass::Input,
            "NOT_FOUND" | "NOTFOUND" => ErrorClass::NotFound,
            "INTERNAL" => ErrorClass::Internal,
            _ => ErrorClass::Remote,
        }
    }
}

impl Display for ErrorClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Network => write!(f, "network"),
            ErrorClass::Http(status) => write!(f, "http {status}"),
            ErrorClass::Decode => write!(f, "decode"),
            ErrorClass::Authentication => write!(f, "authentication"),
            ErrorClass::Authorization => write!(f, "authorization"),
            ErrorClass::Input => write!(f, "input"),
            ErrorClass::NotFound => write!(f, "not found"),
            ErrorClass::Internal => write!(f, "internal"),
            ErrorClass::Remote => write!(f, "remote"),
        }
    }
}

/// Opaque error payload forwarded from the remote user API.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{class}: {message}")]
pub struct ErrorInfo {
    pub class: ErrorClass,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Network, message)
    }
}

impl From<reqwest::Error> for ErrorInfo {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ErrorInfo::new(ErrorClass::Http(status.as_u16()), err.to_string())
        } else if err.is_decode() {
            ErrorInfo::new(ErrorClass::Decode, err.to_string())
        } else {
            ErrorInfo::network(err.to_string())
        }
    }
}

pub trait Context<T> {
    fn with_ctx<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

#[derive(Debug)]
pub struct WithContextError {
    pub context: String,
    pub source: DynError,
}

impl Display for WithContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.context, self.source)
    }
}

impl std::error::Error for WithContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_ctx<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            Box::new(WithContextError {
                context: f(),
                source: e.into(),
            }) as DynError
        })
    }
}

#[derive(Debug)]
pub struct SimpleError(pub String);

impl SimpleError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl Display for SimpleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SimpleError {}

pub fn simple_error(msg: impl Into<String>) -> DynError {
    Box::new(SimpleError::new(msg))
}
