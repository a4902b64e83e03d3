use serde::Serialize;
use thiserror::Error;

/// A single rejected input field, reported back to the client verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, fields: Vec<FieldError>, correlation_id: String },
    #[error("unauthorized: {message}")]
    Unauthorized { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    /// Client-facing text. The `message` field never leaves the server.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { message, .. } if message == INVALID_CREDENTIALS => {
                "Invalid authentication"
            }
            Self::BadRequest { .. } => "Bad request",
            Self::Unauthorized { .. } => "Not authorized",
            Self::Internal { .. } => "Internal server error",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Unauthorized { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }

    pub fn fields(&self) -> &[FieldError] {
        match self {
            Self::BadRequest { fields, .. } => fields,
            Self::Unauthorized { .. } | Self::Internal { .. } => &[],
        }
    }
}

const INVALID_CREDENTIALS: &str = "invalid credentials";

impl ApplicationError {
    pub fn validation(fields: Vec<FieldError>) -> Self {
        Self::Domain(DomainError::Validation(fields))
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Unauthorized { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(DomainError::Validation(fields)) => Self::BadRequest {
                message: "validation failed".to_owned(),
                fields,
                correlation_id,
            },
            ApplicationError::Domain(DomainError::InvariantViolation(message))
            | ApplicationError::NotFound(message) => {
                Self::BadRequest { message, fields: Vec::new(), correlation_id }
            }
            ApplicationError::InvalidCredentials => Self::BadRequest {
                message: INVALID_CREDENTIALS.to_owned(),
                fields: Vec::new(),
                correlation_id,
            },
            ApplicationError::Unauthenticated(message) => {
                Self::Unauthorized { message, correlation_id }
            }
            ApplicationError::Persistence(message) | ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id }
            }
        }
    }
}
