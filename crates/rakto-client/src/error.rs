//! Error types for client operations.

use rakto_core::{BackendError, RequestStatus};
use thiserror::Error;

use crate::forms::FormErrors;

/// Errors that can occur in a client operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Form input failed validation; nothing was sent.
    #[error("invalid input: {0}")]
    Validation(FormErrors),

    /// The backend failed the request.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    NotAuthenticated,

    /// The operation needs a donor profile for the signed-in user.
    #[error("no donor profile registered")]
    NotRegistered,

    /// The user already has a donor profile.
    #[error("already registered as donor {donor_id}")]
    AlreadyRegistered { donor_id: String },

    /// Request status change outside the allowed transitions.
    #[error("cannot change request status from {from} to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    /// The session actor has stopped.
    #[error("session closed")]
    SessionClosed,

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<FormErrors> for ClientError {
    fn from(errors: FormErrors) -> Self {
        ClientError::Validation(errors)
    }
}

impl ClientError {
    /// The single message shown to the user on the initiating screen.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(errors) => match errors.first() {
                Some(first) => first.error.to_string(),
                None => "Please check your input".to_string(),
            },
            ClientError::Backend(e) => e.to_string(),
            ClientError::NotAuthenticated => "Please login first".to_string(),
            ClientError::NotRegistered => "Please register as a donor first".to_string(),
            ClientError::AlreadyRegistered { .. } => {
                "You are already registered as a donor".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
