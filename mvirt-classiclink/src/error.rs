//! Controller error types.

use std::fmt;

use thiserror::Error;

use crate::clients::ApiError;
use crate::schema::ValidationError;

/// Controller step that issued a failing control-plane call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "creating"),
            Action::Read => write!(f, "reading"),
            Action::Delete => write!(f, "deleting"),
        }
    }
}

/// Errors returned by the controller.
#[derive(Debug, Error)]
pub enum Error {
    /// The record failed schema validation; nothing was sent.
    #[error("invalid VPC ClassicLink: {0}")]
    Validation(#[from] ValidationError),

    /// A control-plane call failed and was not recoverable locally.
    #[error("Error {action} VPC ClassicLink {link}: {source}")]
    Remote {
        action: Action,
        /// `<instance_id>/<network_id>` of the link the call targeted.
        link: String,
        #[source]
        source: ApiError,
    },
}

impl Error {
    pub(crate) fn remote(action: Action, link: impl Into<String>, source: ApiError) -> Self {
        Error::Remote {
            action,
            link: link.into(),
            source,
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Remote { source, .. } => source.is_transient(),
            Error::Validation(_) => false,
        }
    }

    /// The control-plane error, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Remote { source, .. } => Some(source),
            Error::Validation(_) => None,
        }
    }
}

/// Result type for controller operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_message_has_context() {
        let err = Error::remote(
            Action::Delete,
            "i-1/vpc-1",
            ApiError::new("UnauthorizedOperation", "not allowed"),
        );
        assert_eq!(
            err.to_string(),
            "Error deleting VPC ClassicLink i-1/vpc-1: UnauthorizedOperation: not allowed"
        );
        assert!(!err.is_transient());
    }

    #[test]
    fn test_transient_passthrough() {
        let err = Error::remote(
            Action::Read,
            "i-1/vpc-1",
            ApiError::new("RequestLimitExceeded", "slow down"),
        );
        assert!(err.is_transient());
        assert_eq!(
            err.api_error().and_then(|e| e.code.as_deref()),
            Some("RequestLimitExceeded")
        );
    }
}
