//! Clients for the control-plane ClassicLink API.
//!
//! - http: JSON/HTTP client for a remote control plane
//! - memory: in-process control plane for tests and dry runs

pub mod http;
pub mod memory;

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpClient;
pub use memory::MemoryApi;

use crate::state::ObservedState;

/// Error code returned when the instance (or its link) does not exist.
pub const NOT_FOUND_CODE: &str = "InvalidInstanceID.NotFound";

/// Error codes that indicate a retryable condition.
const TRANSIENT_CODES: &[&str] = &[
    "RequestLimitExceeded",
    "Throttling",
    "ServiceUnavailable",
    "Unavailable",
    "InternalError",
];

/// Classification of a control-plane error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The instance or its link does not exist.
    NotFound,
    /// Throttling, unavailability or a transport fault. Safe to retry.
    Transient,
    /// Anything else, including errors without a recognizable code.
    Other,
}

impl ApiErrorKind {
    /// Classify an error by its code and, if known, the HTTP status.
    pub fn from_code(code: Option<&str>, status: Option<u16>) -> Self {
        match code {
            Some(NOT_FOUND_CODE) => ApiErrorKind::NotFound,
            Some(c) if TRANSIENT_CODES.contains(&c) => ApiErrorKind::Transient,
            _ if matches!(status, Some(429) | Some(500..=599)) => ApiErrorKind::Transient,
            _ => ApiErrorKind::Other,
        }
    }
}

/// Error returned by a [`ClassicLinkApi`] call.
#[derive(Debug, Clone, Error)]
#[error("{}: {message}", .code.as_deref().unwrap_or("<no error code>"))]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// Machine-readable code, `None` if the error did not carry one.
    pub code: Option<String>,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            kind: ApiErrorKind::from_code(Some(&code), None),
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(NOT_FOUND_CODE, message)
    }

    /// An error whose payload could not be classified.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Other,
            code: None,
            message: message.into(),
        }
    }

    /// A failure below the API (connect, timeout, broken body).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Transient,
            code: None,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::NotFound
    }

    pub fn is_transient(&self) -> bool {
        self.kind == ApiErrorKind::Transient
    }
}

/// Result type for control-plane calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// A classic link as returned by the describe call.
pub type ClassicLinkRecord = ObservedState;

/// The control-plane operations the controller depends on.
#[async_trait]
pub trait ClassicLinkApi: Send + Sync {
    /// Link an instance to a VPC with exactly the given security groups.
    async fn attach(
        &self,
        instance_id: &str,
        network_id: &str,
        security_group_ids: &BTreeSet<String>,
    ) -> ApiResult<()>;

    /// Describe the classic link of an instance. Empty if it is not linked.
    async fn describe(&self, instance_id: &str) -> ApiResult<Vec<ClassicLinkRecord>>;

    /// Unlink an instance from a VPC.
    async fn detach(&self, instance_id: &str, network_id: &str) -> ApiResult<()>;
}
