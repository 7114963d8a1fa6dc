// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for subnet reconciliation
//!
//! Two layers:
//!
//! - [`ApiError`] is what a [`NetworkApi`](crate::api::NetworkApi) returns. It
//!   carries a structured [`ApiErrorCode`] so callers never inspect message text.
//! - [`SubnetError`] is the reconciler-facing taxonomy. `From<ApiError>` performs
//!   the kind mapping once, at the boundary.

use std::fmt;

use thiserror::Error;

use crate::domain::NetworkError;
use crate::retry::RetryCancelled;

/// Structured error code reported by the remote network API
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ApiErrorCode {
    /// Optimistic-concurrency collision on the network
    Conflict,
    /// Network is locked by another running action
    Locked,
    /// Addressed resource does not exist
    NotFound,
    /// Subnet still has servers attached; the remote detaches them asynchronously
    SubnetsAttached,
    /// Generic remote-side failure
    ServiceError,
    /// Request was rejected as malformed
    InvalidInput,
    /// Uniqueness constraint violated (e.g. overlapping IP range)
    UniquenessError,
    /// Too many requests
    RateLimitExceeded,
    /// Missing or invalid credentials
    Unauthorized,
    /// Credentials lack permission
    Forbidden,
    /// Request never produced a response
    Transport,
    /// Response could not be decoded
    InvalidResponse,
    /// Any code this crate does not model
    Other(String),
}

impl ApiErrorCode {
    /// Map a wire error code to its structured form
    pub fn from_code(code: &str) -> Self {
        match code {
            "conflict" => Self::Conflict,
            "locked" => Self::Locked,
            "not_found" => Self::NotFound,
            "service_error" => Self::ServiceError,
            "invalid_input" => Self::InvalidInput,
            "uniqueness_error" => Self::UniquenessError,
            "rate_limit_exceeded" => Self::RateLimitExceeded,
            "unauthorized" => Self::Unauthorized,
            "forbidden" => Self::Forbidden,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire representation of the code
    pub fn as_str(&self) -> &str {
        match self {
            Self::Conflict => "conflict",
            Self::Locked => "locked",
            Self::NotFound => "not_found",
            Self::SubnetsAttached => "subnets_attached",
            Self::ServiceError => "service_error",
            Self::InvalidInput => "invalid_input",
            Self::UniquenessError => "uniqueness_error",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Transport => "transport",
            Self::InvalidResponse => "invalid_response",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by the remote network API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({code})")]
pub struct ApiError {
    /// Structured error kind
    pub code: ApiErrorCode,
    /// Human-readable message, for diagnostics only
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Check the error kind
    pub fn is(&self, code: &ApiErrorCode) -> bool {
        &self.code == code
    }
}

/// Result type for remote API calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by subnet reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubnetError {
    /// Composite subnet id could not be decoded
    #[error("invalid network subnet id: {0}")]
    InvalidIdentifier(String),

    /// Input values failed validation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network or subnet does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Concurrent mutation on the same network
    #[error("conflict: {0}")]
    Conflict(String),

    /// Network is locked by a running action
    #[error("locked: {0}")]
    Locked(String),

    /// Subnet still has attached servers
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Remote action finished with error status
    #[error("action {action_id} ({command}) failed: {message} ({code})")]
    ActionFailed {
        action_id: u64,
        command: String,
        code: String,
        message: String,
    },

    /// Cancellation or deadline fired
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Anything else, surfaced verbatim
    #[error("{0}")]
    Unknown(String),
}

impl SubnetError {
    /// Whether the error is a retryable contention signal on create
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Whether the error is a retryable contention signal on delete
    pub fn is_contention(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_) | Self::Locked(_) | Self::Precondition(_)
        )
    }
}

/// Result type for reconciliation operations
pub type SubnetResult<T> = Result<T, SubnetError>;

impl From<ApiError> for SubnetError {
    fn from(err: ApiError) -> Self {
        match err.code {
            ApiErrorCode::Conflict => SubnetError::Conflict(err.message),
            ApiErrorCode::Locked => SubnetError::Locked(err.message),
            ApiErrorCode::NotFound => SubnetError::NotFound(err.message),
            ApiErrorCode::SubnetsAttached => SubnetError::Precondition(err.message),
            ApiErrorCode::InvalidInput => SubnetError::InvalidInput(err.message),
            _ => SubnetError::Unknown(err.to_string()),
        }
    }
}

impl From<NetworkError> for SubnetError {
    fn from(err: NetworkError) -> Self {
        SubnetError::InvalidInput(err.to_string())
    }
}

impl From<RetryCancelled> for SubnetError {
    fn from(err: RetryCancelled) -> Self {
        SubnetError::Cancelled(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_mapping() {
        assert_eq!(ApiErrorCode::from_code("conflict"), ApiErrorCode::Conflict);
        assert_eq!(ApiErrorCode::from_code("locked"), ApiErrorCode::Locked);
        assert_eq!(
            ApiErrorCode::from_code("something_new"),
            ApiErrorCode::Other("something_new".to_string())
        );
        assert_eq!(ApiErrorCode::Other("x".to_string()).as_str(), "x");
    }

    #[test]
    fn test_api_error_to_subnet_error() {
        let err: SubnetError = ApiError::new(ApiErrorCode::Conflict, "busy").into();
        assert_eq!(err, SubnetError::Conflict("busy".to_string()));

        let err: SubnetError = ApiError::new(ApiErrorCode::SubnetsAttached, "attached").into();
        assert!(matches!(err, SubnetError::Precondition(_)));
        assert!(err.is_contention());
        assert!(!err.is_conflict());

        let err: SubnetError = ApiError::new(ApiErrorCode::ServiceError, "boom").into();
        assert_eq!(err, SubnetError::Unknown("boom (service_error)".to_string()));
    }
}
