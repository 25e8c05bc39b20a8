//! Error types for chassis manager operations.
//!
//! Every failure carries an [`ErrorCode`] so callers can tell a bad config
//! apart from an unsupported change, a required reboot or a backend fault.

use chassis_device::DeviceError;
use std::fmt;
use thiserror::Error;

/// Result type alias for chassis manager operations.
pub type ChassisResult<T> = Result<T, ChassisError>;

/// Coarse classification of a [`ChassisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidParam,
    Unimplemented,
    Internal,
    NotInitialized,
    NotFound,
    RebootRequired,
    Device,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidParam => "ERR_INVALID_PARAM",
            ErrorCode::Unimplemented => "ERR_UNIMPLEMENTED",
            ErrorCode::Internal => "ERR_INTERNAL",
            ErrorCode::NotInitialized => "ERR_NOT_INITIALIZED",
            ErrorCode::NotFound => "ERR_ENTRY_NOT_FOUND",
            ErrorCode::RebootRequired => "ERR_REBOOT_REQUIRED",
            ErrorCode::Device => "ERR_HARDWARE_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Errors that can occur while verifying, pushing, replaying or querying
/// chassis config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChassisError {
    /// The pushed config is malformed or references unknown entities.
    #[error("Invalid parameter: {message}")]
    InvalidParam { message: String },

    /// The requested change is recognised but not supported.
    #[error("Unimplemented: {message}")]
    Unimplemented { message: String },

    /// Internal bookkeeping is inconsistent.
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Chassis manager not initialized")]
    NotInitialized,

    #[error("{item} is not configured or not known")]
    NotFound { item: String },

    /// The config changes the port layout of an initialized switch.
    #[error("Reboot required: {message}")]
    RebootRequired { message: String },

    /// A backend call failed; the device error is passed through unchanged.
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// One or more ports failed to replay. Every port was still attempted.
    #[error(
        "Replay of node {node_id} failed for {} port(s): {}",
        .failures.len(),
        join_errors(.failures)
    )]
    Replay {
        node_id: u64,
        failures: Vec<ChassisError>,
    },
}

fn join_errors(errors: &[ChassisError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ChassisError {
    pub fn invalid_param(message: impl Into<String>) -> Self {
        Self::InvalidParam {
            message: message.into(),
        }
    }

    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::Unimplemented {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn not_found(item: impl Into<String>) -> Self {
        Self::NotFound { item: item.into() }
    }

    pub fn reboot_required(message: impl Into<String>) -> Self {
        Self::RebootRequired {
            message: message.into(),
        }
    }

    /// Returns the classification of this error.
    ///
    /// An aggregated replay error takes the code of its first failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            ChassisError::InvalidParam { .. } => ErrorCode::InvalidParam,
            ChassisError::Unimplemented { .. } => ErrorCode::Unimplemented,
            ChassisError::Internal { .. } => ErrorCode::Internal,
            ChassisError::NotInitialized => ErrorCode::NotInitialized,
            ChassisError::NotFound { .. } => ErrorCode::NotFound,
            ChassisError::RebootRequired { .. } => ErrorCode::RebootRequired,
            ChassisError::Device(_) => ErrorCode::Device,
            ChassisError::Replay { failures, .. } => failures
                .first()
                .map(ChassisError::code)
                .unwrap_or(ErrorCode::Internal),
        }
    }
}
