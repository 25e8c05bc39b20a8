//! Device error types and status handling.
//!
//! Backend failures are reported as [`DeviceError`] values that the chassis
//! manager propagates verbatim. [`DeviceStatus`] names the failure classes a
//! backend can signal; the simulator injects them on request.

use std::fmt;
use thiserror::Error;

/// Failure classes reported by a device backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceStatus {
    Failure,
    NotSupported,
    InvalidParameter,
    ItemAlreadyExists,
    ItemNotFound,
    HwFailure,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceStatus::Failure => "FAILURE",
            DeviceStatus::NotSupported => "NOT_SUPPORTED",
            DeviceStatus::InvalidParameter => "INVALID_PARAMETER",
            DeviceStatus::ItemAlreadyExists => "ITEM_ALREADY_EXISTS",
            DeviceStatus::ItemNotFound => "ITEM_NOT_FOUND",
            DeviceStatus::HwFailure => "HW_FAILURE",
        };
        write!(f, "{}", s)
    }
}

/// Error type for device operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The backend failed without a more specific classification.
    #[error("device operation failed: {status} ({context})")]
    Status {
        status: DeviceStatus,
        context: String,
    },

    #[error("feature not supported: {feature}")]
    NotSupported { feature: String },

    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("item not found: {item}")]
    NotFound { item: String },

    #[error("item already exists: {item}")]
    AlreadyExists { item: String },

    #[error("internal device error: {message}")]
    Internal { message: String },
}

impl DeviceError {
    /// Creates an error for a backend status; `context` names the failed
    /// operation or item.
    pub fn from_status(status: DeviceStatus, context: impl Into<String>) -> Self {
        let context = context.into();
        match status {
            DeviceStatus::NotSupported => DeviceError::NotSupported { feature: context },
            DeviceStatus::InvalidParameter => DeviceError::InvalidParameter { message: context },
            DeviceStatus::ItemNotFound => DeviceError::NotFound { item: context },
            DeviceStatus::ItemAlreadyExists => DeviceError::AlreadyExists { item: context },
            DeviceStatus::Failure | DeviceStatus::HwFailure => {
                DeviceError::Status { status, context }
            }
        }
    }

    pub fn not_supported(feature: impl Into<String>) -> Self {
        DeviceError::NotSupported {
            feature: feature.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        DeviceError::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn not_found(item: impl Into<String>) -> Self {
        DeviceError::NotFound { item: item.into() }
    }

    pub fn already_exists(item: impl Into<String>) -> Self {
        DeviceError::AlreadyExists { item: item.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DeviceError::Internal {
            message: message.into(),
        }
    }
}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
