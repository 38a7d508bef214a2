//! Error types for the bot bridge

use std::time::Duration;

use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Bridge error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The entity's menu lacks the requested action
    #[error("Action not available on {entity}: {action}")]
    ActionNotAvailable { entity: String, action: String },

    /// Out-of-range index or malformed id/name set
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Blocking wait exceeded its budget
    #[error("Invocation timed out after {0:?}")]
    InvocationTimeout(Duration),

    /// Owner thread has shut down or is not yet initialized
    #[error("Owner thread unavailable: {0}")]
    OwnerThreadUnavailable(String),

    /// Submitted work panicked on the owner thread
    #[error("Submitted work panicked: {0}")]
    WorkPanicked(String),

    /// World model rejected or failed a request
    #[error("World error: {0}")]
    World(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BridgeError {
    /// Stable numeric code for this error
    pub fn code(&self) -> i32 {
        match self {
            BridgeError::ActionNotAvailable { .. } => error_codes::ACTION_NOT_AVAILABLE,
            BridgeError::InvalidArgument(_) => error_codes::INVALID_ARGUMENT,
            BridgeError::InvocationTimeout(_) => error_codes::INVOCATION_TIMEOUT,
            BridgeError::OwnerThreadUnavailable(_) => error_codes::OWNER_THREAD_UNAVAILABLE,
            BridgeError::WorkPanicked(_) => error_codes::WORK_PANICKED,
            BridgeError::World(_) => error_codes::WORLD,
            BridgeError::Config(_) => error_codes::CONFIG,
            BridgeError::Serialization(_) => error_codes::SERIALIZATION,
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

/// Numeric error codes, stable across releases
pub mod error_codes {
    pub const ACTION_NOT_AVAILABLE: i32 = -32000;
    pub const INVALID_ARGUMENT: i32 = -32001;
    pub const INVOCATION_TIMEOUT: i32 = -32002;
    pub const OWNER_THREAD_UNAVAILABLE: i32 = -32003;
    pub const WORK_PANICKED: i32 = -32004;
    pub const WORLD: i32 = -32005;
    pub const CONFIG: i32 = -32006;
    pub const SERIALIZATION: i32 = -32007;
}
