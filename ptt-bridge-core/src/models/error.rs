use thiserror::Error;

/// Errors raised by backends and configuration.
///
/// These never reach the transport channel's callers; the connector folds
/// them into a `false` result. The audio channel reports start failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("device not available")]
    DeviceNotAvailable,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("stream failed: {0}")]
    StreamFailed(String),

    #[error("profile bind failed: {0}")]
    BindFailed(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Fault raised while invoking a hidden profile operation by name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvocationFault {
    #[error("method not found: {0}")]
    MethodMissing(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("invocation failed: {0}")]
    Runtime(String),
}
