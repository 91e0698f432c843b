use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arguments attached to a method call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallArguments {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    Value(Value),
}

impl CallArguments {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            // An empty list decodes as bytes, but be lenient with values too.
            Self::Value(Value::Array(items)) if items.is_empty() => Some(&[]),
            _ => None,
        }
    }
}

/// A named command sent over a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: CallArguments,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: CallArguments::Empty,
        }
    }

    pub fn with_bytes(method: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            method: method.into(),
            arguments: CallArguments::Bytes(bytes),
        }
    }
}

/// Answer to a method call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResponse {
    Success { result: Value },
    Error { code: String, message: String },
    NotImplemented { method: String },
}

impl MethodResponse {
    pub fn null() -> Self {
        Self::Success { result: Value::Null }
    }

    pub fn boolean(value: bool) -> Self {
        Self::Success {
            result: Value::Bool(value),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_implemented(method: impl Into<String>) -> Self {
        Self::NotImplemented {
            method: method.into(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Success { result } => result.as_bool(),
            _ => None,
        }
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }
}

/// One-shot reply sink for a method call.
pub type Reply = Box<dyn FnOnce(MethodResponse) + Send + 'static>;

/// Handler bound to one method channel.
pub trait MethodCallHandler: Send + Sync {
    /// Handle `call` and answer through `reply`, now or later.
    ///
    /// Unknown methods answer `MethodResponse::NotImplemented`.
    fn on_method_call(&self, call: MethodCall, reply: Reply);

    /// Methods this handler recognizes.
    fn methods(&self) -> &'static [&'static str];
}
