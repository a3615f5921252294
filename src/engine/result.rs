// src/engine/result.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status tag of an [`ActionResult`].
///
/// Integrations may return their own status strings; anything that is not
/// one of the engine's tags is kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResultStatus {
    Success,
    Failure,
    InvalidArguments,
    UnhandledException,
    Cancelled,
    Other(String),
}

impl ResultStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ResultStatus::Success => "Success",
            ResultStatus::Failure => "Failure",
            ResultStatus::InvalidArguments => "InvalidArguments",
            ResultStatus::UnhandledException => "UnhandledException",
            ResultStatus::Cancelled => "Cancelled",
            ResultStatus::Other(s) => s,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResultStatus::Success)
    }
}

impl From<&str> for ResultStatus {
    fn from(s: &str) -> Self {
        match s {
            "Success" => ResultStatus::Success,
            "Failure" => ResultStatus::Failure,
            "InvalidArguments" => ResultStatus::InvalidArguments,
            "UnhandledException" => ResultStatus::UnhandledException,
            "Cancelled" => ResultStatus::Cancelled,
            other => ResultStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for ResultStatus {
    fn from(s: String) -> Self {
        ResultStatus::from(s.as_str())
    }
}

impl From<ResultStatus> for String {
    fn from(status: ResultStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one action execution. Equality is by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub result: Value,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionResult {
    pub fn new(result: Value, status: ResultStatus) -> Self {
        Self {
            result,
            status,
            message: None,
        }
    }

    /// An error classification; the message doubles as the payload.
    pub fn error(status: ResultStatus, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            result: Value::String(message.clone()),
            status,
            message: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "result": self.result,
            "status": self.status.as_str(),
            "message": self.message,
        })
    }
}
