use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub status: CommandStatus,
    pub message: String,
    #[serde(default)]
    pub details: Value,
}

impl ExecutionOutcome {
    pub fn success(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: message.into(),
            details,
        }
    }

    pub fn failure(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Failure,
            message: message.into(),
            details,
        }
    }

    pub fn user_error(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::UserError,
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.details
            .as_object()
            .and_then(|map| map.get("hint"))
            .and_then(Value::as_str)
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self.status {
            CommandStatus::Ok => 0,
            CommandStatus::UserError => 1,
            CommandStatus::Failure => 2,
        }
    }

    /// `{status, message, details}` envelope printed under `--json`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let status = match self.status {
            CommandStatus::Ok => "ok",
            CommandStatus::UserError => "user-error",
            CommandStatus::Failure => "error",
        };
        let details = match &self.details {
            Value::Object(_) => self.details.clone(),
            Value::Null => json!({}),
            other => json!({ "value": other }),
        };
        json!({
            "status": status,
            "message": self.message,
            "details": details,
        })
    }
}

#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct UserError {
    message: String,
    details: Value,
}

impl UserError {
    pub fn new(message: impl Into<String>, details: Value) -> Self {
        Self {
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn into_outcome(self) -> ExecutionOutcome {
        ExecutionOutcome::user_error(self.message, self.details)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    UserError,
    Failure,
}
