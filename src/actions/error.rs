use super::routes::ActionKind;
use crate::client::ClientError;
use crate::entity::Unavailable;
use crate::registry::{Binding, EntityKind};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("Entity not found: {kind} '{key}'")]
    NotFound { kind: EntityKind, key: String },
    #[error("{key} is unavailable: {reason}")]
    Unavailable { key: String, reason: Unavailable },
    #[error("'{option}' is not an option of {key}")]
    UnknownOption { key: String, option: String },
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: Value },
    #[error("No effect known for device {0}")]
    MissingDeviceState(String),
    #[error("{action} is not supported by {kind} entities bound to {binding:?}")]
    Unmapped {
        kind: EntityKind,
        binding: Binding,
        action: ActionKind,
    },
}

pub type ActionResult<T> = Result<T, ActionError>;
