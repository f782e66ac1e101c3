//! UI-agnostic conversation types
//!
//! These are shared between the controller, the generation client and
//! whatever shell renders the conversation. None of them depend on a UI
//! framework.

use serde::{Deserialize, Serialize};

/// Who authored a message. Serialized exactly as the generation API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A single entry in the conversation. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Message {
    pub fn new(id: String, role: Role, text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// The transport-facing view of this message.
    pub fn turn(&self) -> Turn {
        Turn {
            role: self.role,
            text: self.text.clone(),
        }
    }
}

/// A role-tagged piece of history as sent to the generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}
