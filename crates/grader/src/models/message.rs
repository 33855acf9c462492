use super::role::Role;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A single turn to or from an LLM
pub struct Message {
    pub role: Role,
    pub created: i64,
    pub text: String,
}

impl Message {
    pub fn new<S: Into<String>>(role: Role, text: S) -> Self {
        Message {
            role,
            created: Utc::now().timestamp(),
            text: text.into(),
        }
    }

    /// Create a new user message with the current timestamp
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self::new(Role::User, text)
    }

    /// Create a new model message with the current timestamp
    pub fn model<S: Into<String>>(text: S) -> Self {
        Self::new(Role::Model, text)
    }
}
