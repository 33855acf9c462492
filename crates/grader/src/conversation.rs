use std::sync::Arc;

use crate::errors::ServiceError;
use crate::models::message::Message;
use crate::prompt_template::SYSTEM_PROMPT;
use crate::providers::base::Provider;

/// Sends conversations to a provider under one fixed system instruction
#[derive(Clone)]
pub struct ConversationClient {
    provider: Arc<dyn Provider>,
    system: String,
}

impl ConversationClient {
    pub fn new<S: Into<String>>(provider: Arc<dyn Provider>, system: S) -> Self {
        Self {
            provider,
            system: system.into(),
        }
    }

    /// A client using the built in grading instruction
    pub fn grader(provider: Arc<dyn Provider>) -> Self {
        Self::new(provider, SYSTEM_PROMPT)
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    /// Replay `history` then send `message` as the next user turn, returning the raw reply text
    pub async fn converse(&self, message: &str, history: &[Message]) -> Result<String, ServiceError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.extend_from_slice(history);
        messages.push(Message::user(message));

        let (reply, usage) = self
            .provider
            .complete(&self.system, &messages)
            .await
            .map_err(|err| {
                tracing::warn!(error = %format!("{:#}", err), "provider call failed");
                ServiceError::from(err)
            })?;

        tracing::debug!(
            input_tokens = ?usage.input_tokens,
            output_tokens = ?usage.output_tokens,
            total_tokens = ?usage.total_tokens,
            "provider replied"
        );
        Ok(reply.text)
    }
}
