use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;

use crate::models::message::Message;
use crate::providers::base::{Provider, Usage};

/// A mock provider that returns pre-configured responses for testing
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<(String, Vec<Message>)>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of model replies
    pub fn new<S: Into<String>>(responses: Vec<S>) -> Self {
        Self::with_results(responses.into_iter().map(|r| Ok(r.into())).collect())
    }

    /// Create a mock provider whose calls may fail with the given causes
    pub fn with_results(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every (system, messages) pair this provider was called with
    pub fn requests(&self) -> Vec<(String, Vec<Message>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, system: &str, messages: &[Message]) -> Result<(Message, Usage)> {
        self.requests
            .lock()
            .unwrap()
            .push((system.to_string(), messages.to_vec()));

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Return empty response if no more pre-configured responses
            return Ok((Message::model(""), Usage::default()));
        }
        match responses.remove(0) {
            Ok(text) => Ok((Message::model(text), Usage::default())),
            Err(cause) => Err(anyhow!(cause)),
        }
    }
}
