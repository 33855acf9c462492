use anyhow::{anyhow, Result};
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};

use crate::models::message::Message;
use crate::models::role::Role;

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let role = match message.role {
                Role::User => "user",
                Role::Model => "assistant",
            };
            json!({
                "role": role,
                "content": message.text,
            })
        })
        .collect()
}

/// Convert OpenAI's API response to internal Message format
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    let original = &response["choices"][0]["message"];
    if original.is_null() {
        return Err(anyhow!("No choices in response"));
    }

    // content is null when the model refuses or only calls tools, which we never offer
    let text = original
        .get("content")
        .and_then(|content| content.as_str())
        .unwrap_or_default();

    Ok(Message::model(text))
}

/// Convert internal Message format to Gemini `contents`
pub fn messages_to_gemini_contents(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role.as_str(),
                "parts": [{ "text": message.text }],
            })
        })
        .collect()
}

/// Convert a Gemini `generateContent` response to internal Message format
///
/// The reply text is every text part of the first candidate joined together.
pub fn gemini_response_to_message(response: &Value) -> Result<Message> {
    let candidate = match response
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
    {
        Some(candidate) => candidate,
        None => {
            return match response["promptFeedback"]["blockReason"].as_str() {
                Some(reason) => Err(anyhow!("Prompt blocked: {}", reason)),
                None => Err(anyhow!("No candidates in response")),
            };
        }
    };

    let parts = candidate["content"]["parts"]
        .as_array()
        .ok_or_else(|| match candidate["finishReason"].as_str() {
            Some(reason) => anyhow!("Candidate has no content, finish reason: {}", reason),
            None => anyhow!("Candidate has no content"),
        })?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    Ok(Message::model(text))
}

/// Map an http response from a provider to its json body, or an error describing the failure
pub async fn handle_response(response: Response) -> Result<Value> {
    match response.status() {
        StatusCode::OK => Ok(response.json().await?),
        status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
            Err(anyhow!("Server error: {}", status))
        }
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(anyhow!("Request failed: {}\nResponse: {}", status, body))
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}
