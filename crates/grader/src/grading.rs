//! Turns a (code, question) pair into a grade by asking the model and recovering a
//! `{grade, feedback}` object from whatever text it sends back.
//!
//! Recovery is deliberately naive: the candidate object is everything from the first `{`
//! to the last `}` of the reply, and it is accepted whenever that whole span parses as a
//! json object, whatever keys it holds. Replies that don't comply still produce a result,
//! with [`UNGRADEABLE_GRADE`] and the reply itself as the feedback.
//!
//! Parsing is strict json, so bare `NaN` or `Infinity` literals make a span unparseable.

use futures::FutureExt;
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

use crate::conversation::ConversationClient;
use crate::errors::GradingError;
use crate::models::grade::{Assessment, GradeOutcome, GradeResult, FAILED_GRADE, UNGRADEABLE_GRADE};
use crate::prompt_template::{load_prompt, GRADE_PROMPT};

pub struct Grader {
    client: ConversationClient,
    template: String,
}

impl Grader {
    pub fn new(client: ConversationClient) -> Self {
        Self::with_template(client, GRADE_PROMPT)
    }

    /// Use a custom grading prompt, a tera template given `question` and `code`
    pub fn with_template<S: Into<String>>(client: ConversationClient, template: S) -> Self {
        Self {
            client,
            template: template.into(),
        }
    }

    pub fn client(&self) -> &ConversationClient {
        &self.client
    }

    /// Grade `code` as an answer to `question`
    pub async fn grade(&self, code: &str, question: &str) -> GradeResult {
        self.assess(code, question).await.result
    }

    /// Grade `code` as an answer to `question`, reporting how the grade was reached
    pub async fn assess(&self, code: &str, question: &str) -> Assessment {
        let prompt = match self.render_prompt(code, question) {
            Ok(prompt) => prompt,
            Err(err) => return failed(err),
        };

        let reply = AssertUnwindSafe(self.client.converse(&prompt, &[]))
            .catch_unwind()
            .await;

        let assessment = match reply {
            Ok(Ok(text)) => parse_reply(&text),
            // keep the error text as feedback, the interface shows it like any other reply
            Ok(Err(err)) => Assessment::new(
                GradeResult::new(UNGRADEABLE_GRADE, err.to_string()),
                GradeOutcome::ServiceError,
            ),
            Err(panic) => failed(GradingError::Panicked(panic_message(panic.as_ref()))),
        };

        tracing::info!(
            outcome = %assessment.outcome,
            grade = ?assessment.result.score(),
            "graded submission"
        );
        assessment
    }

    fn render_prompt(&self, code: &str, question: &str) -> Result<String, GradingError> {
        let mut context = HashMap::new();
        context.insert("question", question);
        context.insert("code", code);
        Ok(load_prompt(&self.template, &context)?)
    }
}

/// Recover a grade from a raw model reply
pub fn parse_reply(reply: &str) -> Assessment {
    let parsed = json_span(reply).and_then(|span| {
        serde_json::from_str::<Map<String, Value>>(span)
            .map_err(|err| tracing::debug!(error = %err, "reply span is not a json object"))
            .ok()
    });

    match parsed.map(|object| serde_json::from_value::<GradeResult>(Value::Object(object))) {
        Some(Ok(result)) if result.is_complete() => Assessment::new(result, GradeOutcome::Graded),
        Some(Ok(result)) => {
            tracing::warn!(
                keys = ?result.extra.keys().collect::<Vec<_>>(),
                "reply object lacks grade or feedback"
            );
            Assessment::new(result, GradeOutcome::Incomplete)
        }
        Some(Err(err)) => {
            tracing::warn!(error = %err, "reply object is not a grade");
            ungradeable(reply)
        }
        None => {
            tracing::warn!("reply holds no json object");
            ungradeable(reply)
        }
    }
}

/// The text from the first `{` to the last `}`, if the last comes after the first
pub fn json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn ungradeable(reply: &str) -> Assessment {
    Assessment::new(
        GradeResult::new(UNGRADEABLE_GRADE, reply),
        GradeOutcome::Ungradeable,
    )
}

fn failed(err: GradingError) -> Assessment {
    tracing::error!(error = %err, "grading failed");
    Assessment::new(
        GradeResult::new(FAILED_GRADE, err.feedback()),
        GradeOutcome::Failed,
    )
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
