use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Default grade for a reply we could not interpret as a grade
pub const UNGRADEABLE_GRADE: i64 = 50;

/// Grade reported when grading itself faulted
pub const FAILED_GRADE: i64 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// The grade and feedback relayed to the interface
///
/// Both fields hold whatever json the model produced. The model is asked for a number
/// between 0 and 100 and a string, but nothing downstream of parsing enforces that.
/// A field the model left out stays absent, and any additional keys it returns are kept
/// alongside, so a parsed object serializes back to the same keys.
pub struct GradeResult {
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub grade: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub feedback: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// an explicit null is kept as a value, only a missing key is None
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl GradeResult {
    pub fn new<G: Into<Value>, F: Into<Value>>(grade: G, feedback: F) -> Self {
        Self {
            grade: Some(grade.into()),
            feedback: Some(feedback.into()),
            extra: Map::new(),
        }
    }

    /// True when the model supplied both `grade` and `feedback`
    pub fn is_complete(&self) -> bool {
        self.grade.is_some() && self.feedback.is_some()
    }

    /// The grade as a number, also accepting numeric strings like "85"
    pub fn score(&self) -> Option<f64> {
        match self.grade.as_ref()? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn feedback_text(&self) -> Option<&str> {
        self.feedback.as_ref()?.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// How a grade result came about
pub enum GradeOutcome {
    /// The model replied with a usable grade object
    Graded,
    /// The model replied with a json object lacking `grade` or `feedback`, relayed as is
    Incomplete,
    /// The model replied, but not with a grade object
    Ungradeable,
    /// The external service could not be reached or refused the request
    ServiceError,
    /// Grading faulted before a reply could be interpreted
    Failed,
}

impl std::fmt::Display for GradeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GradeOutcome::Graded => "graded",
            GradeOutcome::Incomplete => "incomplete",
            GradeOutcome::Ungradeable => "ungradeable",
            GradeOutcome::ServiceError => "service_error",
            GradeOutcome::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub result: GradeResult,
    pub outcome: GradeOutcome,
}

impl Assessment {
    pub fn new(result: GradeResult, outcome: GradeOutcome) -> Self {
        Self { result, outcome }
    }
}
