use std::error::Error as StdError;
use thiserror::Error;

/// Failure reaching or processing the external generative service
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Error generating response: {0}")]
pub struct ServiceError(pub String);

impl ServiceError {
    pub fn cause(&self) -> &str {
        &self.0
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        ServiceError(format!("{:#}", err))
    }
}

/// A fault while grading that is not a service failure
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum GradingError {
    #[error(transparent)]
    Prompt(#[from] tera::Error),

    #[error("{0}")]
    Panicked(String),
}

impl GradingError {
    /// Feedback shown in place of a grade
    pub fn feedback(&self) -> String {
        let mut cause = self.to_string();
        let mut source = StdError::source(self);
        while let Some(err) = source {
            cause.push_str(": ");
            cause.push_str(&err.to_string());
            source = err.source();
        }
        format!("Error during grading: {}", cause)
    }
}
