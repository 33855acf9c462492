//! These models represent the objects passed between the grader and the LLM
//!
//! There are a few related formats we need to interact with:
//! - grade requests/results, exchanged with the interface over http
//! - gemini contents, sent from the grader to google
//! - openai messages, sent from the grader to openai compatible hosts
//!
//! We always immediately convert those wire formats into the internal structs using
//! to/from helpers, so the grading logic never sees a provider specific shape.
pub mod grade;
pub mod message;
pub mod role;
