pub mod conversation;
pub mod errors;
pub mod grading;
pub mod models;
pub mod prompt_template;
pub mod providers;
