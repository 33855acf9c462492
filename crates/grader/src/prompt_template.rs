use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tera::{Context, Error as TeraError, Tera};

/// Instruction that makes the model act as a grader and fixes its reply shape
pub const SYSTEM_PROMPT: &str = include_str!("prompts/system.md");

/// Template for a single grading request, rendered with `question` and `code`
pub const GRADE_PROMPT: &str = include_str!("prompts/grade.md");

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

/// Read a prompt or template file from disk
pub fn read_prompt_file(template_file: impl Into<PathBuf>) -> Result<String, TeraError> {
    let template_path = template_file.into();
    fs::read_to_string(&template_path).map_err(|e| {
        TeraError::chain(
            format!("Failed to read template file {}", template_path.display()),
            e,
        )
    })
}
