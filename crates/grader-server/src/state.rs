use crate::configuration::GradingSettings;
use anyhow::Result;
use grader::{
    conversation::ConversationClient,
    grading::Grader,
    prompt_template::{read_prompt_file, GRADE_PROMPT, SYSTEM_PROMPT},
    providers::{configs::ProviderConfig, factory},
};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub grader: Arc<Grader>,
}

impl AppState {
    pub fn new(grader: Grader) -> Self {
        Self {
            grader: Arc::new(grader),
        }
    }

    /// Build the provider once and wire it into the grader every request shares
    pub fn from_config(provider_config: ProviderConfig, grading: &GradingSettings) -> Result<Self> {
        let system = match &grading.system_prompt_file {
            Some(path) => read_prompt_file(path)?,
            None => SYSTEM_PROMPT.to_string(),
        };
        let template = match &grading.prompt_file {
            Some(path) => read_prompt_file(path)?,
            None => GRADE_PROMPT.to_string(),
        };

        let provider = factory::get_provider(provider_config)?;
        let client = ConversationClient::new(provider, system);
        Ok(Self::new(Grader::with_template(client, template)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grader::providers::configs::{GoogleAuth, GoogleProviderConfig};
    use std::path::PathBuf;

    fn google_config() -> ProviderConfig {
        ProviderConfig::Google(GoogleProviderConfig {
            host: "http://localhost:1".to_string(),
            auth: GoogleAuth::ApiKey("key".to_string()),
            model: "gemini-2.5-flash".to_string(),
            temperature: None,
            max_tokens: None,
        })
    }

    #[test]
    fn test_defaults_use_builtin_prompts() {
        let state = AppState::from_config(google_config(), &GradingSettings::default()).unwrap();
        assert_eq!(state.grader.client().system(), SYSTEM_PROMPT);
    }

    #[test]
    fn test_system_prompt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system.md");
        std::fs::write(&path, "You grade rust code.").unwrap();

        let grading = GradingSettings {
            system_prompt_file: Some(path),
            prompt_file: None,
        };
        let state = AppState::from_config(google_config(), &grading).unwrap();
        assert_eq!(state.grader.client().system(), "You grade rust code.");
    }

    #[test]
    fn test_missing_prompt_file_is_an_error() {
        let grading = GradingSettings {
            system_prompt_file: None,
            prompt_file: Some(PathBuf::from("/nonexistent/grade.md")),
        };
        assert!(AppState::from_config(google_config(), &grading).is_err());
    }
}
