/// Unified enum to wrap different provider configurations
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Google(GoogleProviderConfig),
    OpenAi(OpenAiProviderConfig),
}

impl ProviderConfig {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderConfig::Google(_) => "google",
            ProviderConfig::OpenAi(_) => "openai",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::Google(config) => &config.model,
            ProviderConfig::OpenAi(config) => &config.model,
        }
    }
}

#[derive(Debug, Clone)]
pub enum GoogleAuth {
    /// Gemini developer api, authenticated with an api key
    ApiKey(String),
    /// Vertex AI, authenticated with oauth access tokens for the project. Without a
    /// fixed `access_token` tokens come from application default credentials.
    Vertex {
        project: String,
        location: String,
        access_token: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct GoogleProviderConfig {
    pub host: String,
    pub auth: GoogleAuth,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}
