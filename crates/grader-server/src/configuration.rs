use crate::error::{to_env_var, ConfigError, ENV_PREFIX};
use config::{Config, Environment};
use grader::providers::{
    configs::{GoogleAuth, GoogleProviderConfig, OpenAiProviderConfig, ProviderConfig},
    google::{self, GOOGLE_HOST, GOOGLE_MODEL, VERTEX_LOCATION},
    openai::{OPENAI_HOST, OPENAI_MODEL},
};
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Search engine ownership check page kept next to the legacy index
pub const SITE_VERIFICATION_FILE: &str = "naver7d3842db79066fa31723b07a3a5ff459.html";

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server address {}:{}: {}", self.host, self.port, e)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum ProviderSettings {
    Google {
        #[serde(default)]
        host: Option<String>,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        project: Option<String>,
        #[serde(default = "default_vertex_location")]
        location: String,
        #[serde(default)]
        access_token: Option<String>,
        #[serde(default = "default_google_model")]
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
    OpenAi {
        #[serde(default = "default_openai_host")]
        host: String,
        api_key: String,
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
}

impl ProviderSettings {
    // Convert to the grader ProviderConfig
    pub fn into_config(self) -> Result<ProviderConfig, ConfigError> {
        match self {
            ProviderSettings::Google {
                host,
                api_key,
                project,
                location,
                access_token,
                model,
                temperature,
                max_tokens,
            } => {
                // a project selects vertex, otherwise the developer api with a key
                let (auth, default_host) = match (project, api_key) {
                    (Some(project), _) => {
                        let host = google::vertex_host(&location);
                        (
                            GoogleAuth::Vertex {
                                project,
                                location,
                                access_token,
                            },
                            host,
                        )
                    }
                    (None, Some(api_key)) => (GoogleAuth::ApiKey(api_key), GOOGLE_HOST.to_string()),
                    (None, None) => return Err(ConfigError::missing("provider.api_key")),
                };

                Ok(ProviderConfig::Google(GoogleProviderConfig {
                    host: host.unwrap_or(default_host),
                    auth,
                    model,
                    temperature,
                    max_tokens,
                }))
            }
            ProviderSettings::OpenAi {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
            } => Ok(ProviderConfig::OpenAi(OpenAiProviderConfig {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
            })),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UiSettings {
    /// Serve the built single page app from `dist_dir` instead of the legacy page
    #[serde(default)]
    pub use_new_ui: bool,
    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,
    #[serde(default = "default_legacy_dir")]
    pub legacy_dir: PathBuf,
    /// Files served from `legacy_dir` at `/<name>` in either ui mode, by default the
    /// site verification page
    #[serde(default = "default_legacy_files")]
    pub legacy_files: Vec<String>,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            use_new_ui: false,
            dist_dir: default_dist_dir(),
            legacy_dir: default_legacy_dir(),
            legacy_files: default_legacy_files(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GradingSettings {
    /// Replaces the built in system instruction
    #[serde(default)]
    pub system_prompt_file: Option<PathBuf>,
    /// Replaces the built in grading prompt template
    #[serde(default)]
    pub prompt_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub ui: UiSettings,
    #[serde(default)]
    pub grading: GradingSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        // PORT and USE_NEW_UI are what hosting platforms and the ui build already set
        let port = env::var("PORT").ok();
        let use_new_ui = env::var("USE_NEW_UI")
            .ok()
            .map(|value| value.eq_ignore_ascii_case("true"));

        let config = Config::builder()
            // Server defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("ui.legacy_files")
                    .try_parsing(true),
            )
            .set_override_option("server.port", port)?
            .set_override_option("ui.use_new_ui", use_new_ui)?
            .build()?;

        // Try to deserialize the configuration
        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        // Handle missing field errors specially
        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    // Extract field name from error message "missing field `type`"
                    let field = error_str
                        .split('`')
                        .nth(1)
                        .unwrap_or_default();
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_google_model() -> String {
    GOOGLE_MODEL.to_string()
}

fn default_vertex_location() -> String {
    VERTEX_LOCATION.to_string()
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}

fn default_openai_model() -> String {
    OPENAI_MODEL.to_string()
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from("ui/dist")
}

fn default_legacy_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_legacy_files() -> Vec<String> {
    vec![SITE_VERIFICATION_FILE.to_string()]
}
