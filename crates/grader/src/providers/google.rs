use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Provider, Usage};
use super::configs::{GoogleAuth, GoogleProviderConfig};
use super::google_auth::{AccessTokens, TokenSource};
use super::utils::{gemini_response_to_message, handle_response, messages_to_gemini_contents};
use crate::models::message::Message;

pub const GOOGLE_HOST: &str = "https://generativelanguage.googleapis.com";
pub const GOOGLE_MODEL: &str = "gemini-2.5-flash";
pub const VERTEX_LOCATION: &str = "us-central1";

/// Regional Vertex AI endpoint for a location
pub fn vertex_host(location: &str) -> String {
    format!("https://{}-aiplatform.googleapis.com", location)
}

fn source_kind(source: &TokenSource) -> &'static str {
    match source {
        TokenSource::Static(_) => "access_token",
        TokenSource::AuthorizedUser { .. } => "authorized_user",
        TokenSource::Metadata { .. } => "metadata",
    }
}

enum Credentials {
    ApiKey(String),
    Bearer(AccessTokens),
}

pub struct GoogleProvider {
    client: Client,
    config: GoogleProviderConfig,
    credentials: Credentials,
}

impl GoogleProvider {
    pub fn new(config: GoogleProviderConfig) -> Result<Self> {
        let source = match &config.auth {
            GoogleAuth::ApiKey(_) => None,
            GoogleAuth::Vertex {
                access_token: Some(token),
                ..
            } => Some(TokenSource::Static(token.clone())),
            GoogleAuth::Vertex {
                access_token: None, ..
            } => Some(TokenSource::application_default()?),
        };
        Self::build(config, source)
    }

    /// Vertex provider drawing tokens from `source` instead of the configured credentials
    pub fn with_token_source(config: GoogleProviderConfig, source: TokenSource) -> Result<Self> {
        Self::build(config, Some(source))
    }

    fn build(config: GoogleProviderConfig, source: Option<TokenSource>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        let credentials = match (&config.auth, source) {
            (GoogleAuth::ApiKey(key), _) => Credentials::ApiKey(key.clone()),
            (GoogleAuth::Vertex { .. }, Some(source)) => {
                tracing::info!(source = source_kind(&source), "using vertex credentials");
                Credentials::Bearer(AccessTokens::new(client.clone(), source))
            }
            (GoogleAuth::Vertex { .. }, None) => return Err(anyhow!("No credentials for vertex")),
        };

        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    fn url(&self) -> String {
        let host = self.config.host.trim_end_matches('/');
        match &self.config.auth {
            GoogleAuth::ApiKey(_) => format!(
                "{}/v1beta/models/{}:generateContent",
                host, self.config.model
            ),
            GoogleAuth::Vertex {
                project, location, ..
            } => format!(
                "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
                host, project, location, self.config.model
            ),
        }
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match &self.credentials {
            Credentials::ApiKey(key) => Ok(request.header("x-goog-api-key", key)),
            Credentials::Bearer(tokens) => Ok(request.bearer_auth(tokens.token().await?)),
        }
    }

    fn get_usage(data: &Value) -> Usage {
        let usage = &data["usageMetadata"];

        let input_tokens = usage
            .get("promptTokenCount")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let output_tokens = usage
            .get("candidatesTokenCount")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let total_tokens = usage
            .get("totalTokenCount")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    fn payload(&self, system: &str, messages: &[Message]) -> Value {
        let mut payload = json!({
            "systemInstruction": {
                "parts": [{ "text": system }]
            },
            "contents": messages_to_gemini_contents(messages),
        });

        let mut generation_config = serde_json::Map::new();
        if let Some(temp) = self.config.temperature {
            generation_config.insert("temperature".to_string(), json!(temp));
        }
        if let Some(tokens) = self.config.max_tokens {
            generation_config.insert("maxOutputTokens".to_string(), json!(tokens));
        }
        if !generation_config.is_empty() {
            payload["generationConfig"] = Value::Object(generation_config);
        }

        payload
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let response = self
            .authorize(self.client.post(self.url()))
            .await?
            .json(&payload)
            .send()
            .await?;

        handle_response(response).await
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    async fn complete(&self, system: &str, messages: &[Message]) -> Result<(Message, Usage)> {
        let payload = self.payload(system, messages);

        tracing::debug!(model = %self.config.model, turns = messages.len(), "sending request to google");
        let response = self.post(payload).await?;

        let message = gemini_response_to_message(&response)?;
        let usage = Self::get_usage(&response);

        Ok((message, usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_key_config(host: String) -> GoogleProviderConfig {
        GoogleProviderConfig {
            host,
            auth: GoogleAuth::ApiKey("test-key".to_string()),
            model: GOOGLE_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    fn reply(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": text }]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 40,
                "candidatesTokenCount": 12,
                "totalTokenCount": 52
            }
        })
    }

    #[tokio::test]
    async fn test_complete_basic() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(
                "{\"grade\": 80, \"feedback\": \"Works but lacks docstring.\"}",
            )))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = GoogleProvider::new(api_key_config(mock_server.uri()))?;
        let (message, usage) = provider
            .complete("You are a grader.", &[Message::user("Grade this")])
            .await?;

        assert_eq!(
            message.text,
            "{\"grade\": 80, \"feedback\": \"Works but lacks docstring.\"}"
        );
        assert_eq!(usage, Usage::new(Some(40), Some(12), Some(52)));
        Ok(())
    }

    #[tokio::test]
    async fn test_request_body() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "systemInstruction": {"parts": [{"text": "You are a grader."}]},
                "contents": [
                    {"role": "user", "parts": [{"text": "first"}]},
                    {"role": "model", "parts": [{"text": "second"}]},
                    {"role": "user", "parts": [{"text": "third"}]}
                ],
                "generationConfig": {"temperature": 0.5, "maxOutputTokens": 256}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("ok")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut config = api_key_config(mock_server.uri());
        config.temperature = Some(0.5);
        config.max_tokens = Some(256);
        let provider = GoogleProvider::new(config)?;

        let messages = vec![
            Message::user("first"),
            Message::model("second"),
            Message::user("third"),
        ];
        let (message, _) = provider.complete("You are a grader.", &messages).await?;
        assert_eq!(message.text, "ok");
        Ok(())
    }

    #[tokio::test]
    async fn test_vertex_endpoint() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/v1/projects/python-testing-agent/locations/us-central1/publishers/google/models/gemini-2.5-flash:generateContent",
            ))
            .and(header("Authorization", "Bearer ya29.token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("hello")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = GoogleProviderConfig {
            host: mock_server.uri(),
            auth: GoogleAuth::Vertex {
                project: "python-testing-agent".to_string(),
                location: VERTEX_LOCATION.to_string(),
                access_token: Some("ya29.token".to_string()),
            },
            model: GOOGLE_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        };
        let provider = GoogleProvider::new(config)?;
        let (message, _) = provider.complete("system", &[Message::user("hi")]).await?;

        assert_eq!(message.text, "hello");
        Ok(())
    }

    #[tokio::test]
    async fn test_vertex_with_refreshed_token() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/computeMetadata/v1/instance/service-accounts/default/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.instance",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(header("Authorization", "Bearer ya29.instance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("graded")))
            .expect(2)
            .mount(&mock_server)
            .await;

        let config = GoogleProviderConfig {
            host: mock_server.uri(),
            auth: GoogleAuth::Vertex {
                project: "python-testing-agent".to_string(),
                location: VERTEX_LOCATION.to_string(),
                access_token: None,
            },
            model: GOOGLE_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        };
        let source = TokenSource::Metadata {
            host: mock_server.uri(),
        };
        let provider = GoogleProvider::with_token_source(config, source)?;

        for _ in 0..2 {
            let (message, _) = provider.complete("system", &[Message::user("hi")]).await?;
            assert_eq!(message.text, "graded");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_token_failure_is_a_completion_error() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no metadata here"))
            .mount(&mock_server)
            .await;

        let config = GoogleProviderConfig {
            host: mock_server.uri(),
            auth: GoogleAuth::Vertex {
                project: "python-testing-agent".to_string(),
                location: VERTEX_LOCATION.to_string(),
                access_token: None,
            },
            model: GOOGLE_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        };
        let source = TokenSource::Metadata {
            host: mock_server.uri(),
        };
        let provider = GoogleProvider::with_token_source(config, source)?;

        let err = provider
            .complete("system", &[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to fetch access token: 404"));
        Ok(())
    }

    #[tokio::test]
    async fn test_rate_limited() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let provider = GoogleProvider::new(api_key_config(mock_server.uri()))?;
        let err = provider
            .complete("system", &[Message::user("hi")])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Server error: 429"));
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_request_includes_body() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string("API key not valid"),
            )
            .mount(&mock_server)
            .await;

        let provider = GoogleProvider::new(api_key_config(mock_server.uri()))?;
        let err = provider
            .complete("system", &[Message::user("hi")])
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Request failed: 400"));
        assert!(message.contains("API key not valid"));
        Ok(())
    }

    #[test]
    fn test_vertex_host() {
        assert_eq!(
            vertex_host("europe-west4"),
            "https://europe-west4-aiplatform.googleapis.com"
        );
    }
}
