//! Access tokens for Vertex AI.
//!
//! A token configured up front is used as is. Otherwise tokens come from application
//! default credentials: the file named by `GOOGLE_APPLICATION_CREDENTIALS`, then the file
//! `gcloud auth application-default login` writes, then the metadata server of the
//! instance the server runs on. Fetched tokens are cached and refetched shortly before
//! they expire.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const METADATA_HOST: &str = "http://metadata.google.internal";

const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
const GCLOUD_CONFIG_ENV: &str = "CLOUDSDK_CONFIG";
const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

// a cached token is refetched once it is this close to expiring
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenSource {
    /// A token supplied in configuration, never refreshed
    Static(String),
    /// A user refresh token exchanged at `token_uri`
    AuthorizedUser {
        token_uri: String,
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
    /// The default service account of the compute instance
    Metadata { host: String },
}

#[derive(Deserialize)]
struct AuthorizedUserFile {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenSource {
    /// Locate application default credentials
    pub fn application_default() -> Result<Self> {
        if let Some(path) = env::var_os(CREDENTIALS_ENV) {
            return Self::from_file(Path::new(&path));
        }

        match well_known_file() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(TokenSource::Metadata {
                host: METADATA_HOST.to_string(),
            }),
        }
    }

    /// Read a credentials file, only `authorized_user` files can be used
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read credentials file {}: {}", path.display(), e))?;
        let value: Value = serde_json::from_str(&contents)
            .map_err(|e| anyhow!("Invalid credentials file {}: {}", path.display(), e))?;

        match value.get("type").and_then(|v| v.as_str()) {
            Some("authorized_user") => {
                let file: AuthorizedUserFile = serde_json::from_value(value)
                    .map_err(|e| anyhow!("Invalid credentials file {}: {}", path.display(), e))?;
                Ok(TokenSource::AuthorizedUser {
                    token_uri: file.token_uri.unwrap_or_else(|| TOKEN_URI.to_string()),
                    client_id: file.client_id,
                    client_secret: file.client_secret,
                    refresh_token: file.refresh_token,
                })
            }
            Some(other) => Err(anyhow!(
                "Unsupported credentials type {:?} in {}, use an authorized_user file, \
                 the metadata server or a configured access token",
                other,
                path.display()
            )),
            None => Err(anyhow!(
                "Credentials file {} does not name its type",
                path.display()
            )),
        }
    }
}

fn well_known_file() -> Option<PathBuf> {
    if let Some(dir) = env::var_os(GCLOUD_CONFIG_ENV) {
        return Some(PathBuf::from(dir).join(WELL_KNOWN_FILE));
    }
    if cfg!(windows) {
        env::var_os("APPDATA").map(|dir| PathBuf::from(dir).join("gcloud").join(WELL_KNOWN_FILE))
    } else {
        dirs::home_dir().map(|home| home.join(".config").join("gcloud").join(WELL_KNOWN_FILE))
    }
}

struct CachedToken {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > now,
            None => true,
        }
    }
}

/// Hands out a valid access token, fetching a new one when the cached one runs out
pub struct AccessTokens {
    client: Client,
    source: TokenSource,
    cached: Mutex<Option<CachedToken>>,
}

impl AccessTokens {
    pub fn new(client: Client, source: TokenSource) -> Self {
        Self {
            client,
            source,
            cached: Mutex::new(None),
        }
    }

    pub async fn token(&self) -> Result<String> {
        if let TokenSource::Static(token) = &self.source {
            return Ok(token.clone());
        }

        // held across the fetch so concurrent requests share one refresh
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh(Utc::now())) {
            return Ok(token.access_token.clone());
        }

        let token = self.fetch().await?;
        tracing::debug!(expires_at = ?token.expires_at, "fetched vertex access token");
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn fetch(&self) -> Result<CachedToken> {
        let request = match &self.source {
            TokenSource::Static(token) => {
                return Ok(CachedToken {
                    access_token: token.clone(),
                    expires_at: None,
                })
            }
            TokenSource::AuthorizedUser {
                token_uri,
                client_id,
                client_secret,
                refresh_token,
            } => self.client.post(token_uri).form(&[
                ("grant_type", "refresh_token"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
            ]),
            TokenSource::Metadata { host } => self
                .client
                .get(format!(
                    "{}/computeMetadata/v1/instance/service-accounts/default/token",
                    host.trim_end_matches('/')
                ))
                .header("Metadata-Flavor", "Google"),
        };

        let response = request
            .send()
            .await
            .map_err(|e| anyhow!("Failed to fetch access token: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Failed to fetch access token: {}\nResponse: {}",
                status,
                body
            ));
        }

        let token: TokenResponse = response.json().await?;
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: token
                .expires_in
                .map(|seconds| Utc::now() + Duration::seconds(seconds)),
        })
    }
}
