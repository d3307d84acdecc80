use super::models::{StoredCredentials, TokenResponse};
use super::token::TokenStore;
use crate::error::{auth_error, config_error, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

/// Read-only access to the mailbox
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// OAuth client registration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// Layout of a client secrets file downloaded from the Google console
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Client secrets for Google's standard endpoints
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            auth_uri: default_auth_uri(),
            token_uri: default_token_uri(),
        }
    }

    /// Parse a client secrets file (`installed` or `web` application)
    pub fn from_json(json: &str) -> AppResult<Self> {
        let file: ClientSecretsFile = serde_json::from_str(json)?;
        file.installed
            .or(file.web)
            .ok_or_else(|| config_error("Client secrets file has no 'installed' or 'web' section"))
    }

    /// Use the secrets file if it exists, otherwise the given client ID and secret
    pub fn resolve(
        path: &Path,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> AppResult<Self> {
        if path.exists() {
            info!("Reading client secrets from {}", path.display());
            return Self::from_json(&fs::read_to_string(path)?);
        }

        match (client_id, client_secret) {
            (Some(id), Some(secret)) => Ok(Self::new(id, secret)),
            _ => Err(config_error(&format!(
                "No client secrets: create {} or set GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET",
                path.display()
            ))),
        }
    }
}

/// Obtains tokens from the authorization server
#[async_trait]
pub trait AuthorizationFlow: Send + Sync {
    /// Ask the user to grant access and return fresh tokens
    async fn authorize(&self) -> AppResult<TokenResponse>;

    /// Exchange a refresh token for a new access token
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenResponse>;
}

/// Installed-app flow: consent in the browser, redirect to a loopback listener
pub struct GoogleOAuthFlow {
    secrets: ClientSecrets,
    scopes: Vec<String>,
    client: Client,
}

impl GoogleOAuthFlow {
    pub fn new(secrets: ClientSecrets, scopes: &[&str]) -> Self {
        Self {
            secrets,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            client: Client::new(),
        }
    }

    /// Consent page URL for the given redirect and state
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> AppResult<Url> {
        Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", self.scopes.join(" ").as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| config_error(&format!("Invalid authorization URI: {}", e)))
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> AppResult<TokenResponse> {
        let response = self
            .client
            .post(&self.secrets.token_uri)
            .form(params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Token request failed: HTTP {} - {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))
    }
}

#[async_trait]
impl AuthorizationFlow for GoogleOAuthFlow {
    async fn authorize(&self) -> AppResult<TokenResponse> {
        let server = tiny_http::Server::http("127.0.0.1:0")
            .map_err(|e| auth_error(&format!("Failed to start callback listener: {}", e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| auth_error("Callback listener has no TCP address"))?;

        let redirect_uri = format!("http://127.0.0.1:{}/", port);
        let state = Uuid::new_v4().to_string();
        let auth_url = self.authorization_url(&redirect_uri, &state)?;

        info!("Opening browser for Gmail authorization...");
        if let Err(e) = webbrowser::open(auth_url.as_str()) {
            warn!("Could not open a browser: {}", e);
        }
        println!("If the browser did not open, visit this URL:\n{}", auth_url);

        info!("Waiting for authorization callback on port {}...", port);
        let code = tokio::task::spawn_blocking(move || wait_for_code(&server, &state))
            .await
            .map_err(|e| auth_error(&format!("Callback listener failed: {}", e)))??;

        self.request_token(&[
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("code", code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenResponse> {
        self.request_token(&[
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }
}

/// Block until the redirect carrying the authorization code arrives
fn wait_for_code(server: &tiny_http::Server, expected_state: &str) -> AppResult<String> {
    loop {
        let request = server.recv()?;
        let params = callback_params(request.url());

        if let Some(error) = params.get("error") {
            reply(
                request,
                tiny_http::Response::from_string("Authorization was denied.").with_status_code(400),
            );
            return Err(auth_error(&format!("Authorization denied: {}", error)));
        }

        let Some(code) = params.get("code") else {
            // Browsers also ask for things like /favicon.ico
            reply(request, tiny_http::Response::empty(404));
            continue;
        };

        if params.get("state").map(String::as_str) != Some(expected_state) {
            reply(
                request,
                tiny_http::Response::from_string("State mismatch.").with_status_code(400),
            );
            return Err(auth_error("Authorization callback state does not match"));
        }

        let code = code.clone();
        reply(
            request,
            tiny_http::Response::from_string("Authorization successful! You can close this window."),
        );
        return Ok(code);
    }
}

/// Answer the browser; a failed reply does not affect the authorization
fn reply<R: std::io::Read>(request: tiny_http::Request, response: tiny_http::Response<R>) {
    let path = request.url().to_string();
    if let Err(e) = request.respond(response) {
        warn!("Failed to answer callback request {}: {}", path, e);
    }
}

/// Query parameters of a callback request path such as `/?code=..&state=..`
fn callback_params(path: &str) -> HashMap<String, String> {
    Url::parse(&format!("http://localhost{}", path))
        .map(|url| url.query_pairs().into_owned().collect())
        .unwrap_or_default()
}

/// Supplies a valid access token, refreshing or prompting as needed
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> AppResult<String>;
}

/// Credentials kept in a [`TokenStore`] and renewed through an [`AuthorizationFlow`]
pub struct StoredCredentialProvider {
    store: TokenStore,
    flow: Arc<dyn AuthorizationFlow>,
    current: Mutex<Option<StoredCredentials>>,
}

impl StoredCredentialProvider {
    pub fn new(store: TokenStore, flow: Arc<dyn AuthorizationFlow>) -> Self {
        Self {
            store,
            flow,
            current: Mutex::new(None),
        }
    }

    async fn renew(&self, stored: Option<StoredCredentials>) -> AppResult<StoredCredentials> {
        let now = Utc::now();

        match stored {
            Some(creds) if creds.is_valid_at(now) => Ok(creds),
            Some(creds) if creds.can_refresh() => {
                info!("Access token expired, refreshing");
                let refresh_token = creds.refresh_token.clone().unwrap_or_default();
                let response = self.flow.refresh(&refresh_token).await?;
                let mut renewed =
                    StoredCredentials::from_token_response(response, Some(refresh_token), now);
                if renewed.scopes.is_empty() {
                    renewed.scopes = creds.scopes;
                }
                self.store.save(&renewed)?;
                Ok(renewed)
            }
            _ => {
                info!("No usable credentials, starting authorization");
                let response = self.flow.authorize().await?;
                let renewed = StoredCredentials::from_token_response(response, None, now);
                self.store.save(&renewed)?;
                info!("Credentials saved to {}", self.store.path().display());
                Ok(renewed)
            }
        }
    }
}

#[async_trait]
impl CredentialProvider for StoredCredentialProvider {
    async fn access_token(&self) -> AppResult<String> {
        let mut current = self.current.lock().await;

        let stored = match current.take() {
            Some(creds) => Some(creds),
            None => self.store.load()?,
        };

        let creds = self.renew(stored).await?;
        let token = creds.token.clone();
        *current = Some(creds);
        Ok(token)
    }
}
