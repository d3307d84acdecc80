use super::auth::CredentialProvider;
use super::models::{MessageList, RawMessage};
use crate::error::{transport_error, AppResult};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Gmail REST endpoint for the authorized user
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// The parts of a mailbox the fetcher needs
#[async_trait]
pub trait MailService: Send + Sync {
    /// Make sure requests can be authorized before fetching
    async fn authenticate(&self) -> AppResult<()> {
        Ok(())
    }

    /// ID of the newest message from `sender`, if any
    async fn latest_message_id(&self, sender: &str) -> AppResult<Option<String>>;

    /// The whole message as a base64url string
    async fn raw_message(&self, id: &str) -> AppResult<String>;
}

/// Gmail API client
pub struct GmailClient {
    client: Client,
    credentials: Arc<dyn CredentialProvider>,
    base_url: String,
}

impl GmailClient {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::with_base_url(credentials, GMAIL_API_BASE)
    }

    /// Point the client at another API root
    pub fn with_base_url(credentials: Arc<dyn CredentialProvider>, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> AppResult<Url> {
        Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| transport_error(&format!("Failed to parse URL: {}", e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, action: &str) -> AppResult<T> {
        let token = self.credentials.access_token().await?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| transport_error(&format!("Failed to {}: {}", action, e)))?;

        let response = check_status(response, action).await?;
        response
            .json()
            .await
            .map_err(|e| transport_error(&format!("Failed to parse response to {}: {}", action, e)))
    }
}

async fn check_status(response: Response, action: &str) -> AppResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());
    Err(transport_error(&format!(
        "Failed to {}: HTTP {} - {}",
        action, status, error_body
    )))
}

#[async_trait]
impl MailService for GmailClient {
    async fn authenticate(&self) -> AppResult<()> {
        self.credentials.access_token().await.map(|_| ())
    }

    async fn latest_message_id(&self, sender: &str) -> AppResult<Option<String>> {
        let mut url = self.url("messages")?;
        url.query_pairs_mut()
            .append_pair("q", &format!("from:{}", sender))
            .append_pair("maxResults", "1");

        info!("Searching for the latest message from {}", sender);
        let list: MessageList = self.get_json(url, "list messages").await?;

        Ok(list.messages.into_iter().next().map(|message| message.id))
    }

    async fn raw_message(&self, id: &str) -> AppResult<String> {
        let mut url = self.url(&format!("messages/{}", id))?;
        url.query_pairs_mut().append_pair("format", "raw");

        debug!("Fetching raw message {}", id);
        let message: RawMessage = self.get_json(url, "fetch message").await?;
        Ok(message.raw)
    }
}
