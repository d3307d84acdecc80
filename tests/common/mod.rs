#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use newsletter_events::components::event_extractor::LanguageModel;
use newsletter_events::components::gmail::{
    AuthorizationFlow, CredentialProvider, MailService, TokenResponse,
};
use newsletter_events::error::{model_error, transport_error, AppResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const SENDER: &str = "news@example.org";

/// A two-part newsletter with plain text and HTML bodies
pub fn newsletter(plain: &str, html: &str) -> String {
    format!(
        "From: {SENDER}\r\n\
Subject: This week\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"sep\"\r\n\
\r\n\
--sep\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
{plain}\r\n\
--sep\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
{html}\r\n\
--sep--\r\n"
    )
}

/// A newsletter with only an HTML body
pub fn html_newsletter(html: &str) -> String {
    format!(
        "From: {SENDER}\r\n\
Subject: This week\r\n\
MIME-Version: 1.0\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
{html}\r\n"
    )
}

/// Encode a message the way Gmail returns `format=raw`
pub fn encode_raw(message: &str) -> String {
    URL_SAFE_NO_PAD.encode(message)
}

/// In-memory mailbox; the newest message is the first one stored
#[derive(Default)]
pub struct FakeMailbox {
    messages: Vec<(String, String, String)>,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
}

impl FakeMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, id: &str, sender: &str, message: &str) -> Self {
        self.messages
            .push((id.to_string(), sender.to_string(), encode_raw(message)));
        self
    }

    pub fn with_raw(mut self, id: &str, sender: &str, raw: &str) -> Self {
        self.messages
            .push((id.to_string(), sender.to_string(), raw.to_string()));
        self
    }
}

#[async_trait]
impl MailService for FakeMailbox {
    async fn latest_message_id(&self, sender: &str) -> AppResult<Option<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .messages
            .iter()
            .find(|(_, from, _)| from == sender)
            .map(|(id, _, _)| id.clone()))
    }

    async fn raw_message(&self, id: &str) -> AppResult<String> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.messages
            .iter()
            .find(|(message_id, _, _)| message_id == id)
            .map(|(_, _, raw)| raw.clone())
            .ok_or_else(|| transport_error(&format!("HTTP 404 - message {} not found", id)))
    }
}

/// Language model that returns a canned reply and records its prompts
pub struct FakeModel {
    reply: Option<String>,
    pub prompts: Mutex<Vec<(String, Option<f64>)>>,
}

impl FakeModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A model whose every request fails
    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<(String, Option<f64>)> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn generate(&self, prompt: &str, temperature: Option<f64>) -> AppResult<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), temperature));
        self.reply
            .clone()
            .ok_or_else(|| model_error("connection reset"))
    }
}

/// Authorization server stand-in that counts calls
#[derive(Default)]
pub struct FakeFlow {
    pub authorize_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub refresh_returns_new_refresh_token: bool,
}

impl FakeFlow {
    pub fn authorizations(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationFlow for FakeFlow {
    async fn authorize(&self) -> AppResult<TokenResponse> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        Ok(TokenResponse {
            access_token: "authorized-token".to_string(),
            expires_in: Some(3600),
            refresh_token: Some("authorized-refresh".to_string()),
            scope: Some("https://www.googleapis.com/auth/gmail.readonly".to_string()),
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> AppResult<TokenResponse> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        Ok(TokenResponse {
            access_token: "refreshed-token".to_string(),
            expires_in: Some(3600),
            refresh_token: self
                .refresh_returns_new_refresh_token
                .then(|| "rotated-refresh".to_string()),
            scope: None,
        })
    }
}

/// Credentials that always hand out the same access token
pub struct FixedToken(pub &'static str);

#[async_trait]
impl CredentialProvider for FixedToken {
    async fn access_token(&self) -> AppResult<String> {
        Ok(self.0.to_string())
    }
}

/// A request seen by [`FakeGmailServer`]
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub url: String,
    pub authorization: Option<String>,
}

/// Loopback HTTP server answering with canned `(status, body)` pairs in order
pub struct FakeGmailServer {
    pub base_url: String,
    handle: std::thread::JoinHandle<Vec<SeenRequest>>,
}

impl FakeGmailServer {
    pub fn start(responses: Vec<(u16, &str)>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let responses: Vec<(u16, String)> = responses
            .into_iter()
            .map(|(status, body)| (status, body.to_string()))
            .collect();

        let handle = std::thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let request = server.recv().unwrap();
                seen.push(SeenRequest {
                    url: request.url().to_string(),
                    authorization: request
                        .headers()
                        .iter()
                        .find(|header| header.field.equiv("Authorization"))
                        .map(|header| header.value.as_str().to_string()),
                });
                let content_type =
                    tiny_http::Header::from_bytes("Content-Type", "application/json").unwrap();
                request
                    .respond(
                        tiny_http::Response::from_string(body)
                            .with_status_code(status)
                            .with_header(content_type),
                    )
                    .unwrap();
            }
            seen
        });

        Self {
            base_url: format!("http://{}/gmail/v1/users/me", addr),
            handle,
        }
    }

    /// Wait for every canned response to be served and return the requests
    pub fn finish(self) -> Vec<SeenRequest> {
        self.handle.join().unwrap()
    }
}
