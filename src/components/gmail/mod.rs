pub mod auth;
pub mod client;
mod fetcher;
pub mod models;
pub mod token;

pub use auth::{
    AuthorizationFlow, ClientSecrets, CredentialProvider, GoogleOAuthFlow,
    StoredCredentialProvider, GMAIL_READONLY_SCOPE,
};
pub use client::{GmailClient, MailService};
pub use fetcher::{decode_raw_message, extract_text, select_body, MailFetcher};
pub use models::{StoredCredentials, TokenResponse};
pub use token::TokenStore;
