use chrono::Utc;
use newsletter_events::components::gmail::{
    AuthorizationFlow, ClientSecrets, GoogleOAuthFlow, StoredCredentials, TokenStore,
    GMAIL_READONLY_SCOPE,
};
use newsletter_events::config::{DEFAULT_CLIENT_SECRETS_PATH, DEFAULT_TOKEN_PATH};
use newsletter_events::startup;
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Authorize Gmail access once and store the token for later runs
#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    dotenvy::dotenv().ok();
    startup::init_logging()?;

    let token_path = env::var("TOKEN_PATH").unwrap_or_else(|_| DEFAULT_TOKEN_PATH.to_string());
    let secrets_path = env::var("CLIENT_SECRETS_PATH")
        .unwrap_or_else(|_| DEFAULT_CLIENT_SECRETS_PATH.to_string());

    let secrets = ClientSecrets::resolve(
        &PathBuf::from(secrets_path),
        env::var("GOOGLE_CLIENT_ID").ok().as_deref(),
        env::var("GOOGLE_CLIENT_SECRET").ok().as_deref(),
    )?;

    let flow = GoogleOAuthFlow::new(secrets, &[GMAIL_READONLY_SCOPE]);
    let response = flow.authorize().await?;
    let credentials = StoredCredentials::from_token_response(response, None, Utc::now());

    let store = TokenStore::new(token_path);
    store.save(&credentials)?;

    info!("Token successfully saved to {}", store.path().display());
    Ok(())
}
