use crate::components::event_extractor::{EventExtractor, GeminiModel};
use crate::components::gmail::{
    ClientSecrets, GmailClient, GoogleOAuthFlow, MailFetcher, StoredCredentialProvider,
    TokenStore, GMAIL_READONLY_SCOPE,
};
use crate::config::Config;
use crate::error::Error;
use crate::pipeline::Pipeline;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,rig=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Config(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// OAuth flow for the configured client
pub fn oauth_flow(config: &Config) -> miette::Result<GoogleOAuthFlow> {
    let secrets = ClientSecrets::resolve(
        &config.client_secrets_path,
        config.google_client_id.as_deref(),
        config.google_client_secret.as_deref(),
    )?;
    Ok(GoogleOAuthFlow::new(secrets, &[GMAIL_READONLY_SCOPE]))
}

/// Wire the Gmail and Gemini clients into a pipeline
pub fn build_pipeline(config: &Config) -> miette::Result<Pipeline> {
    let credentials = StoredCredentialProvider::new(
        TokenStore::new(&config.token_path),
        Arc::new(oauth_flow(config)?),
    );
    let gmail = GmailClient::new(Arc::new(credentials));
    let fetcher = MailFetcher::new(Arc::new(gmail), &config.sender);

    let settings = config.extraction_settings();
    info!(
        "Extraction profile: {} (max {} characters, temperature {:?})",
        settings.profile, settings.max_chars, settings.temperature
    );
    let model = GeminiModel::new(&config.gemini_api_key, &config.gemini_model);
    let extractor = EventExtractor::new(Arc::new(model), settings, &config.output_path);

    Ok(Pipeline::new(fetcher, extractor))
}
