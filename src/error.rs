use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(newsletter::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(newsletter::config))]
    Config(String),

    #[error("Authorization error: {0}")]
    #[diagnostic(
        code(newsletter::auth),
        help("Delete the stored token file and run `get_gmail_token` to authorize again")
    )]
    Auth(String),

    #[error("Gmail API error: {0}")]
    #[diagnostic(code(newsletter::transport))]
    Transport(String),

    #[error("Language model error: {0}")]
    #[diagnostic(code(newsletter::model))]
    Model(String),

    #[error("Model response is not a valid JSON array: {source}")]
    #[diagnostic(
        code(newsletter::malformed_response),
        help("The raw model response is kept in this error and logged for inspection")
    )]
    MalformedResponse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(newsletter::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(newsletter::serialization))]
    Serialization(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create authorization errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create Gmail transport errors
pub fn transport_error(message: &str) -> Error {
    Error::Transport(message.to_string())
}

/// Helper to create language model errors
pub fn model_error(message: &str) -> Error {
    Error::Model(message.to_string())
}
