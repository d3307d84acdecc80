use crate::components::event_extractor::{ExtractionProfile, ExtractionSettings};
use crate::error::{config_error, env_error, AppResult};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default Gemini model used for classification
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
/// Default location of the persisted OAuth credentials
pub const DEFAULT_TOKEN_PATH: &str = "token.json";
/// Default location of the Google "installed app" client secrets
pub const DEFAULT_CLIENT_SECRETS_PATH: &str = "credentials.json";
/// Default location of the extracted events
pub const DEFAULT_OUTPUT_PATH: &str = "events.json";
/// Optional settings file, overridden by the environment
pub const SETTINGS_FILE: &str = "config/settings.toml";

/// Main configuration structure for a run
#[derive(Clone)]
pub struct Config {
    /// Address whose newest message is processed
    pub sender: String,
    /// Gemini API key
    pub gemini_api_key: String,
    /// Gemini model name
    pub gemini_model: String,
    /// Prompt profile
    pub profile: ExtractionProfile,
    /// Overrides the profile's character cap
    pub max_chars: Option<usize>,
    /// Overrides the profile's temperature
    pub temperature: Option<f64>,
    /// Where OAuth credentials are persisted
    pub token_path: PathBuf,
    /// Google client secrets file
    pub client_secrets_path: PathBuf,
    /// Where extracted events are written
    pub output_path: PathBuf,
    /// OAuth client ID, used when no client secrets file exists
    pub google_client_id: Option<String>,
    /// OAuth client secret, used when no client secrets file exists
    pub google_client_secret: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("sender", &self.sender)
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_model", &self.gemini_model)
            .field("profile", &self.profile)
            .field("max_chars", &self.max_chars)
            .field("temperature", &self.temperature)
            .field("token_path", &self.token_path)
            .field("client_secrets_path", &self.client_secrets_path)
            .field("output_path", &self.output_path)
            .field("google_client_id", &self.google_client_id)
            .finish()
    }
}

/// Contents of `config/settings.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub sender: Option<String>,
    pub gemini_model: Option<String>,
    pub profile: Option<ExtractionProfile>,
    pub max_chars: Option<usize>,
    pub temperature: Option<f64>,
    pub token_path: Option<PathBuf>,
    pub client_secrets_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
}

impl FileSettings {
    /// Read settings from a TOML file, returning defaults if it does not exist
    pub fn read(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings = toml::from_str(&content)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

impl Config {
    /// Load configuration from `.env`, the environment and the settings file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let settings = FileSettings::read(Path::new(SETTINGS_FILE))?;
        Self::from_sources(settings, |key| env::var(key).ok())
    }

    /// Build configuration from file settings and a variable lookup.
    /// Variables take precedence over the file.
    pub fn from_sources<F>(settings: FileSettings, var: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sender = var("NEWSLETTER_SENDER")
            .or(settings.sender)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| env_error("NEWSLETTER_SENDER"))?;

        let gemini_api_key = var("GEMINI_API_KEY")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| env_error("GEMINI_API_KEY"))?;

        let gemini_model = var("GEMINI_MODEL")
            .or(settings.gemini_model)
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        let profile = match var("EXTRACTION_PROFILE") {
            Some(value) => value.parse()?,
            None => settings.profile.unwrap_or_default(),
        };

        let max_chars = match var("EXTRACTION_MAX_CHARS") {
            Some(value) => Some(
                value
                    .parse::<usize>()
                    .map_err(|_| config_error("Invalid EXTRACTION_MAX_CHARS format"))?,
            ),
            None => settings.max_chars,
        };
        if max_chars == Some(0) {
            return Err(config_error("max_chars must be greater than zero"));
        }

        let temperature = match var("GEMINI_TEMPERATURE") {
            Some(value) => Some(
                value
                    .parse::<f64>()
                    .map_err(|_| config_error("Invalid GEMINI_TEMPERATURE format"))?,
            ),
            None => settings.temperature,
        };

        let path_var = |key: &str, file: Option<PathBuf>, default: &str| {
            var(key)
                .map(PathBuf::from)
                .or(file)
                .unwrap_or_else(|| PathBuf::from(default))
        };

        let config = Config {
            sender,
            gemini_api_key,
            gemini_model,
            profile,
            max_chars,
            temperature,
            token_path: path_var("TOKEN_PATH", settings.token_path, DEFAULT_TOKEN_PATH),
            client_secrets_path: path_var(
                "CLIENT_SECRETS_PATH",
                settings.client_secrets_path,
                DEFAULT_CLIENT_SECRETS_PATH,
            ),
            output_path: path_var("OUTPUT_PATH", settings.output_path, DEFAULT_OUTPUT_PATH),
            google_client_id: var("GOOGLE_CLIENT_ID"),
            google_client_secret: var("GOOGLE_CLIENT_SECRET"),
        };

        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    /// Extraction settings with configured overrides applied
    pub fn extraction_settings(&self) -> ExtractionSettings {
        let mut settings = ExtractionSettings::for_profile(self.profile);
        if let Some(max_chars) = self.max_chars {
            settings.max_chars = max_chars;
        }
        if self.temperature.is_some() {
            settings.temperature = self.temperature;
        }
        settings
    }
}
