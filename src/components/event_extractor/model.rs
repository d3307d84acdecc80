use crate::error::{model_error, AppResult};
use async_trait::async_trait;
use rig::completion::{Chat, Message};
use rig::providers::gemini::Client as GeminiClient;
use std::time::Instant;
use tracing::{debug, info};

/// A generative model that turns a prompt into text
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Submit `prompt`, optionally overriding the sampling temperature
    async fn generate(&self, prompt: &str, temperature: Option<f64>) -> AppResult<String>;
}

/// Google Gemini through rig
pub struct GeminiModel {
    client: GeminiClient,
    model: String,
}

impl GeminiModel {
    /// Create a Gemini model client
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: GeminiClient::new(api_key),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiModel {
    async fn generate(&self, prompt: &str, temperature: Option<f64>) -> AppResult<String> {
        info!("Using Gemini model: {}", self.model);

        let mut builder = self.client.agent(&self.model);
        if let Some(temperature) = temperature {
            builder = builder.temperature(temperature);
        }
        let agent = builder.build();

        let start = Instant::now();
        let response = agent
            .chat(prompt.to_string(), Vec::<Message>::new())
            .await
            .map_err(|e| model_error(&format!("Gemini request failed: {}", e)))?;

        info!(
            "Gemini responded in {:.2} seconds",
            start.elapsed().as_secs_f64()
        );
        debug!("Raw Gemini response: {}", response);

        Ok(response)
    }
}
