use super::model::LanguageModel;
use super::models::{EventCategory, EventRecord};
use super::prompt::{build_prompt, ExtractionSettings};
use crate::error::{AppResult, Error};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Turns newsletter text into categorised event records
pub struct EventExtractor {
    model: Arc<dyn LanguageModel>,
    settings: ExtractionSettings,
    output_path: PathBuf,
}

impl EventExtractor {
    /// Create an extractor writing to `output_path`
    pub fn new(
        model: Arc<dyn LanguageModel>,
        settings: ExtractionSettings,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            model,
            settings,
            output_path: output_path.into(),
        }
    }

    /// Where events are written
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Send the (truncated) text to the model and return its raw reply
    pub async fn submit(&self, text: &str) -> AppResult<String> {
        let submitted = text.chars().count().min(self.settings.max_chars);
        info!(
            "Sending {} of {} characters to the model ({} profile)",
            submitted,
            text.chars().count(),
            self.settings.profile
        );

        let prompt = build_prompt(&self.settings, text);
        self.model.generate(&prompt, self.settings.temperature).await
    }

    /// Parse the model reply and apply the profile's category default
    pub fn parse(&self, response: &str) -> AppResult<Vec<EventRecord>> {
        let mut events = parse_events(response)?;

        if self.settings.profile.categorises() {
            for event in &mut events {
                event.category.get_or_insert(EventCategory::Other);
            }
        }

        Ok(events)
    }

    /// Overwrite the output file with `events`
    pub fn persist(&self, events: &[EventRecord]) -> AppResult<()> {
        write_events(&self.output_path, events)?;
        info!(
            "Saved {} events to {}",
            events.len(),
            self.output_path.display()
        );
        Ok(())
    }
}

/// Remove a surrounding markdown code fence, if there is one
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed);
    trimmed.trim()
}

/// Parse a (possibly fenced) JSON array of events.
///
/// On failure the raw response is carried in the error and logged at debug level.
pub fn parse_events(response: &str) -> AppResult<Vec<EventRecord>> {
    let json = strip_code_fence(response);

    let events: Vec<EventRecord> = serde_json::from_str(json).map_err(|source| {
        error!("Failed to parse model response as JSON: {}", source);
        debug!("Raw model response: {}", response);
        Error::MalformedResponse {
            raw: response.to_string(),
            source,
        }
    })?;

    for event in &events {
        if let Some(date) = event.date.as_deref() {
            if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                warn!(
                    "Event '{}' has a non-ISO date: {}",
                    event.title.as_deref().unwrap_or("untitled"),
                    date
                );
            }
        }
    }

    Ok(events)
}

/// Write `events` as a JSON array indented with four spaces.
/// Non-ASCII characters are written as-is.
pub fn write_events(path: &Path, events: &[EventRecord]) -> AppResult<()> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    events.serialize(&mut serializer)?;

    fs::write(path, buffer)?;
    Ok(())
}
