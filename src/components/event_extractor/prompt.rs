use super::models::EventCategory;
use crate::error::{config_error, Error};
use crate::utils::text::truncate_chars;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

const MINIMAL_TEMPLATE: &str = "Extrae los eventos del siguiente texto de un newsletter.

Para cada evento extrae: titulo, fecha (YYYY-MM-DD), hora, lugar y link.
Devuelve ÚNICAMENTE un array JSON válido con objetos que tengan estas claves exactas.
Texto: {text}";

const EXTENDED_TEMPLATE: &str = "Eres un analista de datos académicos. Tu tarea es extraer los eventos del siguiente texto de un newsletter.

Para cada evento extrae: titulo, fecha (YYYY-MM-DD), hora, lugar, link, y asigna una categoria.

Las categorías permitidas son ÚNICAMENTE:
{categories}

Devuelve ÚNICAMENTE un array JSON válido con objetos que tengan estas claves exactas.
Texto: {text}";

/// Which prompt, character cap and generation parameters to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionProfile {
    /// Fields only, default generation parameters
    Minimal,
    /// Fields plus category, slightly higher temperature
    #[default]
    Extended,
}

impl ExtractionProfile {
    /// Characters of newsletter text submitted to the model
    pub fn max_chars(self) -> usize {
        match self {
            ExtractionProfile::Minimal => 10_000,
            ExtractionProfile::Extended => 15_000,
        }
    }

    /// Sampling temperature, `None` keeps the model default
    pub fn temperature(self) -> Option<f64> {
        match self {
            ExtractionProfile::Minimal => None,
            ExtractionProfile::Extended => Some(0.3),
        }
    }

    /// Whether records are assigned a category
    pub fn categorises(self) -> bool {
        matches!(self, ExtractionProfile::Extended)
    }
}

impl FromStr for ExtractionProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minimal" => Ok(ExtractionProfile::Minimal),
            "extended" => Ok(ExtractionProfile::Extended),
            other => Err(config_error(&format!(
                "Unknown extraction profile '{}', expected 'minimal' or 'extended'",
                other
            ))),
        }
    }
}

impl fmt::Display for ExtractionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionProfile::Minimal => write!(f, "minimal"),
            ExtractionProfile::Extended => write!(f, "extended"),
        }
    }
}

/// Resolved extraction parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionSettings {
    pub profile: ExtractionProfile,
    pub max_chars: usize,
    pub temperature: Option<f64>,
}

impl ExtractionSettings {
    /// Settings with the profile's own cap and temperature
    pub fn for_profile(profile: ExtractionProfile) -> Self {
        Self {
            profile,
            max_chars: profile.max_chars(),
            temperature: profile.temperature(),
        }
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self::for_profile(ExtractionProfile::default())
    }
}

fn category_list() -> String {
    EventCategory::ALL
        .iter()
        .map(|category| format!("- \"{}\": {}", category.label(), category.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the prompt for `text`, keeping only the first `max_chars` characters
pub fn build_prompt(settings: &ExtractionSettings, text: &str) -> String {
    let template = match settings.profile {
        ExtractionProfile::Minimal => MINIMAL_TEMPLATE.to_string(),
        ExtractionProfile::Extended => EXTENDED_TEMPLATE.replace("{categories}", &category_list()),
    };

    // The text goes in last so nothing in it is treated as a placeholder
    template.replace("{text}", truncate_chars(text, settings.max_chars))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults() {
        assert_eq!(ExtractionProfile::Minimal.max_chars(), 10_000);
        assert_eq!(ExtractionProfile::Extended.max_chars(), 15_000);
        assert_eq!(ExtractionProfile::Minimal.temperature(), None);
        assert_eq!(ExtractionProfile::Extended.temperature(), Some(0.3));
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!("Minimal".parse::<ExtractionProfile>().unwrap(), ExtractionProfile::Minimal);
        assert_eq!(" extended".parse::<ExtractionProfile>().unwrap(), ExtractionProfile::Extended);
        assert!("full".parse::<ExtractionProfile>().is_err());
    }

    #[test]
    fn test_prompt_is_truncated_to_cap() {
        let settings = ExtractionSettings {
            profile: ExtractionProfile::Minimal,
            max_chars: 50,
            temperature: None,
        };
        let kept = "x".repeat(50);
        let text = format!("{}TAIL_THAT_MUST_NOT_APPEAR", kept);

        let prompt = build_prompt(&settings, &text);

        assert!(prompt.ends_with(&format!("Texto: {}", kept)));
        assert!(!prompt.contains("TAIL"));
    }

    #[test]
    fn test_extended_prompt_lists_categories() {
        let prompt = build_prompt(&ExtractionSettings::default(), "Career fair on Monday");

        for category in EventCategory::ALL {
            assert!(prompt.contains(category.label()), "missing {}", category.label());
        }
        assert!(prompt.contains("categoria"));
        assert!(!prompt.contains("{categories}"));
        assert!(prompt.ends_with("Career fair on Monday"));
    }

    #[test]
    fn test_minimal_prompt_has_no_categories() {
        let settings = ExtractionSettings::for_profile(ExtractionProfile::Minimal);
        let prompt = build_prompt(&settings, "text");
        assert!(!prompt.contains(EventCategory::Career.label()));
    }

    #[test]
    fn test_placeholders_in_text_are_left_alone() {
        let settings = ExtractionSettings::default();
        let prompt = build_prompt(&settings, "literal {text} and {categories}");
        assert!(prompt.ends_with("literal {text} and {categories}"));
    }
}
