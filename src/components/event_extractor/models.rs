use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Closed set of labels an event can be filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventCategory {
    Career,
    Academic,
    Skills,
    Social,
    #[default]
    Other,
}

impl EventCategory {
    /// Every category, in prompt order
    pub const ALL: [EventCategory; 5] = [
        EventCategory::Career,
        EventCategory::Academic,
        EventCategory::Skills,
        EventCategory::Social,
        EventCategory::Other,
    ];

    /// Label used in the prompt and in the output file
    pub fn label(self) -> &'static str {
        match self {
            EventCategory::Career => "Carrera",
            EventCategory::Academic => "Academico",
            EventCategory::Skills => "Skills",
            EventCategory::Social => "Social",
            EventCategory::Other => "Otro",
        }
    }

    /// Definition given to the model
    pub fn description(self) -> &'static str {
        match self {
            EventCategory::Career => "Empleo, CV, entrevistas, eventos de carrera con alumni.",
            EventCategory::Academic => {
                "Charlas, seminarios, conferencias, presentaciones de libros."
            }
            EventCategory::Skills => "Talleres de habilidades, programación, métodos, escritura.",
            EventCategory::Social => "Town halls, cafés, networking, bienestar.",
            EventCategory::Other => "Cualquier evento que no encaje claramente en las anteriores.",
        }
    }

    /// Map a label to a category. Labels are matched case-insensitively,
    /// with or without accents, in Spanish or English. Anything else is
    /// filed under `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "carrera" | "career" => EventCategory::Career,
            "academico" | "académico" | "academic" => EventCategory::Academic,
            "skills" => EventCategory::Skills,
            "social" => EventCategory::Social,
            _ => EventCategory::Other,
        }
    }
}

impl Serialize for EventCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for EventCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(label) => Ok(EventCategory::from_label(&label)),
            _ => Ok(EventCategory::Other),
        }
    }
}

/// One event extracted from the newsletter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "titulo", alias = "title", default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    /// ISO calendar date (YYYY-MM-DD)
    #[serde(rename = "fecha", alias = "date", default, deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(rename = "hora", alias = "time", default, deserialize_with = "lenient_text")]
    pub time: Option<String>,
    #[serde(rename = "lugar", alias = "location", default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub link: Option<String>,
    #[serde(
        rename = "categoria",
        alias = "category",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<EventCategory>,
}

/// Accept any JSON value as text; null stays absent, objects and arrays
/// are kept as their JSON text
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Ok(Some(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_label() {
        assert_eq!(EventCategory::from_label("Carrera"), EventCategory::Career);
        assert_eq!(EventCategory::from_label("Académico"), EventCategory::Academic);
        assert_eq!(EventCategory::from_label("academic"), EventCategory::Academic);
        assert_eq!(EventCategory::from_label(" SKILLS "), EventCategory::Skills);
        assert_eq!(EventCategory::from_label("Otro"), EventCategory::Other);
        assert_eq!(EventCategory::from_label("Sports"), EventCategory::Other);
    }

    #[test]
    fn test_record_uses_prompt_keys() {
        let json = r#"{"titulo":"Talk","fecha":"2025-03-01","hora":"14:00","lugar":"Room 1","link":"http://x","categoria":"Academico"}"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.title.as_deref(), Some("Talk"));
        assert_eq!(record.category, Some(EventCategory::Academic));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, serde_json::from_str::<Value>(json).unwrap());
    }

    #[test]
    fn test_record_accepts_english_keys_and_numbers() {
        let json = r#"{"title":"Fair","date":"2025-04-02","time":1400,"location":null,"category":"Career"}"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.title.as_deref(), Some("Fair"));
        assert_eq!(record.time.as_deref(), Some("1400"));
        assert_eq!(record.location, None);
        assert_eq!(record.link, None);
        assert_eq!(record.category, Some(EventCategory::Career));
    }

    #[test]
    fn test_record_keeps_structured_values_and_odd_categories() {
        let json = r#"[
            {"titulo":"Talk","hora":{"inicio":"14:00","fin":"15:00"},"lugar":["A","B"],"categoria":["Social","Skills"]},
            {"titulo":"Fair","link":true,"categoria":3}
        ]"#;
        let records: Vec<EventRecord> = serde_json::from_str(json).unwrap();

        assert_eq!(records.len(), 2);
        let time: Value = serde_json::from_str(records[0].time.as_deref().unwrap()).unwrap();
        assert_eq!(time["inicio"], "14:00");
        assert_eq!(time["fin"], "15:00");
        assert_eq!(records[0].location.as_deref(), Some(r#"["A","B"]"#));
        assert_eq!(records[0].category, Some(EventCategory::Other));
        assert_eq!(records[1].link.as_deref(), Some("true"));
        assert_eq!(records[1].category, Some(EventCategory::Other));
    }

    #[test]
    fn test_missing_category_is_not_serialized() {
        let record: EventRecord = serde_json::from_str(r#"{"titulo":"Talk"}"#).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("categoria").is_none());
        assert_eq!(value.get("fecha"), Some(&Value::Null));
    }
}
