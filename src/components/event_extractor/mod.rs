mod extractor;
pub mod model;
pub mod models;
pub mod prompt;

pub use extractor::{parse_events, strip_code_fence, write_events, EventExtractor};
pub use model::{GeminiModel, LanguageModel};
pub use models::{EventCategory, EventRecord};
pub use prompt::{build_prompt, ExtractionProfile, ExtractionSettings};
