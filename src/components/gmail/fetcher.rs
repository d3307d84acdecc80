use super::client::MailService;
use crate::error::{transport_error, AppResult};
use crate::utils::text::clean_text;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, Engine, GeneralPurpose, GeneralPurposeConfig};
use mail_parser::{Message, MessageParser, MessagePart, MimeHeaders, PartType};
use std::sync::Arc;
use tracing::{info, warn};

/// base64url that accepts input with or without padding
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Fetches the newest message from one sender and reduces it to text
pub struct MailFetcher {
    mail: Arc<dyn MailService>,
    sender: String,
}

impl MailFetcher {
    pub fn new(mail: Arc<dyn MailService>, sender: &str) -> Self {
        Self {
            mail,
            sender: sender.to_string(),
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub async fn authenticate(&self) -> AppResult<()> {
        self.mail.authenticate().await
    }

    /// Raw bytes of the newest message from the sender, `None` if there is none
    pub async fn fetch_latest_raw(&self) -> AppResult<Option<Vec<u8>>> {
        let Some(id) = self.mail.latest_message_id(&self.sender).await? else {
            info!("No message found from {}", self.sender);
            return Ok(None);
        };

        info!("Downloading message {}", id);
        let raw = self.mail.raw_message(&id).await?;
        decode_raw_message(&raw).map(Some)
    }

    /// Cleaned body of the newest message from the sender
    pub async fn fetch_latest_body(&self) -> AppResult<Option<String>> {
        Ok(self
            .fetch_latest_raw()
            .await?
            .map(|bytes| extract_text(&bytes)))
    }
}

/// Decode a base64url message payload
pub fn decode_raw_message(raw: &str) -> AppResult<Vec<u8>> {
    URL_SAFE_LENIENT
        .decode(raw.trim())
        .map_err(|e| transport_error(&format!("Failed to decode raw message: {}", e)))
}

/// Pick the message body: the first plain text part, otherwise the last
/// HTML part seen. Returns an empty string when there is neither or the
/// message cannot be parsed.
pub fn select_body(message_bytes: &[u8]) -> String {
    let Some(message) = MessageParser::default().parse(message_bytes) else {
        warn!("Message could not be parsed as MIME, treating body as empty");
        return String::new();
    };

    let mut last_html = None;
    match walk_parts(&message, &mut last_html) {
        Some(plain) => plain.to_string(),
        None => last_html.unwrap_or_default().to_string(),
    }
}

/// Cleaned text of a raw message
pub fn extract_text(message_bytes: &[u8]) -> String {
    clean_text(&select_body(message_bytes))
}

/// Depth-first walk returning the first plain text part. HTML parts are
/// remembered in `last_html` and do not stop the walk.
fn walk_parts<'a>(message: &'a Message<'_>, last_html: &mut Option<&'a str>) -> Option<&'a str> {
    for part in &message.parts {
        match &part.body {
            PartType::Text(text) if is_plain_text(part) => return Some(text.as_ref()),
            PartType::Html(html) => *last_html = Some(html.as_ref()),
            PartType::Message(nested) => {
                if let Some(text) = walk_parts(nested, last_html) {
                    return Some(text);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parts without a Content-Type header default to text/plain
fn is_plain_text(part: &MessagePart<'_>) -> bool {
    match part.content_type() {
        Some(content_type) => {
            content_type.ctype().eq_ignore_ascii_case("text")
                && content_type
                    .subtype()
                    .is_some_and(|subtype| subtype.eq_ignore_ascii_case("plain"))
        }
        None => true,
    }
}
