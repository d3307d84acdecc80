use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Anything that looks like a markup tag
    static ref TAG: Regex = Regex::new(r"<[^<]+>").expect("tag pattern is valid");
    /// Runs of spaces
    static ref SPACES: Regex = Regex::new(r" {2,}").expect("space pattern is valid");
}

/// Replace every markup tag with a single space.
///
/// Stripping is repeated until no tag remains, so input such as `<<b>>`
/// cannot leave a new tag behind.
pub fn strip_tags(text: &str) -> String {
    let mut result = text.to_string();
    while TAG.is_match(&result) {
        result = TAG.replace_all(&result, " ").into_owned();
    }
    result
}

/// Collapse runs of two or more spaces into one
pub fn collapse_spaces(text: &str) -> String {
    SPACES.replace_all(text, " ").into_owned()
}

/// Turn an email body into flat text: strip tags, collapse spaces, trim
pub fn clean_text(body: &str) -> String {
    collapse_spaces(&strip_tags(body)).trim().to_string()
}

/// Return at most the first `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
