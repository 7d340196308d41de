//! HTML helper functions

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Tags that separate words when the markup is flattened
    static ref BLOCK_TAG: Regex = Regex::new(
        r"(?i)</?(p|div|br|hr|h[1-6]|li|ul|ol|pre|blockquote|section|article|table|tr|td|th|figure|figcaption)\b[^>]*>"
    )
    .unwrap();
    static ref ANY_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref ENTITY: Regex = Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap();
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Strip HTML tags from a string
///
/// Block-level tags become whitespace so adjacent paragraphs do not merge
/// into one word; inline tags vanish. Entities are decoded afterwards.
pub fn strip_html(s: &str) -> String {
    let spaced = BLOCK_TAG.replace_all(s, " ");
    let text = ANY_TAG.replace_all(&spaced, "");
    decode_entities(&text)
}

/// Decode the named and numeric character references commonly found in
/// pre-rendered markup
pub fn decode_entities(s: &str) -> String {
    ENTITY
        .replace_all(s, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ if name.starts_with("#x") || name.starts_with("#X") => {
                    u32::from_str_radix(&name[2..], 16).ok().and_then(char::from_u32)
                }
                _ if name.starts_with('#') => name[1..].parse().ok().and_then(char::from_u32),
                _ => None,
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Truncate a string to a specified length
pub fn truncate(s: &str, length: usize, omission: Option<&str>) -> String {
    let omission = omission.unwrap_or("...");

    if s.chars().count() <= length {
        s.to_string()
    } else {
        let truncated: String = s
            .chars()
            .take(length.saturating_sub(omission.chars().count()))
            .collect();
        format!("{}{}", truncated.trim_end(), omission)
    }
}
