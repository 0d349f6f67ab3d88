// Content heuristics for public submissions

use serde_json::{Map, Value};

/// Number of URL-looking tokens in `text`
pub fn count_links(text: &str) -> usize {
    text.split_whitespace()
        .filter(|word| {
            let w = word.trim_start_matches(|c: char| !c.is_ascii_alphanumeric()).to_ascii_lowercase();
            w.starts_with("http://") || w.starts_with("https://") || w.starts_with("www.")
        })
        .count()
}

/// True when the hidden honeypot field was filled in
pub fn honeypot_filled(fields: &Map<String, Value>, field: &str) -> bool {
    match fields.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}
