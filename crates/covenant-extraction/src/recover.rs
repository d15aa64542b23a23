//! Tolerant JSON recovery from model responses.
//!
//! Models wrap JSON in prose and code fences. The recovery scan locates
//! the first balanced object in the text, string- and escape-aware, and
//! parses that substring. Anything unrecoverable is `None`, which callers
//! treat as a recoverable condition.

use serde_json::Value;

/// Extract and parse the first JSON object embedded in `text`.
pub fn recover_object(text: &str) -> Option<Value> {
    let candidate = balanced_object(text)?;
    serde_json::from_str(candidate).ok()
}

/// Find the first balanced `{...}` substring.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
