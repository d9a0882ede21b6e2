//! Small utility helpers used across modules.

/// Trim an optional text field; blank becomes `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge WebSocket payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... ({} bytes total)", &s[..cut], s.len())
}
