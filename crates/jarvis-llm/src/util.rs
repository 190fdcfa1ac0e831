//! Helpers shared by providers

/// Minimum key length to display partial key
const MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY: usize = 8;

/// Number of characters to show at start/end of masked key
const KEY_MASK_VISIBLE_CHARS: usize = 4;

/// Mask API key for safe display in logs
///
/// Shows the first and last 4 characters for keys longer than 8 characters,
/// otherwise "****".
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    if key.len() <= MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY || !key.is_ascii() {
        return "****".to_string();
    }
    format!(
        "{}...{}",
        &key[..KEY_MASK_VISIBLE_CHARS],
        &key[key.len() - KEY_MASK_VISIBLE_CHARS..]
    )
}

/// Truncate to at most `max_bytes` without splitting a UTF-8 character
#[must_use]
pub fn truncate_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Replace provider error text that may echo credentials with a generic message
#[must_use]
pub fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("api key")
        || lower.contains("apikey")
        || lower.contains("invalid key")
        || lower.contains("unauthorized")
        || lower.contains("authentication")
    {
        return "API authentication error. Please check your API key configuration.".to_string();
    }

    if lower.contains("rate limit") || lower.contains("quota") {
        return "API rate limit exceeded. Please try again later.".to_string();
    }

    if error.len() > 300 {
        format!("{}...(truncated)", truncate_safe(error, 300))
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_masking() {
        let masked = mask_api_key("sk-1234567890abcdefghijklmnop");
        assert_eq!(masked, "sk-1...mnop");
        assert_eq!(mask_api_key("short"), "****");
    }

    #[test]
    fn test_truncate_safe_respects_char_boundary() {
        let s = "₹₹₹";
        assert_eq!(truncate_safe(s, 4), "₹");
        assert_eq!(truncate_safe("abc", 10), "abc");
    }

    #[test]
    fn test_sanitize_api_error() {
        let sanitized = sanitize_api_error("Invalid API key: sk-1234567890");
        assert!(!sanitized.contains("sk-"));
        assert!(sanitized.contains("authentication"));

        let sanitized = sanitize_api_error("Rate limit exceeded: 100 requests per minute");
        assert!(sanitized.contains("rate limit"));

        assert_eq!(sanitize_api_error("Model not found"), "Model not found");
    }
}
