//! Utility functions for the Wave client
//!
//! Response bodies end up in error messages and logs. These helpers cut them
//! down without splitting multi-byte characters.

/// Maximum number of body bytes carried into an error message
pub const BODY_SNIPPET_BYTES: usize = 512;

/// Safely truncate a string at a UTF-8 character boundary.
///
/// Returns a slice of at most `max_bytes` bytes, ensuring the result
/// is valid UTF-8 by finding the last valid character boundary.
///
/// # Example
/// ```
/// use bradford_white_wave::utils::safe_truncate;
///
/// let text = "Setpoint: 120°F";
/// assert_eq!(safe_truncate(text, 14), "Setpoint: 120");
/// ```
#[inline]
#[must_use]
pub fn safe_truncate(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut boundary = max_bytes;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    &s[..boundary]
}

/// Truncate a string for display with ellipsis.
///
/// # Example
/// ```
/// use bradford_white_wave::utils::truncate_for_display;
///
/// let text = "This is a long message";
/// assert_eq!(truncate_for_display(text, 10), "This is a ...");
/// ```
#[must_use]
pub fn truncate_for_display(s: &str, max_bytes: usize) -> String {
    let truncated = safe_truncate(s, max_bytes);
    if truncated.len() < s.len() {
        format!("{truncated}...")
    } else {
        truncated.to_string()
    }
}

/// Shorten an HTTP response body for inclusion in an error message
#[must_use]
pub fn body_snippet(body: &str) -> String {
    truncate_for_display(body.trim(), BODY_SNIPPET_BYTES)
}

/// Show the first few characters of a secret-ish value (authorization codes)
#[must_use]
pub fn redact(value: &str) -> String {
    truncate_for_display(value, 10)
}
