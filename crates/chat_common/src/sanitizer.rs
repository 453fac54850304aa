//! Redaction of credentials and personal identifiers before they reach logs.
//!
//! User identifiers in this system are email addresses, so anything logged
//! around authentication goes through [`LogSanitizer`].

use regex::Regex;
use std::sync::OnceLock;

static PATTERNS: OnceLock<Vec<(Regex, String)>> = OnceLock::new();

pub struct LogSanitizer {
    patterns: Vec<(Regex, String)>,
}

impl LogSanitizer {
    pub fn new() -> Self {
        let patterns = PATTERNS.get_or_init(|| {
            [
                (
                    r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}",
                    "***@***.***",
                ),
                // Percent-escaped emails as they appear in store paths
                (
                    r"[a-zA-Z0-9._+-]+%40[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}",
                    "***%40***.***",
                ),
                (r"(?i)(password\s*[=:]\s*)\S+", "${1}***"),
                (r"(?i)(token\s*[=:]\s*)[a-zA-Z0-9_-]+", "${1}***"),
            ]
            .into_iter()
            .filter_map(|(pattern, replacement)| {
                Regex::new(pattern)
                    .ok()
                    .map(|regex| (regex, replacement.to_string()))
            })
            .collect()
        });

        Self {
            patterns: patterns.clone(),
        }
    }

    pub fn sanitize(&self, message: &str) -> String {
        let mut result = message.to_string();
        for (pattern, replacement) in &self.patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }
        result
    }
}

impl Default for LogSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_redaction() {
        let sanitizer = LogSanitizer::new();
        let log = "Authenticated alice@example.com";
        assert_eq!(sanitizer.sanitize(log), "Authenticated ***@***.***");
    }

    #[test]
    fn test_escaped_email_redaction() {
        let sanitizer = LogSanitizer::new();
        let log = "subscribed users/bob%40example.com";
        assert_eq!(sanitizer.sanitize(log), "subscribed users/***%40***.***");
    }

    #[test]
    fn test_password_redaction() {
        let sanitizer = LogSanitizer::new();
        let log = "login attempt password=hunter2 from cli";
        assert_eq!(sanitizer.sanitize(log), "login attempt password=*** from cli");
    }

    #[test]
    fn test_token_redaction() {
        let sanitizer = LogSanitizer::new();
        let log = "session token: abc-123_XYZ resumed";
        assert_eq!(sanitizer.sanitize(log), "session token: *** resumed");
    }

    #[test]
    fn test_plain_identifier_untouched() {
        let sanitizer = LogSanitizer::new();
        assert_eq!(sanitizer.sanitize("chats/general"), "chats/general");
    }
}
