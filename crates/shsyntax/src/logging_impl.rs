//! Logging infrastructure for shsyntax
//!
//! Structured logging through `tracing`, compiled in with the `logging`
//! feature. Scripts handed to the parser may carry credentials
//! (`export API_TOKEN=...`), so their content stays out of logs by default.
//!
//! # Log Levels
//!
//! - **WARN**: nesting limit reached, region skipped
//! - **DEBUG**: parse start and finish, diagnostic counts
//! - **TRACE**: recovery decisions (error node vs rollback, resync)

use std::borrow::Cow;

/// Configuration for logging behavior
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to include script content in logs (default: false for security)
    /// WARN: Setting this to true may log sensitive data in scripts
    pub log_script_content: bool,

    /// Whether to redact token text that looks like a secret (default: true)
    pub redact_sensitive: bool,

    /// Maximum length of logged values before truncation (default: 200)
    pub max_value_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_script_content: false,
            redact_sensitive: true,
            max_value_length: 200,
        }
    }
}

impl LogConfig {
    /// Create a new log configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable logging of script content (UNSAFE)
    ///
    /// # Warning
    ///
    /// Scripts may contain embedded secrets, credentials, or sensitive data.
    pub fn unsafe_log_scripts(mut self) -> Self {
        self.log_script_content = true;
        self
    }

    /// Disable secret redaction of token text (UNSAFE - use only for debugging)
    pub fn unsafe_disable_redaction(mut self) -> Self {
        self.redact_sensitive = false;
        self
    }

    /// Set maximum length for logged values
    pub fn max_value_length(mut self, len: usize) -> Self {
        self.max_value_length = len;
        self
    }

    /// Token text as it may appear in a log line.
    ///
    /// Without `unsafe_log_scripts` only the length is shown.
    pub fn token_for_log<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !self.log_script_content {
            return Cow::Owned(format!("[{} bytes]", text.len()));
        }
        if self.redact_sensitive && looks_like_secret(text) {
            return Cow::Borrowed("[REDACTED]");
        }
        match self.truncate(text) {
            Cow::Borrowed(s) if !s.chars().any(char::is_control) => Cow::Borrowed(s),
            other => Cow::Owned(sanitize_for_log(&other)),
        }
    }

    /// Truncate value if it exceeds max length
    ///
    /// Handles UTF-8 char boundaries properly to avoid panics on multi-byte chars.
    fn truncate<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if value.len() <= self.max_value_length {
            Cow::Borrowed(value)
        } else {
            // Find a valid char boundary at or before max_value_length
            let mut end = self.max_value_length;
            while end > 0 && !value.is_char_boundary(end) {
                end -= 1;
            }
            Cow::Owned(format!(
                "{}...[truncated {} bytes]",
                &value[..end],
                value.len() - end
            ))
        }
    }
}

/// Credential prefixes of common API tokens
const SECRET_PREFIXES: &[&str] = &[
    "sk-",
    "sk_live_",
    "sk_test_",
    "ghp_",
    "gho_",
    "github_pat_",
    "xoxb-",
    "xoxp-",
    "AKIA",
    "eyJ",
];

/// A token, or the value half of `NAME=value`, that reads like a credential.
fn looks_like_secret(text: &str) -> bool {
    let value = text
        .rsplit_once('=')
        .map_or(text, |(_, v)| v)
        .trim_matches(|c| c == '"' || c == '\'');

    if SECRET_PREFIXES
        .iter()
        .any(|prefix| value.len() > prefix.len() + 10 && value.starts_with(prefix))
    {
        return true;
    }

    // long opaque runs of mixed letters and digits
    value.len() >= 32
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'+' | b'/' | b'.'))
        && value.bytes().any(|b| b.is_ascii_digit())
        && value.bytes().any(|b| b.is_ascii_alphabetic())
}

/// Escape characters that could forge log lines.
pub fn sanitize_for_log(input: &str) -> String {
    input
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
        .chars()
        .filter(|c| !c.is_control() || *c == ' ')
        .collect()
}

/// Format script for logging: a size summary unless content logging is enabled.
pub fn format_script_for_log(script: &str, config: &LogConfig) -> String {
    if !config.log_script_content {
        let lines = script.lines().count();
        let bytes = script.len();
        return format!("[script: {} lines, {} bytes]", lines, bytes);
    }

    let sanitized = sanitize_for_log(script);
    config.truncate(&sanitized).into_owned()
}
