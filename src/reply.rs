//! Reply extraction from the proxy's HTML responses.

use regex::Regex;

use crate::error::{Error, Result};

/// Pattern matching the reply fragment in a chat response page.
pub const REPLY_PATTERN: &str = r#"(?s)<div class="response-content">(.*?)</div>"#;

/// Shown when a response came back but held no reply fragment.
pub const FALLBACK_REPLY: &str = "تم الإرسال / Message sent, but no reply text was found.";

/// Pulls the model's answer out of a response body.
pub trait ReplyExtractor: Send + Sync {
    /// Returns the reply fragment, or `None` when the body has none.
    fn extract(&self, body: &str) -> Option<String>;
}

/// Regex-based extractor; the first capture group of the first match is the reply.
#[derive(Debug, Clone)]
pub struct RegexReplyExtractor {
    pattern: Regex,
}

impl RegexReplyExtractor {
    /// Creates an extractor using [`REPLY_PATTERN`].
    pub fn new() -> Result<Self> {
        Self::with_pattern(REPLY_PATTERN)
    }

    /// Creates an extractor with a custom pattern.
    ///
    /// The pattern must have at least one capture group.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            Error::validation(format!("bad reply pattern: {e}"), Some("pattern".to_string()))
        })?;
        if pattern.captures_len() < 2 {
            return Err(Error::validation(
                "reply pattern needs a capture group",
                Some("pattern".to_string()),
            ));
        }
        Ok(Self { pattern })
    }
}

impl ReplyExtractor for RegexReplyExtractor {
    fn extract(&self, body: &str) -> Option<String> {
        self.pattern
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}
