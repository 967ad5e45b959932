//! Validated text prompts.

use crate::config::PromptLimits;
use crate::error::{TtsError, TtsResult};

/// Text accepted for synthesis.
///
/// Constructed only through [`TextPrompt::parse`], so holding one means the
/// text is non-blank, within the configured length, and free of control
/// characters other than line breaks and tabs. The text itself is kept as
/// given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPrompt(String);

impl TextPrompt {
    /// Validate raw input against `limits`.
    pub fn parse(raw: impl Into<String>, limits: &PromptLimits) -> TtsResult<Self> {
        let text = raw.into();

        if text.trim().is_empty() {
            return Err(TtsError::invalid_input("prompt cannot be empty"));
        }

        let chars = text.chars().count();
        if chars > limits.max_chars {
            return Err(TtsError::invalid_input(format!(
                "prompt too long ({chars} chars, max {})",
                limits.max_chars
            )));
        }

        if let Some(c) = text
            .chars()
            .find(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        {
            return Err(TtsError::invalid_input(format!(
                "prompt contains control character U+{:04X}",
                c as u32
            )));
        }

        Ok(Self(text))
    }

    /// The prompt text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of Unicode scalar values.
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl std::fmt::Display for TextPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TextPrompt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_chars: usize) -> PromptLimits {
        PromptLimits { max_chars }
    }

    #[test]
    fn test_accepts_plain_text() {
        let prompt = TextPrompt::parse("Hello world", &PromptLimits::default()).unwrap();
        assert_eq!(prompt.as_str(), "Hello world");
        assert_eq!(prompt.char_count(), 11);
    }

    #[test]
    fn test_rejects_empty_and_blank() {
        assert!(TextPrompt::parse("", &PromptLimits::default()).is_err());
        assert!(TextPrompt::parse("  \n\t ", &PromptLimits::default()).is_err());
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        // 6 chars, 12 bytes
        assert!(TextPrompt::parse("привет", &limits(6)).is_ok());
        assert!(TextPrompt::parse("привет", &limits(5)).is_err());
    }

    #[test]
    fn test_control_characters() {
        assert!(TextPrompt::parse("line one\nline two\ttab\r\n", &limits(100)).is_ok());

        let err = TextPrompt::parse("bell\u{7}", &limits(100)).unwrap_err();
        assert!(err.to_string().contains("U+0007"));
    }

    #[test]
    fn test_text_is_not_rewritten() {
        let prompt = TextPrompt::parse("  padded  ", &limits(100)).unwrap();
        assert_eq!(prompt.as_str(), "  padded  ");
    }
}
