//! An uploaded source file, as received.

use std::string::FromUtf8Error;

use crate::language::Language;

/// Raw text of one uploaded file plus its declared language.
///
/// Immutable once built; dropped after the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSubmission {
    content: String,
    language: Language,
    file_name: Option<String>,
}

impl SourceSubmission {
    pub fn new(content: impl Into<String>, language: Language) -> Self {
        Self {
            content: content.into(),
            language,
            file_name: None,
        }
    }

    /// Decode an upload as UTF-8.
    pub fn from_utf8(bytes: Vec<u8>, language: Language) -> Result<Self, FromUtf8Error> {
        Ok(Self::new(String::from_utf8(bytes)?, language))
    }

    /// Attach the original file name, for display only.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Size of the content in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_utf8_decodes_valid_bytes() {
        let sub = SourceSubmission::from_utf8(b"class A {}".to_vec(), Language::Java).unwrap();
        assert_eq!(sub.content(), "class A {}");
        assert_eq!(sub.language(), Language::Java);
        assert_eq!(sub.len(), 10);
        assert!(sub.file_name().is_none());
    }

    #[test]
    fn from_utf8_rejects_invalid_bytes() {
        let err = SourceSubmission::from_utf8(vec![0x63, 0xff, 0xfe], Language::Java);
        assert!(err.is_err());
    }

    #[test]
    fn file_name_is_kept() {
        let sub = SourceSubmission::new("int x;", Language::Java).with_file_name("X.java");
        assert_eq!(sub.file_name(), Some("X.java"));
    }

    #[test]
    fn empty_submission() {
        let sub = SourceSubmission::new("", Language::Java);
        assert!(sub.is_empty());
    }
}
