//! Source languages the validator knows how to recognise.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Reserved words whose presence marks text as plausibly Java.
pub const JAVA_KEYWORDS: &[&str] = &["class", "public", "static", "void", "int", "String"];

/// Declared language of a submission.
///
/// Only Java is recognised; the variant carries the keyword list used by the
/// validator and the file extension used as an upload hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Java,
}

impl Language {
    /// Reserved words checked by [`accepts`](Self::accepts).
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Java => JAVA_KEYWORDS,
        }
    }

    /// File extension (without the dot) expected for uploads.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Java => "java",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Java => "java",
        }
    }

    /// Guess the language from a file extension. Case-insensitive.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("java") {
            Some(Self::Java)
        } else {
            None
        }
    }

    /// True if `text` contains at least one reserved word as a raw substring.
    ///
    /// Matching is case-sensitive and ignores word boundaries, so a keyword
    /// inside a comment, string literal or longer identifier still counts.
    pub fn accepts(&self, text: &str) -> bool {
        match self.keywords().iter().copied().find(|kw| text.contains(kw)) {
            Some(keyword) => {
                trace!(language = %self, keyword, "reserved word found");
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Java => write!(f, "Java"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn java_keywords_match_upload_gate() {
        assert_eq!(
            Language::Java.keywords(),
            &["class", "public", "static", "void", "int", "String"]
        );
    }

    #[test]
    fn from_path_java_extension() {
        assert_eq!(
            Language::from_path(Path::new("src/Main.java")),
            Some(Language::Java)
        );
        assert_eq!(
            Language::from_path(Path::new("Main.JAVA")),
            Some(Language::Java)
        );
    }

    #[test]
    fn from_path_other_extensions() {
        assert_eq!(Language::from_path(Path::new("main.rs")), None);
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn display_and_serde_names() {
        assert_eq!(Language::Java.to_string(), "Java");
        assert_eq!(Language::Java.as_str(), "java");
        let json = serde_json::to_string(&Language::Java).unwrap();
        assert_eq!(json, "\"java\"");
    }
}
