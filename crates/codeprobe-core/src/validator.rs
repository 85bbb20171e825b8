//! Cheap gate that rejects obviously non-Java uploads before embedding.
//!
//! This is a heuristic, not a parser: a submission passes if any Java
//! reserved word appears anywhere in it as a raw substring. False positives
//! (a keyword inside a comment, a string literal, or a longer word such as
//! `print` containing `int`) are accepted.

use crate::language::Language;

/// Returns true if `text` plausibly contains Java source.
///
/// Equivalent to `Language::Java.accepts(text)`. Never fails.
pub fn is_valid(text: &str) -> bool {
    Language::Java.accepts(text)
}
