//! Keyword matching engine for intent and entity extraction.
//!
//! Every classifier and extractor rule is a list of keywords checked against
//! lower-cased user text. Two matching strategies exist:
//!
//! - [`MatchMode::Word`] (default): the keyword must be bounded by
//!   non-alphanumeric characters (or the ends of the text) on both sides.
//!   Multi-word keywords such as `"washing machine"` work as phrases.
//! - [`MatchMode::Substring`]: plain containment. `"dry"` matches inside
//!   `"laundry"` and `"ev"` matches inside `"every"`.
//!
//! # Example
//!
//! ```
//! use aura::matching::{MatchMode, contains_keyword};
//!
//! assert!(!contains_keyword("do laundry", "dry", MatchMode::Word));
//! assert!(contains_keyword("do laundry", "dry", MatchMode::Substring));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Keyword matching strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Keyword must appear as a whole word or phrase.
    #[default]
    Word,
    /// Keyword may appear anywhere, including inside other words.
    Substring,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word => write!(f, "word"),
            Self::Substring => write!(f, "substring"),
        }
    }
}

/// Check whether `keyword` occurs in `text` under the given mode.
///
/// Both arguments are expected to be lower-cased already; no case folding
/// happens here.
pub fn contains_keyword(text: &str, keyword: &str, mode: MatchMode) -> bool {
    if keyword.is_empty() {
        return false;
    }

    match mode {
        MatchMode::Substring => text.contains(keyword),
        MatchMode::Word => text
            .match_indices(keyword)
            .any(|(start, _)| is_word_bounded(text, start, start + keyword.len())),
    }
}

/// Check whether any of `keywords` occurs in `text`.
pub fn contains_any(text: &str, keywords: &[&str], mode: MatchMode) -> bool {
    keywords
        .iter()
        .any(|keyword| contains_keyword(text, keyword, mode))
}

/// A match at `text[start..end]` is bounded when the characters on either
/// side (if any) are not alphanumeric.
fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();

    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
