//! Line tokenizing and word normalization.

use compact_str::CompactString;

/// Split a line into whitespace-delimited tokens.
pub fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split_whitespace()
}

/// Normalize a token into a countable word.
///
/// Keeps alphabetic and numeric characters, lowercased. Returns an empty
/// string when nothing survives; callers must skip those.
pub fn normalize(token: &str) -> CompactString {
    let mut word = CompactString::with_capacity(token.len());
    for c in token.chars().filter(|c| c.is_alphanumeric()) {
        word.extend(c.to_lowercase());
    }
    word
}

/// Iterate the non-empty normalized words of a line.
pub fn normalized_words(line: &str) -> impl Iterator<Item = CompactString> + '_ {
    tokens(line).map(normalize).filter(|w| !w.is_empty())
}
