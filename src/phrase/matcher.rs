//! Whole-word phrase matcher compiled from a phrase list

use super::normalize;

/// Boundary-aware matcher over a set of phrases.
///
/// Each phrase is normalized and split into words at compile time; a
/// phrase matches when its words appear as a contiguous run of whole
/// tokens in the (already normalized) input. Substring hits inside a
/// longer token never match ("hi" does not match "highlight").
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    phrases: Vec<Vec<String>>,
}

impl PhraseMatcher {
    /// Compile a matcher from a list of phrases.
    ///
    /// Phrases that normalize to nothing are dropped. An empty list
    /// yields a matcher that never matches.
    pub fn compile(phrases: &[String]) -> Self {
        let phrases = phrases
            .iter()
            .map(|p| {
                normalize(p)
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|words| !words.is_empty())
            .collect();

        Self { phrases }
    }

    /// Test normalized text against the compiled phrases.
    pub fn matches(&self, normalized: &str) -> bool {
        if normalized.is_empty() || self.phrases.is_empty() {
            return false;
        }

        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        self.phrases.iter().any(|words| {
            tokens
                .windows(words.len())
                .any(|window| window.iter().zip(words).all(|(t, w)| *t == w))
        })
    }
}
