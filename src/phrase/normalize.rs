//! Text canonicalization for phrase matching

/// Punctuation stripped from recognized text before matching.
const STRIPPED: [char; 6] = ['.', ',', '!', '?', ';', ':'];

/// Canonicalize raw recognized text: lowercase, trim surrounding
/// whitespace, and strip sentence punctuation.
///
/// Total and idempotent; empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_trims() {
        assert_eq!(normalize("  Hey Computer  "), "hey computer");
    }

    #[test]
    fn test_strips_punctuation() {
        assert_eq!(normalize("Hi! How are you, friend?"), "hi how are you friend");
        assert_eq!(normalize("wait; no: stop."), "wait no stop");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("?!"), "");
    }

    #[test]
    fn test_idempotent() {
        for text in ["  Hello, World!  ", "already normal", "", "A.B.C"] {
            let once = normalize(text);
            assert_eq!(normalize(&once), once);
        }
    }
}
