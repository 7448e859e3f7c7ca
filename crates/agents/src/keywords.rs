//! Lexical keyword extraction from questions

use regex::Regex;
use std::sync::LazyLock;

/// Maximum number of search terms produced for one question
pub const MAX_KEYWORDS: usize = 10;

const STOP_WORDS: &[&str] = &[
    "what", "how", "why", "when", "where", "who", "which", "is", "are", "was", "were", "do",
    "does", "did", "can", "could", "the", "a", "an", "and", "or", "but", "in", "on", "at", "to",
    "for", "of", "with", "by", "about", "tell", "me", "explain",
];

static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("word regex"));

/// Turn a question into at most `MAX_KEYWORDS` search terms.
///
/// Filtered single words come first (in question order), followed by every
/// two-word phrase formed by adjacent words separated only by whitespace.
/// Phrases are not stop-word filtered.
pub fn extract_keywords(question: &str) -> Vec<String> {
    let lowered = question.to_lowercase();
    let tokens: Vec<regex::Match<'_>> = WORD_REGEX.find_iter(&lowered).collect();

    let mut keywords: Vec<String> = tokens
        .iter()
        .map(|m| m.as_str())
        .filter(|word| word.chars().count() > 2 && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect();

    for pair in tokens.windows(2) {
        let gap = &lowered[pair[0].end()..pair[1].start()];
        if !gap.is_empty() && gap.chars().all(char::is_whitespace) {
            keywords.push(lowered[pair[0].start()..pair[1].end()].to_string());
        }
    }

    keywords.truncate(MAX_KEYWORDS);
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_question() {
        let keywords = extract_keywords("What is machine learning and how does it relate to AI?");

        assert_eq!(
            keywords,
            vec![
                "machine",
                "learning",
                "relate",
                "what is",
                "is machine",
                "machine learning",
                "learning and",
                "and how",
                "how does",
                "does it",
            ]
        );
        for dropped in ["what", "is", "and", "how", "does", "it", "to"] {
            assert!(!keywords.contains(&dropped.to_string()));
        }
    }

    #[test]
    fn test_only_stop_words_and_short_tokens() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("?!").is_empty());
        // A single word yields no phrases either
        assert!(extract_keywords("what").is_empty());
        assert_eq!(extract_keywords("Who is"), vec!["who is"]);
    }

    #[test]
    fn test_punctuation_breaks_phrases() {
        let keywords = extract_keywords("graphs, trees");
        assert_eq!(keywords, vec!["graphs", "trees"]);
    }

    #[test]
    fn test_phrase_keeps_original_spacing() {
        let keywords = extract_keywords("neural   networks");
        assert_eq!(keywords, vec!["neural", "networks", "neural   networks"]);
    }

    #[test]
    fn test_lowercases_and_truncates() {
        let question = "Alpha Beta Gamma Delta Epsilon Zeta Theta Iota Kappa Lambda Sigma";
        let keywords = extract_keywords(question);
        assert_eq!(keywords.len(), MAX_KEYWORDS);
        assert_eq!(keywords[0], "alpha");
        assert_eq!(keywords[9], "lambda");
    }

    #[test]
    fn test_unicode_words() {
        let keywords = extract_keywords("Qu'est-ce que l'apprentissage profond?");
        assert!(keywords.contains(&"apprentissage".to_string()));
        assert!(keywords.contains(&"apprentissage profond".to_string()));
    }
}
