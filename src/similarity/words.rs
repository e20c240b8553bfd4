//! Word tokenization for word-level matching.

/// Function words that carry no evidence about meaning.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "into", "is", "of", "on", "or",
    "the", "to", "with",
];

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Content words of an already-normalized name, in order, duplicates kept.
///
/// Names made only of stop words keep them, so that "in" still has a word.
pub fn words(name: &str) -> Vec<&str> {
    let all: Vec<&str> = name.split_whitespace().collect();
    let content: Vec<&str> = all.iter().copied().filter(|w| !is_stop_word(w)).collect();
    if content.is_empty() { all } else { content }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_words_are_dropped() {
        assert_eq!(words("wall of the left ventricle"), vec!["wall", "left", "ventricle"]);
        assert_eq!(words("lung"), vec!["lung"]);
    }

    #[test]
    fn all_stop_word_names_survive() {
        assert_eq!(words("in"), vec!["in"]);
        assert!(words("   ").is_empty());
    }
}
