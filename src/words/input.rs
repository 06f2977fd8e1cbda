//! Free-text input → word tokens.

/// Characters that separate words in the input box, besides whitespace.
const SEPARATORS: [char; 2] = [',', '.'];

/// Split `input` on whitespace (including newlines), commas and periods.
///
/// Empty segments are dropped, so runs of separators never produce empty
/// words.
///
/// ```
/// use word_sound::words::split_words;
///
/// assert_eq!(split_words("cat, dog\nfox."), vec!["cat", "dog", "fox"]);
/// ```
pub fn split_words(input: &str) -> Vec<String> {
    input
        .split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_every_separator() {
        assert_eq!(split_words("cat, dog\nfox."), vec!["cat", "dog", "fox"]);
    }

    #[test]
    fn separator_runs_produce_no_empty_words() {
        assert_eq!(split_words(" ,, apple...\n\n\tpear ,"), vec!["apple", "pear"]);
    }

    #[test]
    fn blank_input_is_empty() {
        assert!(split_words("").is_empty());
        assert!(split_words("  \n , . ").is_empty());
    }

    #[test]
    fn sentence_becomes_words_in_order() {
        assert_eq!(
            split_words("The sun is bright. Birds sing."),
            vec!["The", "sun", "is", "bright", "Birds", "sing"]
        );
    }

    #[test]
    fn keeps_hyphens_and_apostrophes() {
        assert_eq!(split_words("don't well-known"), vec!["don't", "well-known"]);
    }
}
