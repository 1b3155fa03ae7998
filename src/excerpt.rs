//! Short previews of summary blocks for the collapsed card view.
//!
//! The excerpt is the first sentence when that sentence is short. When the
//! first sentence runs to [`EXCERPT_WORD_LIMIT`] words or more, the excerpt is
//! instead the first [`EXCERPT_WORD_LIMIT`] words of the *whole* text. The two
//! paths can overlap (a 25-word sentence keeps its terminator in the word
//! path) and both are kept as-is.

/// Word count at which the first sentence is considered too long to show.
pub const EXCERPT_WORD_LIMIT: usize = 25;

/// Appended to every non-empty excerpt.
pub const ELLIPSIS: &str = "...";

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Derive the collapsed preview of `full_text`.
///
/// Pure and total: absent or empty input yields an empty string.
pub fn excerpt(full_text: Option<&str>) -> String {
    let text = match full_text {
        Some(t) if !t.is_empty() => t,
        _ => return String::new(),
    };

    let first_sentence = text.split(SENTENCE_TERMINATORS).next().unwrap_or("");

    if first_sentence.split_whitespace().count() < EXCERPT_WORD_LIMIT {
        return format!("{}{}", first_sentence.trim(), ELLIPSIS);
    }

    let words: Vec<&str> = text.split_whitespace().take(EXCERPT_WORD_LIMIT).collect();
    format!("{}{}", words.join(" "), ELLIPSIS)
}
