//! Reading time estimate.

/// Words read per minute.
pub const WORDS_PER_MINUTE: usize = 200;

/// `"<n> min read"` for a body, rounding up. Empty text counts as one word.
pub fn reading_time(content: &str) -> String {
    let words = content.split_whitespace().count().max(1);
    let minutes = words.div_ceil(WORDS_PER_MINUTE);
    format!("{minutes} min read")
}
