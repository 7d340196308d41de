//! Reading-time estimation

use serde::Serialize;
use std::fmt;

use super::post::Section;

/// Fixed reading speed
pub const WORDS_PER_MINUTE: usize = 200;

/// Estimated time to read a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadingTime {
    pub words: usize,
    pub minutes: usize,
}

impl ReadingTime {
    /// Count the words of the title, every heading and every body, then
    /// round the minutes up. A post with no words at all reads in 0 min.
    pub fn estimate(title: &str, sections: &[Section]) -> Self {
        let title_words = count_words(title);
        let heading_words: usize = sections.iter().map(|s| count_words(&s.heading)).sum();
        let body_words: usize = sections.iter().map(|s| s.body.word_count()).sum();

        let words = title_words + heading_words + body_words;
        Self {
            words,
            minutes: words.div_ceil(WORDS_PER_MINUTE),
        }
    }
}

impl fmt::Display for ReadingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.minutes)
    }
}

/// Number of whitespace-delimited tokens
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
