use regex::Regex;

/// Case-insensitive promotional tokens. Matches anywhere in the text,
/// including inside longer words.
const SPAM_PATTERN: &str = r"(?i)free|money|win|cash|claim|click|http|https|www|♥|♡";

/// Reviews shorter than this many words are treated as noise.
pub const MIN_WORD_COUNT: usize = 5;

/// Rejects promotional or low-effort review text
#[derive(Debug, Clone)]
pub struct SpamFilter {
    pattern: Regex,
}

impl Default for SpamFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpamFilter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(SPAM_PATTERN).unwrap_or_else(|_| unreachable!()),
        }
    }

    #[must_use]
    pub fn is_spam(&self, text: &str) -> bool {
        self.pattern.is_match(text) || text.split_whitespace().count() < MIN_WORD_COUNT
    }
}
