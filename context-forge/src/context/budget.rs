//! Token estimates and deterministic truncation.
//!
//! One token is taken to be four characters. Lengths are counted in Unicode
//! scalar values, so truncation never splits a character.

use crate::model::budget::{
    BUFFER_TOKENS, DATA_SAMPLE_TOKENS, SCHEMA_TOKENS, STATISTICS_TOKENS, SYSTEM_PROMPT_TOKENS,
    TOTAL_TOKENS,
};

/// Characters per token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "...";

/// Converts between tokens and characters and bounds text to a budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenBudgetManager;

impl TokenBudgetManager {
    pub fn new() -> Self {
        Self
    }

    /// `floor(chars / 4)`.
    pub fn estimate_tokens(&self, text: &str) -> usize {
        text.chars().count() / CHARS_PER_TOKEN
    }

    /// Characters allowed for `tokens` tokens.
    pub fn char_limit(&self, tokens: usize) -> usize {
        tokens * CHARS_PER_TOKEN
    }

    pub fn schema_char_limit(&self) -> usize {
        self.char_limit(SCHEMA_TOKENS)
    }

    pub fn statistics_char_limit(&self) -> usize {
        self.char_limit(STATISTICS_TOKENS)
    }

    pub fn data_sample_char_limit(&self) -> usize {
        self.char_limit(DATA_SAMPLE_TOKENS)
    }

    /// Bounds `text` to `max_tokens`.
    ///
    /// Text within the limit is returned unchanged. Longer text keeps its
    /// first `limit - 3` characters followed by `...`. The result never
    /// exceeds the limit, and truncating twice changes nothing.
    pub fn truncate_to_tokens(&self, text: &str, max_tokens: usize) -> String {
        let limit = self.char_limit(max_tokens);
        truncate_chars(text, limit)
    }

    /// Tokens left after the system prompt, the given parts and the buffer.
    ///
    /// Negative when the parts overrun the total.
    pub fn remaining_tokens(
        &self,
        schema_tokens: usize,
        statistics_tokens: usize,
        data_sample_tokens: usize,
        question_tokens: usize,
    ) -> i64 {
        let used = SYSTEM_PROMPT_TOKENS
            + schema_tokens
            + statistics_tokens
            + data_sample_tokens
            + question_tokens;
        TOTAL_TOKENS as i64 - used as i64 - BUFFER_TOKENS as i64
    }

    pub fn fits_within_budget(&self, total_tokens: usize) -> bool {
        total_tokens <= TOTAL_TOKENS
    }

    /// Rows of `avg_row_chars` characters that fit in `available_tokens`.
    pub fn max_rows_for(&self, avg_row_chars: usize, available_tokens: usize) -> usize {
        if avg_row_chars == 0 {
            return 0;
        }
        self.char_limit(available_tokens) / avg_row_chars
    }
}

/// Cuts `text` to at most `limit` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    // At most `limit` characters already
    if text.chars().nth(limit).is_none() {
        return text.to_string();
    }

    if limit < ELLIPSIS.len() {
        return ELLIPSIS[..limit].to_string();
    }

    let keep = limit - ELLIPSIS.len();
    let end = text.char_indices().nth(keep).map_or(text.len(), |(i, _)| i);
    let mut out = String::with_capacity(end + ELLIPSIS.len());
    out.push_str(&text[..end]);
    out.push_str(ELLIPSIS);
    out
}
