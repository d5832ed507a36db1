//! Token statistics and LLM context-window fit.
//!
//! Counting is delegated to a [`TokenCounter`] so a real tokenizer can be
//! plugged in; the built-in [`EstimatingTokenCounter`] uses the common
//! four-characters-per-token approximation, which is accurate to within a
//! few percent on English prose for GPT- and Claude-family tokenizers.

use serde::{Deserialize, Serialize};

/// Counts tokens in a piece of text.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Approximate tokenizer: one token per four characters, rounded up.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatingTokenCounter;

impl TokenCounter for EstimatingTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

/// Word and token counts for a produced text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStats {
    pub words: usize,
    pub tokens: usize,
}

/// A named context-window size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLimit {
    pub name: String,
    pub limit: usize,
}

impl TokenLimit {
    pub fn new(name: impl Into<String>, limit: usize) -> Self {
        Self {
            name: name.into(),
            limit,
        }
    }
}

/// Whether a token count fits one [`TokenLimit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFitResult {
    pub name: String,
    pub limit: usize,
    pub fits: bool,
}

/// Default limit table, smallest window first.
pub fn default_token_limits() -> Vec<TokenLimit> {
    vec![
        TokenLimit::new("Llama 3 (8K)", 8_192),
        TokenLimit::new("GPT-4o (128K)", 128_000),
        TokenLimit::new("Claude (200K)", 200_000),
        TokenLimit::new("Gemini (1M)", 1_000_000),
    ]
}

/// Word count by whitespace segmentation plus a token count from `counter`.
pub fn token_stats(text: &str, counter: &dyn TokenCounter) -> TokenStats {
    TokenStats {
        words: text.split_whitespace().count(),
        tokens: counter.count(text),
    }
}

/// Evaluate `tokens` against every limit, preserving the table's order.
///
/// A count equal to the limit fits.
pub fn fit_report(tokens: usize, limits: &[TokenLimit]) -> Vec<TokenFitResult> {
    limits
        .iter()
        .map(|l| TokenFitResult {
            name: l.name.clone(),
            limit: l.limit,
            fits: tokens <= l.limit,
        })
        .collect()
}

/// One-line summary such as `GPT-4o (128K) ✓  Llama 3 (8K) ✗`.
pub fn format_fit_report(report: &[TokenFitResult]) -> String {
    report
        .iter()
        .map(|f| format!("{} {}", f.name, if f.fits { "✓" } else { "✗" }))
        .collect::<Vec<_>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_rounds_up() {
        let c = EstimatingTokenCounter;
        assert_eq!(c.count(""), 0);
        assert_eq!(c.count("abc"), 1);
        assert_eq!(c.count("abcd"), 1);
        assert_eq!(c.count("abcde"), 2);
        // chars, not bytes
        assert_eq!(c.count("éééé"), 1);
    }

    #[test]
    fn words_split_on_any_whitespace() {
        let stats = token_stats("one  two\nthree\tfour ", &EstimatingTokenCounter);
        assert_eq!(stats.words, 4);
        assert_eq!(token_stats("   ", &EstimatingTokenCounter).words, 0);
    }

    #[test]
    fn equal_count_fits() {
        let limits = vec![TokenLimit::new("small", 1000), TokenLimit::new("tiny", 999)];
        let report = fit_report(1000, &limits);
        assert_eq!(
            report,
            vec![
                TokenFitResult { name: "small".into(), limit: 1000, fits: true },
                TokenFitResult { name: "tiny".into(), limit: 999, fits: false },
            ]
        );
    }

    #[test]
    fn report_order_follows_table() {
        let limits = default_token_limits();
        let names: Vec<_> = fit_report(0, &limits).into_iter().map(|f| f.name).collect();
        let expected: Vec<_> = limits.into_iter().map(|l| l.name).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn summary_marks_each_limit() {
        let report = fit_report(10_000, &default_token_limits());
        let line = format_fit_report(&report);
        assert!(line.starts_with("Llama 3 (8K) ✗"), "got: {line}");
        assert!(line.contains("GPT-4o (128K) ✓"));
    }
}
