//! Post-processing: deterministic cleanup of converter-produced Markdown.
//!
//! Different converters (HTML → Markdown, plain text pass-through, external
//! document engines) disagree on line endings, blank-line runs and stray
//! Unicode. Downstream consumers are LLM prompts and diff tools, so we
//! normalise before formatting. Every rule is a pure `&str → String` pass.
//!
//! ## Rule Order
//!
//! Line endings first so every later rule only sees `\n`. Invisible
//! characters are stripped before whitespace trimming so a line holding only
//! a zero-width space becomes blank and is collapsed. The final-newline pass
//! runs last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all normalisation rules to converter output.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF/CR → LF)
/// 2. Strip invisible Unicode (BOM, zero-width space, soft hyphen, word joiner)
/// 3. Replace non-breaking spaces with plain spaces
/// 4. Trim trailing whitespace per line
/// 5. Collapse runs of blank lines to a single blank line (outside code fences)
/// 6. Drop leading blank lines
/// 7. Ensure the text ends with exactly one newline
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = replace_nbsp(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = s.trim_start_matches('\n');
    ensure_final_newline(s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────
//
// ZWJ/ZWNJ are kept: they are load-bearing in emoji sequences and several
// scripts.

fn remove_invisible_chars(input: &str) -> String {
    input.replace(['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{2060}'], "")
}

// ── Rule 3: Non-breaking spaces ──────────────────────────────────────────────

fn replace_nbsp(input: &str) -> String {
    input.replace(['\u{00A0}', '\u{202F}'], " ")
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Collapse excessive blank lines ───────────────────────────────────

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(```|~~~)").unwrap());

/// Collapse blank-line runs, leaving fenced code blocks untouched.
fn collapse_blank_lines(input: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut in_fence = false;
    let mut prev_blank = false;

    for line in input.split('\n') {
        if RE_FENCE.is_match(line) {
            in_fence = !in_fence;
        }
        let blank = line.trim().is_empty();
        if blank && prev_blank && !in_fence {
            continue;
        }
        prev_blank = blank && !in_fence;
        out.push(line);
    }

    out.join("\n")
}

// ── Rule 7: Ensure text ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        assert_eq!(
            trim_trailing_whitespace("  hello   \nworld  "),
            "  hello\nworld"
        );
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_blank_lines_inside_fences_survive() {
        let input = "intro\n\n\n\n```\nline1\n\n\n\nline2\n```\n\n\n\nend";
        let result = collapse_blank_lines(input);
        assert_eq!(result, "intro\n\n```\nline1\n\n\n\nline2\n```\n\nend");
    }

    #[test]
    fn test_ensure_final_newline() {
        assert_eq!(ensure_final_newline("hello"), "hello\n");
        assert_eq!(ensure_final_newline("hello\n\n\n"), "hello\n");
        assert_eq!(ensure_final_newline(""), "\n");
    }

    #[test]
    fn test_remove_invisible_keeps_joiners() {
        let input = "hello\u{200B}world\u{FEFF}foo\u{00AD}bar\u{200D}";
        assert_eq!(remove_invisible_chars(input), "helloworldfoobar\u{200D}");
    }

    #[test]
    fn test_nbsp_becomes_space() {
        assert_eq!(replace_nbsp("a\u{00A0}b"), "a b");
    }

    #[test]
    fn test_clean_markdown_full_pipeline() {
        let input = "\u{FEFF}\r\n\r\n# Title\r\n\r\nSome text   \n\u{200B}\n\n\n\n\n## Section\n\n";
        let result = clean_markdown(input);
        assert_eq!(result, "# Title\n\nSome text\n\n## Section\n");
    }
}
