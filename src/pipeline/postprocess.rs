//! Post-processing: deterministic cleanup of model-written summaries.
//!
//! The summary prompt asks for plain bullet-point prose, but models still
//! wrap replies in ` ```markdown ` fences, emit `\r\n`, pad lines with
//! trailing spaces, and leave zero-width characters behind. None of that
//! should reach the terminal or the exported `_summary.txt`.
//!
//! ## Rule Order
//!
//! Fences are stripped first so the later passes see the real content, and
//! line endings are normalised before any line-based rule runs.
//!
//! Mind-map replies never pass through here: the fence scanner in
//! [`crate::pipeline::mindmap`] needs them untouched.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule to a raw summary, in order:
///
/// 1. Strip an outer ` ```markdown ` (or bare ` ``` `) fence
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim trailing whitespace per line
/// 4. Collapse runs of blank lines to a single blank line
/// 5. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 6. Trim leading and trailing blank space
pub fn clean_summary(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip outer fence ────────────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md|text)?[ \t]*\r?\n(.*?)\r?\n```\s*$").unwrap());

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace ─────────────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse blank lines ─────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

// ── Rule 5: Remove invisible characters ──────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_fence() {
        let input = "```markdown\n**Theme**\n- point\n```";
        assert_eq!(clean_summary(input), "**Theme**\n- point");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(clean_summary("```\n- a\n- b\n```\n"), "- a\n- b");
    }

    #[test]
    fn inner_code_fence_survives() {
        let input = "Intro\n```\ncode\n```\nOutro";
        assert_eq!(clean_summary(input), input);
    }

    #[test]
    fn crlf_and_trailing_spaces() {
        assert_eq!(clean_summary("- a  \r\n- b\t\r\n"), "- a\n- b");
    }

    #[test]
    fn blank_runs_collapse() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn invisible_chars_removed() {
        assert_eq!(
            remove_invisible_chars("\u{FEFF}Key\u{200B} point\u{00AD}s"),
            "Key points"
        );
    }

    #[test]
    fn plain_text_untouched() {
        let input = "Main theme: testing.\n\n- One\n- Two";
        assert_eq!(clean_summary(input), input);
    }

    #[test]
    fn empty_reply_is_empty() {
        assert_eq!(clean_summary("  \n\n "), "");
    }
}
