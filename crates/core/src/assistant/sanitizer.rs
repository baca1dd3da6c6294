//! Strip reasoning artifacts from raw completions.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Closed `<think>` / `<thinking>` blocks.
static REASONING_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<think(?:ing)?>.*?</think(?:ing)?>").unwrap()
});

/// An opening marker that is never closed swallows the rest of the text.
static UNTERMINATED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<think(?:ing)?>.*$").unwrap());

/// Lines that narrate the model's own reasoning.
static META_NARRATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:let me think|let me analy[sz]e|let's think|first,|okay, so|hmm|i need to|thinking:)",
    )
    .unwrap()
});

/// Remove non-user-facing reasoning from `text`.
///
/// Never returns an empty string for non-empty input: if nothing would be
/// left, the original text is returned unchanged.
pub fn sanitize(text: &str) -> String {
    let mut stripped = text.to_string();
    loop {
        let next = REASONING_BLOCK.replace_all(&stripped, "").into_owned();
        if next == stripped {
            break;
        }
        stripped = next;
    }
    let stripped = UNTERMINATED_BLOCK.replace(&stripped, "").into_owned();

    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in stripped.lines() {
        if META_NARRATION.is_match(line) {
            continue;
        }
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        previous_blank = blank;
        lines.push(line);
    }

    let cleaned = lines.join("\n").trim().to_string();
    if cleaned.is_empty() {
        return text.to_string();
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_reasoning_blocks() {
        let raw = "<think>The user wants a dose.\nCheck weight.</think>Take 500mg every 6 hours.";
        assert_eq!(sanitize(raw), "Take 500mg every 6 hours.");

        let raw = "Answer.<THINKING>hidden</THINKING> More.";
        assert_eq!(sanitize(raw), "Answer. More.");
    }

    #[test]
    fn test_removes_unterminated_block() {
        let raw = "Paracetamol is safe at normal doses.\n<think>but what about";
        assert_eq!(sanitize(raw), "Paracetamol is safe at normal doses.");
    }

    #[test]
    fn test_removes_meta_narration_lines() {
        let raw = "Let me think: the user asks about stock.\nFirst, I will check.\nYou have 12 items low on stock.";
        assert_eq!(sanitize(raw), "You have 12 items low on stock.");
    }

    #[test]
    fn test_collapses_blank_runs() {
        let raw = "Line one.\n\n\n\nLine two.\n\n\nLine three.";
        assert_eq!(sanitize(raw), "Line one.\n\nLine two.\n\nLine three.");
    }

    #[test]
    fn test_keeps_single_blank_line() {
        let raw = "A\n\nB";
        assert_eq!(sanitize(raw), "A\n\nB");
    }

    #[test]
    fn test_never_empties_a_response() {
        let raw = "<think>only reasoning</think>";
        assert_eq!(sanitize(raw), raw);

        let raw = "Let me think about this.";
        assert_eq!(sanitize(raw), raw);

        let raw = "   ";
        assert_eq!(sanitize(raw), raw);
    }

    #[test]
    fn test_nested_markers_are_fully_removed() {
        let raw = "<thi<think>x</think>nk>hidden</think>Visible";
        assert_eq!(sanitize(raw), "Visible");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "plain answer",
            "<think>a</think>\n\n\n\nFirst, x\nreal\n\n\nend",
            "<thi<think>x</think>nk>hidden</think>Visible",
            "Hmm.\n  Let me think\n\n",
            "<think>only</think>",
            "",
            "  padded  \n\n\n  text  ",
            "ما هي الجرعة؟\n\n\n\nالجواب",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_non_empty_input_never_yields_empty() {
        for sample in ["x", "<think>y</think>", "\n\n\n", "First, only narration"] {
            assert!(!sanitize(sample).is_empty());
        }
    }
}
