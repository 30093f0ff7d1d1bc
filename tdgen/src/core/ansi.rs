//! ANSI escape stripping for process logs fed back into prompts.

use std::sync::LazyLock;

use regex::Regex;

// Covers CSI/OSC sequences including their string terminators (BEL, ESC \, ST).
static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = concat!(
        "[\\u001B\\u009B][\\[\\]()#;?]*",
        "(?:",
        "(?:(?:(?:;[-a-zA-Z\\d/#&.:=?%@~_]+)*",
        "|[a-zA-Z\\d]+(?:;[-a-zA-Z\\d/#&.:=?%@~_]*)*)?",
        "(?:\\u0007|\\u001B\\u005C|\\u009C))",
        "|",
        "(?:(?:\\d{1,4}(?:;\\d{0,4})*)?[\\dA-PR-TZcf-nq-uy=><~])",
        ")",
    );
    Regex::new(pattern).expect("ansi pattern should be valid")
});

/// Remove ANSI escape sequences so the log can be replayed as plain text.
pub fn strip_ansi(text: &str) -> String {
    ANSI_RE.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(strip_ansi("error TS2304: Cannot find name 'x'."), "error TS2304: Cannot find name 'x'.");
    }

    #[test]
    fn strips_color_codes() {
        assert_eq!(strip_ansi("\u{1b}[31mFAIL\u{1b}[0m src/index.ts"), "FAIL src/index.ts");
    }

    #[test]
    fn strips_cursor_and_erase_sequences() {
        assert_eq!(strip_ansi("\u{1b}[2K\u{1b}[1Gdone"), "done");
    }

    #[test]
    fn strips_osc_title_sequence() {
        assert_eq!(strip_ansi("\u{1b}]0;npm test\u{7}output"), "output");
    }

    #[test]
    fn keeps_newlines_intact() {
        let input = "\u{1b}[32mPASS\u{1b}[0m\n2 tests";
        assert_eq!(strip_ansi(input), "PASS\n2 tests");
    }
}
