//! Model response parsing into a generation outcome.

/// Literal marker that declares the task infeasible.
///
/// Matched as a raw substring anywhere in the response, so generated code
/// that happens to contain the word in a comment or string literal is also
/// classified infeasible. Known fragility, kept as-is.
pub const IMPOSSIBLE_MARKER: &str = "Impossible";

const FENCE: &str = "```";

/// Parsed model response: either an extracted code artifact or a declared
/// impossibility with the model's free-text rationale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub possible: bool,
    pub content: String,
}

/// Interpret a fully accumulated model response.
///
/// Responses without the marker are expected to be a single fenced block: an
/// opening fence line (language tag and/or filename), the body, and a closing
/// fence line. Leading prose before the fence is not defended against. If the
/// model appended further fenced blocks, only the body before the first
/// delimiter is kept.
pub fn parse_response(raw: &str) -> GenerationOutcome {
    if raw.contains(IMPOSSIBLE_MARKER) {
        return GenerationOutcome {
            possible: false,
            content: raw.to_string(),
        };
    }

    let lines: Vec<&str> = raw.split('\n').collect();
    let body = if lines.len() <= 2 {
        String::new()
    } else {
        lines[1..lines.len() - 1].join("\n")
    };

    let content = body.split(FENCE).next().unwrap_or("").to_string();
    GenerationOutcome {
        possible: true,
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impossible_marker_returns_full_text() {
        let outcome = parse_response("Impossible\nCannot sum strings");
        assert!(!outcome.possible);
        assert_eq!(outcome.content, "Impossible\nCannot sum strings");
    }

    #[test]
    fn fenced_block_extracts_body() {
        let outcome = parse_response("```js: a.js\nconst x=1;\n```");
        assert!(outcome.possible);
        assert_eq!(outcome.content, "const x=1;");
    }

    #[test]
    fn body_is_independent_of_language_tag() {
        let ts = parse_response("```ts: sum.test.ts\nconst x=1;\n```");
        let bare = parse_response("```\nconst x=1;\n```");
        assert_eq!(ts.content, "const x=1;");
        assert_eq!(bare.content, "const x=1;");
    }

    #[test]
    fn multiline_body_is_kept_whole() {
        let outcome = parse_response("```ts\nlet a;\nlet b;\n```");
        assert!(outcome.possible);
        assert_eq!(outcome.content, "let a;\nlet b;");
    }

    /// Verbose models sometimes append extra fenced blocks; only the first
    /// block's body survives.
    #[test]
    fn extra_fenced_blocks_are_discarded() {
        let outcome = parse_response("```ts\nlet a;\n```\nprose\n```ts\nlet b;\n```");
        assert!(outcome.possible);
        assert_eq!(outcome.content, "let a;\n");
    }

    /// Documents the substring fragility: code containing the marker word is
    /// classified infeasible even when it is a valid solution.
    #[test]
    fn marker_inside_code_is_still_classified_infeasible() {
        let raw = "```js\n// returns Impossible when input is negative\n```";
        let outcome = parse_response(raw);
        assert!(!outcome.possible);
        assert_eq!(outcome.content, raw);
    }

    #[test]
    fn degenerate_responses_yield_empty_content() {
        assert_eq!(parse_response("").content, "");
        assert_eq!(parse_response("```\n```").content, "");
    }
}
