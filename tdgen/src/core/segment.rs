//! Specification-document segmentation for the batch test-generation flow.

/// Delimiter separating independent test-case segments in the spec document.
pub const SEGMENT_DELIMITER: &str = "---";

/// Split a specification document into per-test-case segments.
///
/// Segments keep their surrounding whitespace so the model sees the author's
/// text unchanged.
pub fn split_segments(document: &str) -> Vec<String> {
    document.split(SEGMENT_DELIMITER).map(str::to_string).collect()
}

/// Render the test file name for a 1-based segment index.
///
/// The pattern's `{index}` placeholder is replaced; indices are 1-based so
/// file names line up with how authors count cases in the document.
pub fn test_file_name(pattern: &str, index: usize) -> String {
    pattern.replace("{index}", &index.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_delimiter() {
        let doc = "case one\n---\ncase two\n---\ncase three\n";
        let segments = split_segments(doc);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], "case one\n");
        assert_eq!(segments[1], "\ncase two\n");
        assert_eq!(segments[2], "\ncase three\n");
    }

    #[test]
    fn document_without_delimiter_is_one_segment() {
        let segments = split_segments("single case");
        assert_eq!(segments, vec!["single case".to_string()]);
    }

    #[test]
    fn file_names_do_not_collide() {
        let names: Vec<String> = (1..=3)
            .map(|i| test_file_name("test-case-{index}.test.ts", i))
            .collect();
        assert_eq!(
            names,
            vec![
                "test-case-1.test.ts",
                "test-case-2.test.ts",
                "test-case-3.test.ts"
            ]
        );
    }
}
