/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Strip markdown code blocks from a response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Find the first balanced JSON object or array embedded in free text that
/// actually parses.
///
/// Every opening bracket is tried in order, so prose like `[see below]`
/// ahead of the payload is skipped. Brackets inside string literals are
/// ignored.
pub fn extract_json_block(text: &str) -> Option<&str> {
    json_blocks(text).next()
}

/// Every balanced span in `text` that parses as JSON, in order of its
/// opening bracket. Nested spans are yielded too.
pub fn json_blocks(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .filter(|(_, c)| *c == '{' || *c == '[')
        .filter_map(|(start, _)| balanced_span(text, start))
        .filter(|span| serde_json::from_str::<serde_json::Value>(span).is_ok())
}

/// The bracketed span opening at `start`, or `None` if it never closes cleanly.
fn balanced_span(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.pop() != Some(b) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_char_boundary() {
        let text = "IPO ₹ price band";
        let truncated = truncate_to_char_boundary(text, 5);
        assert!(truncated.len() <= 5);
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn test_truncate_within_bounds() {
        let text = "Hello";
        assert_eq!(truncate_to_char_boundary(text, 100), "Hello");
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("{}"), "{}");
    }

    #[test]
    fn extract_json_block_skips_prose() {
        let text = "Sure! Here is the data: {\"ipos\": [{\"company\": \"Acme\"}]} Hope this helps.";
        assert_eq!(
            extract_json_block(text),
            Some("{\"ipos\": [{\"company\": \"Acme\"}]}")
        );
    }

    #[test]
    fn extract_json_block_ignores_brackets_in_strings() {
        let text = "result: [{\"note\": \"range [1-2] }\"}] trailing";
        assert_eq!(extract_json_block(text), Some("[{\"note\": \"range [1-2] }\"}]"));
    }

    #[test]
    fn extract_json_block_skips_bracketed_prose() {
        let text = "Found 1 IPO [see below]:\n{\"ipos\": [{\"company\": \"Acme\"}]}";
        assert_eq!(
            extract_json_block(text),
            Some("{\"ipos\": [{\"company\": \"Acme\"}]}")
        );
        assert_eq!(extract_json_block("Note {draft} then [1, 2]"), Some("[1, 2]"));
    }

    #[test]
    fn extract_json_block_rejects_unbalanced() {
        assert_eq!(extract_json_block("{\"ipos\": ["), None);
        assert_eq!(extract_json_block("no json here"), None);
        assert_eq!(extract_json_block("{]"), None);
    }
}
