//! Locating and repairing the JSON object inside a completion
//!
//! Models wrap plans in commentary and code fences, and some of them emit the
//! object with its quotes and newlines escaped a second time. The scanner finds
//! balanced `{...}` spans without being fooled by braces inside string values;
//! the repair pass undoes one layer of backslash escaping.

use tracing::debug;

/// Balanced `{...}` spans of `text`, in order of appearance
///
/// After a span is yielded the search resumes behind it, so objects nested in
/// an earlier span are never yielded on their own.
pub(crate) fn object_spans(text: &str) -> ObjectSpans<'_> {
    ObjectSpans { text, pos: 0 }
}

pub(crate) struct ObjectSpans<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for ObjectSpans<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(offset) = self.text[self.pos..].find('{') {
            let open = self.pos + offset;
            match balanced_end(&self.text.as_bytes()[open..]) {
                Some(len) => {
                    self.pos = open + len;
                    return Some(&self.text[open..open + len]);
                }
                None => self.pos = open + 1,
            }
        }
        None
    }
}

/// Length of the balanced object starting at `bytes[0]`, if it closes
///
/// Only ASCII bytes are inspected, so every returned length ends on a char
/// boundary.
fn balanced_end(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Undo one layer of backslash escaping, then re-escape control characters
/// that ended up inside string values so the result is valid JSON again.
pub(crate) fn repair(span: &str) -> String {
    debug!(len = span.len(), "repair: called");
    escape_controls_in_strings(&unescape(span))
}

/// Decode backslash escape sequences (`\n`, `\"`, `\\`, `\xHH`, `\uXXXX`, octal ...)
///
/// Unknown or malformed sequences are kept as written.
pub(crate) fn unescape(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' || i + 1 == chars.len() {
            out.push(c);
            i += 1;
            continue;
        }

        let next = chars[i + 1];
        let simple = match next {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'a' => Some('\u{07}'),
            'b' => Some('\u{08}'),
            'f' => Some('\u{0c}'),
            'v' => Some('\u{0b}'),
            '\\' => Some('\\'),
            '\'' => Some('\''),
            '"' => Some('"'),
            _ => None,
        };
        if let Some(decoded) = simple {
            out.push(decoded);
            i += 2;
            continue;
        }

        match next {
            '\n' => i += 2,
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                match hex_char(&chars, i + 2, width) {
                    Some(decoded) => {
                        out.push(decoded);
                        i += 2 + width;
                    }
                    None => {
                        out.push('\\');
                        out.push(next);
                        i += 2;
                    }
                }
            }
            '0'..='7' => {
                let digits: String = chars[i + 1..].iter().take(3).take_while(|d| d.is_digit(8)).collect();
                match u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push_str(&digits);
                    }
                }
                i += 1 + digits.len();
            }
            other => {
                out.push('\\');
                out.push(other);
                i += 2;
            }
        }
    }
    out
}

fn hex_char(chars: &[char], start: usize, width: usize) -> Option<char> {
    let digits: String = chars.get(start..start + width)?.iter().collect();
    if !digits.chars().all(|d| d.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)
}

/// Escape raw control characters that appear inside JSON string literals
fn escape_controls_in_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }
        match c {
            '\\' if in_string => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                in_string = !in_string;
                out.push(c);
            }
            '\n' if in_string => out.push_str("\\n"),
            '\r' if in_string => out.push_str("\\r"),
            '\t' if in_string => out.push_str("\\t"),
            c if in_string && c.is_control() && (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_inside_commentary() {
        let text = "Sure! Here is the plan:\n```json\n{\"input\": \"x\", \"subtasks\": []}\n```\nDone.";
        let spans: Vec<&str> = object_spans(text).collect();
        assert_eq!(spans, vec!["{\"input\": \"x\", \"subtasks\": []}"]);
    }

    #[test]
    fn test_braces_inside_strings_do_not_count() {
        let text = r#"plan: {"input": "a } b { c", "subtasks": [{"function": "rag.ask_rag", "args": {}}]} trailing }"#;
        let span = object_spans(text).next().unwrap();
        assert!(span.starts_with("{\"input\""));
        assert!(span.ends_with("]}"));
        assert!(serde_json::from_str::<serde_json::Value>(span).is_ok());
    }

    #[test]
    fn test_nested_objects_not_yielded_separately() {
        let text = r#"{"a": {"b": 1}} and {"c": 2}"#;
        let spans: Vec<&str> = object_spans(text).collect();
        assert_eq!(spans, vec![r#"{"a": {"b": 1}}"#, r#"{"c": 2}"#]);
    }

    #[test]
    fn test_unclosed_brace_skipped() {
        let text = r#"use { carefully: {"input": 1}"#;
        let spans: Vec<&str> = object_spans(text).collect();
        assert_eq!(spans, vec![r#"{"input": 1}"#]);
    }

    #[test]
    fn test_no_object() {
        assert_eq!(object_spans("no plan here").next(), None);
        assert_eq!(object_spans("").next(), None);
    }

    #[test]
    fn test_multibyte_text_around_span() {
        let text = "Plà: {\"input\": \"café\"} ✓";
        assert_eq!(object_spans(text).next(), Some("{\"input\": \"café\"}"));
    }

    #[test]
    fn test_unescape_sequences() {
        assert_eq!(unescape(r#"{\n  \"a\": 1\n}"#), "{\n  \"a\": 1\n}");
        assert_eq!(unescape(r"tab\there"), "tab\there");
        assert_eq!(unescape(r"back\\slash"), "back\\slash");
        assert_eq!(unescape(r"\x41é\U0001F600"), "Aé😀");
        assert_eq!(unescape(r"\101"), "A");
        assert_eq!(unescape(r"keep \q and \xZZ"), "keep \\q and \\xZZ");
        assert_eq!(unescape("trailing \\"), "trailing \\");
    }

    #[test]
    fn test_repair_double_escaped_object() {
        let raw = r#"{\n  \"input\": \"Which city?\",\n  \"subtasks\": []\n}"#;
        assert!(serde_json::from_str::<serde_json::Value>(raw).is_err());

        let value: serde_json::Value = serde_json::from_str(&repair(raw)).unwrap();
        assert_eq!(value["input"], "Which city?");
        assert!(value["subtasks"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_repair_escapes_newlines_inside_values() {
        let raw = r#"{\"input\": \"line one\nline two\"}"#;
        let value: serde_json::Value = serde_json::from_str(&repair(raw)).unwrap();
        assert_eq!(value["input"], "line one\nline two");
    }
}
