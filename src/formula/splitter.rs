//! Top-level comma splitting for operator argument lists.

/// Split `input` at commas that sit outside any brackets and quoted strings.
///
/// `(`, `[` and `{` open a nesting level and their closers end it. A single or
/// double quote starts a string that runs until the same quote character
/// appears again; there is no escaping. Each segment is trimmed, and an empty
/// or whitespace-only input yields no segments.
pub fn split_top_level_commas(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    if !current.is_empty() && (!current.trim().is_empty() || !parts.is_empty()) {
        parts.push(current.trim().to_string());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_brackets_and_quotes() {
        assert_eq!(
            split_top_level_commas(r#"a, [b, c], "d, e""#),
            vec!["a", "[b, c]", r#""d, e""#]
        );
    }

    #[test]
    fn test_nested_formulas() {
        assert_eq!(
            split_top_level_commas("SELECT(E, 'x > 1'), PROJECT(F, [a, b])"),
            vec!["SELECT(E, 'x > 1')", "PROJECT(F, [a, b])"]
        );
    }

    #[test]
    fn test_quotes_hide_brackets() {
        assert_eq!(
            split_top_level_commas("'(', b"),
            vec!["'('", "b"]
        );
        assert_eq!(
            split_top_level_commas(r#""it's, fine", x"#),
            vec![r#""it's, fine""#, "x"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(split_top_level_commas("").is_empty());
        assert!(split_top_level_commas("   ").is_empty());
    }

    #[test]
    fn test_empty_segments_are_kept() {
        assert_eq!(split_top_level_commas("a,,b"), vec!["a", "", "b"]);
        assert_eq!(split_top_level_commas("a, "), vec!["a", ""]);
        assert_eq!(split_top_level_commas("a,"), vec!["a"]);
    }

    #[test]
    fn test_unbalanced_input_never_fails() {
        assert_eq!(split_top_level_commas("a), b"), vec!["a), b"]);
        assert_eq!(split_top_level_commas("'open, b"), vec!["'open, b"]);
    }
}
