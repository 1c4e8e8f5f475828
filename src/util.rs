//! Small text helpers shared between the declaration parser and the
//! shorthand engine — both need to recognize and strip a trailing
//! `!important`, and both need ASCII-only property-name lowercasing that
//! leaves custom properties (`--foo`) untouched (spec.md §3, §4.2).

/// Case-sensitive on the literal `important`; the `!` and the whitespace
/// around it are matched loosely (spec.md §9 Open Questions addresses
/// exactly this asymmetry and leaves it as specified).
pub fn strip_important(value: &str) -> (&str, bool) {
    let trimmed = value.trim_end();
    if let Some(bang) = trimmed.rfind('!') {
        let after_bang = trimmed[bang + 1..].trim_start();
        if after_bang == "important" {
            return (trimmed[..bang].trim_end(), true);
        }
    }
    (trimmed, false)
}

/// Lowercase a declaration property name, except custom properties
/// (`--foo`), which are case-sensitive UTF-8 per spec.md §3.
pub fn normalize_property_name(name: &str) -> String {
    if name.starts_with("--") {
        name.to_string()
    } else {
        name.to_ascii_lowercase()
    }
}

/// Split `value` on ASCII whitespace into non-empty token byte ranges,
/// preserving parenthesized groups like `rgb(1, 2, 3)` or `url(...)` as
/// single tokens. The byte offsets let callers (e.g. the `font`
/// shorthand) recover the original substring after a token without
/// re-joining a tokenized list and losing comma/space formatting.
pub fn tokenize_value_with_offsets(value: &str) -> Vec<(usize, usize)> {
    let bytes = value.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    let len = bytes.len();
    while i < len {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            break;
        }
        let start = i;
        let mut depth = 0i32;
        while i < len {
            match bytes[i] {
                b'(' => depth += 1,
                b')' => depth -= 1,
                b if b.is_ascii_whitespace() && depth <= 0 => break,
                _ => {}
            }
            i += 1;
        }
        tokens.push((start, i));
    }
    tokens
}

/// Split `value` on ASCII whitespace into non-empty tokens, preserving
/// parenthesized groups like `rgb(1, 2, 3)` or `url(...)` as single
/// tokens.
pub fn tokenize_value(value: &str) -> Vec<String> {
    tokenize_value_with_offsets(value)
        .into_iter()
        .map(|(s, e)| value[s..e].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_important_case_sensitively() {
        assert_eq!(strip_important("red !important"), ("red", true));
        assert_eq!(strip_important("red !Important"), ("red !Important", false));
        assert_eq!(strip_important("red"), ("red", false));
        assert_eq!(strip_important("red!important"), ("red", true));
    }

    #[test]
    fn tokenizes_preserving_parens() {
        let toks = tokenize_value("rgb(1, 2, 3) center / cover");
        assert_eq!(toks, vec!["rgb(1, 2, 3)", "center", "/", "cover"]);
    }

    #[test]
    fn custom_property_names_keep_case() {
        assert_eq!(normalize_property_name("--MyVar"), "--MyVar");
        assert_eq!(normalize_property_name("COLOR"), "color");
    }
}
