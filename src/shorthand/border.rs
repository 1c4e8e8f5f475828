//! `border` / `border-{side}` shorthand (spec.md §4.3).
//!
//! Expansion classifies each space-delimited token as a width, a style,
//! or (by elimination) a color, and emits either all four sides (plain
//! `border`) or one side (`border-{side}`). Contraction works the other
//! way: it expects `border-width`/`border-style`/`border-color` to
//! already have been collapsed to single shorthand strings by
//! [`super::sides`] (spec.md §4.6.4 runs the four-sided families before
//! `border`) and combines those three into one value.

use super::keywords;
use super::{shared_importance, with_important, LonghandMap};
use crate::util::{strip_important, tokenize_value};

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];

enum TokenKind {
    Width,
    Style,
    Color,
}

fn classify(token: &str) -> TokenKind {
    let lower = token.to_ascii_lowercase();
    if keywords::BORDER_WIDTH.contains(lower.as_str()) || keywords::is_digit_led(token) {
        TokenKind::Width
    } else if keywords::BORDER_STYLE.contains(lower.as_str()) {
        TokenKind::Style
    } else {
        TokenKind::Color
    }
}

/// `side`: `None` for plain `border` (applies to all four sides),
/// `Some("top"|"right"|"bottom"|"left")` for `border-{side}`.
pub fn expand_border(value: &str, side: Option<&str>) -> Option<LonghandMap> {
    let tokens = tokenize_value(value);
    if tokens.is_empty() || tokens.len() > 3 {
        return None;
    }

    let mut width = None;
    let mut style = None;
    let mut color = None;
    for token in &tokens {
        match classify(token) {
            TokenKind::Width if width.is_none() => width = Some(token.clone()),
            TokenKind::Style if style.is_none() => style = Some(token.clone()),
            TokenKind::Color if color.is_none() => color = Some(token.clone()),
            _ => return None, // duplicate component kind: malformed shorthand
        }
    }

    let mut map = LonghandMap::new();
    let sides: &[&str] = match side {
        Some(s) => std::slice::from_ref(&SIDES[SIDES.iter().position(|x| *x == s)?]),
        None => &SIDES,
    };
    for s in sides {
        if let Some(w) = &width {
            map.insert(format!("border-{}-width", s), w.clone());
        }
        if let Some(st) = &style {
            map.insert(format!("border-{}-style", s), st.clone());
        }
        if let Some(c) = &color {
            map.insert(format!("border-{}-color", s), c.clone());
        }
    }
    Some(map)
}

/// Combine already-collapsed `border-width`/`border-style`/`border-color`
/// entries into one `border` shorthand. Requires `border-style`;
/// refuses if any present component is itself a multi-token (space
/// containing) value, since `border` cannot express per-side values.
pub fn create_border(map: &LonghandMap) -> Option<String> {
    let (style, style_i) = strip_important(map.get("border-style")?);
    if style.contains(' ') {
        return None;
    }

    let mut parts = Vec::new();
    let mut flags = vec![style_i];

    if let Some(width) = map.get("border-width") {
        let (width, width_i) = strip_important(width);
        if width.contains(' ') {
            return None;
        }
        parts.push(width.to_string());
        flags.push(width_i);
    }

    parts.push(style.to_string());

    if let Some(color) = map.get("border-color") {
        let (color, color_i) = strip_important(color);
        if color.contains(' ') {
            return None;
        }
        parts.push(color.to_string());
        flags.push(color_i);
    }

    let important = shared_importance(&flags)?;
    Some(with_important(parts.join(" "), important))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_plain_border_to_all_sides() {
        let map = expand_border("1px solid red", None).unwrap();
        assert_eq!(map["border-top-width"], "1px");
        assert_eq!(map["border-left-style"], "solid");
        assert_eq!(map["border-bottom-color"], "red");
    }

    #[test]
    fn expands_border_side_to_one_side_only() {
        let map = expand_border("2px dashed blue", Some("top")).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map["border-top-width"], "2px");
        assert!(!map.contains_key("border-left-width"));
    }

    #[test]
    fn creates_border_from_collapsed_components() {
        let mut map = LonghandMap::new();
        map.insert("border-width".into(), "1px".into());
        map.insert("border-style".into(), "solid".into());
        map.insert("border-color".into(), "red".into());
        assert_eq!(create_border(&map).unwrap(), "1px solid red");
    }

    #[test]
    fn requires_border_style() {
        let mut map = LonghandMap::new();
        map.insert("border-width".into(), "1px".into());
        assert!(create_border(&map).is_none());
    }

    #[test]
    fn refuses_multi_token_components() {
        let mut map = LonghandMap::new();
        map.insert("border-style".into(), "solid".into());
        map.insert("border-width".into(), "1px 2px".into());
        assert!(create_border(&map).is_none());
    }
}
