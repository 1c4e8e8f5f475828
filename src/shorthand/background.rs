//! `background` shorthand (spec.md §4.3): split on `/` to separate
//! position from size, then classify each remaining token against the
//! repeat/attachment/position/color keyword sets, falling back to color
//! for anything else, and to image for `url(...)`/`none`.

use super::keywords;
use super::{shared_importance, with_important, LonghandMap};
use crate::util::{strip_important, tokenize_value};

/// Tokenize `value` and normalize any token that embeds a bare `/`
/// (e.g. `center/cover`) into three tokens (`center`, `/`, `cover`) so
/// the position/size split below only has to look for a literal `/`
/// token.
fn tokenize_splitting_slash(value: &str) -> Vec<String> {
    let mut out = Vec::new();
    for token in tokenize_value(value) {
        let lower = token.to_ascii_lowercase();
        if token != "/" && token.contains('/') && !lower.starts_with("url(") {
            if let Some(idx) = token.find('/') {
                let (left, right) = (&token[..idx], &token[idx + 1..]);
                if !left.is_empty() {
                    out.push(left.to_string());
                }
                out.push("/".to_string());
                if !right.is_empty() {
                    out.push(right.to_string());
                }
                continue;
            }
        }
        out.push(token);
    }
    out
}

pub fn expand_background(value: &str) -> Option<LonghandMap> {
    let tokens = tokenize_splitting_slash(value);
    if tokens.is_empty() {
        return None;
    }

    let (main, size) = match tokens.iter().position(|t| t == "/") {
        Some(idx) => (&tokens[..idx], &tokens[idx + 1..]),
        None => (&tokens[..], &[][..]),
    };

    let mut color = None;
    let mut image = None;
    let mut repeat = None;
    let mut attachment = None;
    let mut position: Vec<String> = Vec::new();

    for token in main {
        let lower = token.to_ascii_lowercase();
        if keywords::looks_like_url_or_none(token) && image.is_none() {
            image = Some(token.clone());
        } else if keywords::BACKGROUND_REPEAT.contains(lower.as_str()) && repeat.is_none() {
            repeat = Some(token.clone());
        } else if keywords::BACKGROUND_ATTACHMENT.contains(lower.as_str()) && attachment.is_none()
        {
            attachment = Some(token.clone());
        } else if keywords::BACKGROUND_POSITION.contains(lower.as_str())
            || keywords::is_digit_led(token)
            || lower.ends_with('%')
        {
            position.push(token.clone());
        } else if keywords::looks_like_color(token) && color.is_none() {
            color = Some(token.clone());
        } else {
            return None;
        }
    }

    let mut map = LonghandMap::new();
    if let Some(c) = color {
        map.insert("background-color".to_string(), c);
    }
    if let Some(i) = image {
        map.insert("background-image".to_string(), i);
    }
    if let Some(r) = repeat {
        map.insert("background-repeat".to_string(), r);
    }
    if let Some(a) = attachment {
        map.insert("background-attachment".to_string(), a);
    }
    if !position.is_empty() {
        map.insert("background-position".to_string(), position.join(" "));
    }
    if !size.is_empty() {
        map.insert("background-size".to_string(), size.join(" "));
    }

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

const CANONICAL_ORDER: &[&str] = &[
    "background-color",
    "background-image",
    "background-repeat",
    "background-attachment",
    "background-position",
];

/// Requires at least two components; emits `color image repeat
/// attachment position / size` in canonical order (spec.md §4.3).
pub fn create_background(map: &LonghandMap) -> Option<String> {
    let mut parts = Vec::new();
    let mut flags = Vec::new();
    let mut position_idx = None;

    for key in CANONICAL_ORDER {
        if let Some(value) = map.get(*key) {
            let (value, important) = strip_important(value);
            if *key == "background-position" {
                position_idx = Some(parts.len());
            }
            parts.push(value.to_string());
            flags.push(important);
        }
    }

    let size = map.get("background-size").map(|v| strip_important(v));
    if let Some((size, important)) = size {
        if let Some(pos_idx) = position_idx {
            parts[pos_idx] = format!("{} / {}", parts[pos_idx], size);
        } else {
            parts.push(format!("/ {}", size));
        }
        flags.push(important);
    }

    if parts.len() < 2 {
        return None;
    }

    let important = shared_importance(&flags)?;
    Some(with_important(parts.join(" "), important))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_color_and_repeat() {
        let map = expand_background("red no-repeat").unwrap();
        assert_eq!(map["background-color"], "red");
        assert_eq!(map["background-repeat"], "no-repeat");
    }

    #[test]
    fn expands_position_and_size() {
        let map = expand_background("center / cover").unwrap();
        assert_eq!(map["background-position"], "center");
        assert_eq!(map["background-size"], "cover");
    }

    #[test]
    fn expands_compact_slash_form() {
        let map = expand_background("center/cover").unwrap();
        assert_eq!(map["background-position"], "center");
        assert_eq!(map["background-size"], "cover");
    }

    #[test]
    fn expands_url_image() {
        let map = expand_background("url(a.png) repeat-x").unwrap();
        assert_eq!(map["background-image"], "url(a.png)");
        assert_eq!(map["background-repeat"], "repeat-x");
    }

    #[test]
    fn create_requires_at_least_two_components() {
        let mut map = LonghandMap::new();
        map.insert("background-color".into(), "red".into());
        assert!(create_background(&map).is_none());
    }

    #[test]
    fn create_combines_position_and_size_with_slash() {
        let mut map = LonghandMap::new();
        map.insert("background-color".into(), "red".into());
        map.insert("background-position".into(), "center".into());
        map.insert("background-size".into(), "cover".into());
        assert_eq!(create_background(&map).unwrap(), "red center / cover");
    }
}
