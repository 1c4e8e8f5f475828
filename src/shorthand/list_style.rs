//! `list-style` shorthand (spec.md §4.3): classify each token as image
//! (`url(...)`), position (`inside`/`outside`), or type (a fixed keyword
//! set, e.g. `disc`, `decimal`, `georgian`).

use super::keywords;
use super::{shared_importance, with_important, LonghandMap};
use crate::util::{strip_important, tokenize_value};

pub fn expand_list_style(value: &str) -> Option<LonghandMap> {
    let tokens = tokenize_value(value);
    if tokens.is_empty() {
        return None;
    }

    let mut image = None;
    let mut position = None;
    let mut kind = None;

    for token in &tokens {
        let lower = token.to_ascii_lowercase();
        if lower.starts_with("url(") && image.is_none() {
            image = Some(token.clone());
        } else if keywords::LIST_STYLE_POSITION.contains(lower.as_str()) && position.is_none() {
            position = Some(token.clone());
        } else if keywords::LIST_STYLE_TYPE.contains(lower.as_str()) && kind.is_none() {
            kind = Some(token.clone());
        } else if lower == "none" {
            // `none` may cancel either the marker image or the type;
            // prefer filling whichever slot is still empty.
            if kind.is_none() {
                kind = Some(token.clone());
            } else if image.is_none() {
                image = Some(token.clone());
            } else {
                return None;
            }
        } else {
            return None;
        }
    }

    let mut map = LonghandMap::new();
    if let Some(k) = kind {
        map.insert("list-style-type".to_string(), k);
    }
    if let Some(p) = position {
        map.insert("list-style-position".to_string(), p);
    }
    if let Some(i) = image {
        map.insert("list-style-image".to_string(), i);
    }

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

const CANONICAL_ORDER: &[&str] = &["list-style-type", "list-style-position", "list-style-image"];

/// Requires at least one component present (spec.md §4.3).
pub fn create_list_style(map: &LonghandMap) -> Option<String> {
    let mut parts = Vec::new();
    let mut flags = Vec::new();

    for key in CANONICAL_ORDER {
        if let Some(value) = map.get(*key) {
            let (value, important) = strip_important(value);
            parts.push(value.to_string());
            flags.push(important);
        }
    }

    if parts.is_empty() {
        return None;
    }

    let important = shared_importance(&flags)?;
    Some(with_important(parts.join(" "), important))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_type_and_position() {
        let map = expand_list_style("square inside").unwrap();
        assert_eq!(map["list-style-type"], "square");
        assert_eq!(map["list-style-position"], "inside");
    }

    #[test]
    fn expands_url_image() {
        let map = expand_list_style("url(a.png)").unwrap();
        assert_eq!(map["list-style-image"], "url(a.png)");
    }

    #[test]
    fn creates_from_single_component() {
        let mut map = LonghandMap::new();
        map.insert("list-style-type".into(), "disc".into());
        assert_eq!(create_list_style(&map).unwrap(), "disc");
    }
}
