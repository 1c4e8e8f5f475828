//! `font` shorthand (spec.md §4.3). The token that "looks like" a
//! `font-size` (ends in a length unit, `%`, or a named size keyword)
//! anchors the parse: everything before it is style/variant/weight/
//! stretch (classified by keyword set, in any order, each defaulting to
//! `normal` when omitted), everything after — preserved as original
//! text rather than re-joined tokens, so multi-word family names and
//! comma-separated lists keep their exact formatting — is
//! `font-family`. A `/` inside the size token splits it into
//! `font-size` and `line-height`.

use super::keywords;
use super::{shared_importance, with_important, LonghandMap};
use crate::util::{strip_important, tokenize_value_with_offsets};

pub fn expand_font(value: &str) -> Option<LonghandMap> {
    let tokens = tokenize_value_with_offsets(value);
    if tokens.is_empty() {
        return None;
    }

    let mut size_idx = None;
    for (i, (s, e)) in tokens.iter().enumerate() {
        let word = &value[*s..*e];
        let size_part = word.split('/').next().unwrap_or(word);
        if keywords::looks_like_font_size(size_part) {
            size_idx = Some(i);
            break;
        }
    }
    let size_idx = size_idx?;

    let (size_start, size_end) = tokens[size_idx];
    let size_token = &value[size_start..size_end];
    let (size, line_height) = match size_token.split_once('/') {
        Some((s, lh)) => (s.to_string(), Some(lh.to_string())),
        None => (size_token.to_string(), None),
    };

    let mut style = None;
    let mut variant = None;
    let mut weight = None;
    let mut stretch = None;
    for (s, e) in &tokens[..size_idx] {
        let word = &value[*s..*e];
        let lower = word.to_ascii_lowercase();
        if keywords::FONT_WEIGHT.contains(lower.as_str()) && weight.is_none() {
            weight = Some(word.to_string());
        } else if lower == "small-caps" && variant.is_none() {
            variant = Some(word.to_string());
        } else if (lower == "italic" || lower == "oblique") && style.is_none() {
            style = Some(word.to_string());
        } else if keywords::FONT_STRETCH.contains(lower.as_str())
            && lower != "normal"
            && stretch.is_none()
        {
            stretch = Some(word.to_string());
        } else if lower != "normal" {
            return None; // unrecognized pre-size token
        }
    }

    let family_start = tokens
        .get(size_idx + 1)
        .map(|(s, _)| *s)
        .unwrap_or(size_end);
    let family = value[family_start..].trim();
    if family.is_empty() {
        return None;
    }

    let mut map = LonghandMap::new();
    map.insert("font-style".to_string(), style.unwrap_or_else(|| "normal".into()));
    map.insert("font-variant".to_string(), variant.unwrap_or_else(|| "normal".into()));
    map.insert("font-weight".to_string(), weight.unwrap_or_else(|| "normal".into()));
    map.insert("font-stretch".to_string(), stretch.unwrap_or_else(|| "normal".into()));
    map.insert("font-size".to_string(), size);
    map.insert(
        "line-height".to_string(),
        line_height.unwrap_or_else(|| "normal".into()),
    );
    map.insert("font-family".to_string(), family.to_string());
    Some(map)
}

/// Requires both `font-size` and `font-family`; omits `normal`-valued
/// style/variant/weight/stretch/line-height (spec.md §4.3).
pub fn create_font(map: &LonghandMap) -> Option<String> {
    let (size, size_i) = strip_important(map.get("font-size")?);
    let (family, family_i) = strip_important(map.get("font-family")?);

    let mut flags = vec![size_i, family_i];
    let mut prefix_parts = Vec::new();

    for key in ["font-style", "font-variant", "font-weight", "font-stretch"] {
        if let Some(raw) = map.get(key) {
            let (value, important) = strip_important(raw);
            if value != "normal" {
                prefix_parts.push(value.to_string());
                flags.push(important);
            }
        }
    }

    let mut size_part = size.to_string();
    if let Some(raw) = map.get("line-height") {
        let (lh, lh_i) = strip_important(raw);
        if lh != "normal" {
            size_part = format!("{}/{}", size, lh);
            flags.push(lh_i);
        }
    }

    let important = shared_importance(&flags)?;

    let mut out = prefix_parts;
    out.push(size_part);
    out.push(family.to_string());
    Some(with_important(out.join(" "), important))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_simple_font() {
        let map = expand_font("bold 12px Arial").unwrap();
        assert_eq!(map["font-weight"], "bold");
        assert_eq!(map["font-size"], "12px");
        assert_eq!(map["font-family"], "Arial");
        assert_eq!(map["font-style"], "normal");
    }

    #[test]
    fn expands_with_line_height_and_family_list() {
        let map = expand_font("italic bold 12px/1.5 Arial, sans-serif").unwrap();
        assert_eq!(map["font-style"], "italic");
        assert_eq!(map["font-size"], "12px");
        assert_eq!(map["line-height"], "1.5");
        assert_eq!(map["font-family"], "Arial, sans-serif");
    }

    #[test]
    fn preserves_multiword_family_names() {
        let map = expand_font("14px Times New Roman").unwrap();
        assert_eq!(map["font-family"], "Times New Roman");
    }

    #[test]
    fn creates_canonical_font_omitting_normals() {
        let mut map = LonghandMap::new();
        map.insert("font-size".into(), "12px".into());
        map.insert("font-family".into(), "Arial".into());
        map.insert("font-style".into(), "normal".into());
        map.insert("font-weight".into(), "bold".into());
        map.insert("line-height".into(), "normal".into());
        assert_eq!(create_font(&map).unwrap(), "bold 12px Arial");
    }

    #[test]
    fn requires_size_and_family() {
        let mut map = LonghandMap::new();
        map.insert("font-size".into(), "12px".into());
        assert!(create_font(&map).is_none());
    }
}
