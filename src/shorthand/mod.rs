//! The shorthand engine (spec.md §4.3): bidirectional expansion and
//! contraction between CSS shorthand properties and their longhands.
//!
//! Dispatch is a straightforward match on the property name — the
//! teacher dispatches by first-character-plus-strcmp in its typed
//! `Property` enum parser; spec.md §9 notes this becomes "a small
//! perfect-hash or a match on an enum" in a host-language port, and a
//! plain `match` on `&str` is that for us, since our properties are
//! strings rather than a typed enum.

pub mod background;
pub mod border;
pub mod font;
pub mod keywords;
pub mod list_style;
pub mod sides;

use indexmap::IndexMap;

/// An ordered property name -> value-text mapping. Order matters: the
/// cascade engine's working table (spec.md §4.6, §9) is specified to be
/// an ordered map so that shorthand recreation/removal is stable, and
/// `expand_shorthand`'s output is threaded straight into that table, so
/// it uses the same representation.
pub type LonghandMap = IndexMap<String, String>;

/// Expand a shorthand `value` for `property` into its longhands.
/// Returns `None` if `property` is not a recognized shorthand, or if the
/// value doesn't parse into a valid expansion (spec.md §4.3, §6).
pub fn expand_shorthand(property: &str, value: &str) -> Option<LonghandMap> {
    let (value, important) = crate::util::strip_important(value);
    let mut map = match property.to_ascii_lowercase().as_str() {
        "margin" => sides::expand_margin(value),
        "padding" => sides::expand_padding(value),
        "border-color" => sides::expand_border_color(value),
        "border-style" => sides::expand_border_style(value),
        "border-width" => sides::expand_border_width(value),
        "border" => border::expand_border(value, None),
        "border-top" => border::expand_border(value, Some("top")),
        "border-right" => border::expand_border(value, Some("right")),
        "border-bottom" => border::expand_border(value, Some("bottom")),
        "border-left" => border::expand_border(value, Some("left")),
        "background" => background::expand_background(value),
        "font" => font::expand_font(value),
        "list-style" => list_style::expand_list_style(value),
        _ => None,
    }?;

    if important {
        for v in map.values_mut() {
            v.push_str(" !important");
        }
    }
    Some(map)
}

/// Recreate the tightest shorthand string for `kind` from a longhand
/// `map`, or `None` if the map doesn't qualify (spec.md §4.3, §6).
/// `kind` is the shorthand property name being recreated, e.g.
/// `"margin"` or `"border"`.
pub fn create_shorthand(kind: &str, map: &LonghandMap) -> Option<String> {
    match kind.to_ascii_lowercase().as_str() {
        "margin" => sides::create_margin(map),
        "padding" => sides::create_padding(map),
        "border-color" => sides::create_border_color(map),
        "border-style" => sides::create_border_style(map),
        "border-width" => sides::create_border_width(map),
        "border" => border::create_border(map),
        "background" => background::create_background(map),
        "font" => font::create_font(map),
        "list-style" => list_style::create_list_style(map),
        _ => None,
    }
}

/// True if `property` is one of the shorthands the cascade engine must
/// expand before resolving precedence (spec.md §4.6.3.b).
pub fn is_shorthand(property: &str) -> bool {
    matches!(
        property.to_ascii_lowercase().as_str(),
        "margin"
            | "padding"
            | "border-color"
            | "border-style"
            | "border-width"
            | "border"
            | "border-top"
            | "border-right"
            | "border-bottom"
            | "border-left"
            | "background"
            | "font"
            | "list-style"
    )
}

/// Checks that every value present in `values` shares the same
/// important flag; returns that shared flag, or `None` on mismatch.
/// Every creator refuses on mismatched importance (spec.md §4.3, last
/// line).
pub(crate) fn shared_importance(flags: &[bool]) -> Option<bool> {
    let first = *flags.first()?;
    if flags.iter().all(|f| *f == first) {
        Some(first)
    } else {
        None
    }
}

pub(crate) fn with_important(value: String, important: bool) -> String {
    if important {
        format!("{} !important", value)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_property_is_not_a_shorthand() {
        assert!(!is_shorthand("color"));
        assert!(is_shorthand("margin"));
        assert!(is_shorthand("border-top"));
    }

    #[test]
    fn expand_propagates_important_to_all_longhands() {
        let map = expand_shorthand("margin", "1px !important").unwrap();
        assert_eq!(map.len(), 4);
        for v in map.values() {
            assert!(v.ends_with("!important"));
        }
    }

    #[test]
    fn unknown_shorthand_returns_none() {
        assert!(expand_shorthand("color", "red").is_none());
        assert!(create_shorthand("color", &LonghandMap::new()).is_none());
    }
}
