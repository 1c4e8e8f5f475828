//! Fixed keyword sets used to classify shorthand value tokens (spec.md
//! §4.3). Built once per process with `lazy_static`, mirroring the
//! teacher's precomputed-keyword-table convention (e.g. the vendor
//! prefix / feature-compat tables in `compat.rs`).

use lazy_static::lazy_static;
use std::collections::HashSet;

const LENGTH_UNITS: &[&str] = &[
    "px", "em", "rem", "ex", "ch", "vw", "vh", "vmin", "vmax", "cm", "mm", "in", "pt", "pc", "q",
    "fr",
];

const NAMED_SIZES: &[&str] = &[
    "xx-small",
    "x-small",
    "small",
    "medium",
    "large",
    "x-large",
    "xx-large",
    "xxx-large",
    "smaller",
    "larger",
];

const BORDER_WIDTH_KEYWORDS: &[&str] = &["thin", "medium", "thick", "inherit"];

const BORDER_STYLE_KEYWORDS: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

const FONT_STYLE_KEYWORDS: &[&str] = &["italic", "oblique", "normal"];
const FONT_VARIANT_KEYWORDS: &[&str] = &["small-caps", "normal"];
const FONT_WEIGHT_KEYWORDS: &[&str] = &[
    "normal", "bold", "bolder", "lighter", "100", "200", "300", "400", "500", "600", "700", "800",
    "900",
];
const FONT_STRETCH_KEYWORDS: &[&str] = &[
    "ultra-condensed",
    "extra-condensed",
    "condensed",
    "semi-condensed",
    "normal",
    "semi-expanded",
    "expanded",
    "extra-expanded",
    "ultra-expanded",
];

const BACKGROUND_REPEAT_KEYWORDS: &[&str] =
    &["repeat", "repeat-x", "repeat-y", "no-repeat", "space", "round"];
const BACKGROUND_ATTACHMENT_KEYWORDS: &[&str] = &["scroll", "fixed", "local"];
const BACKGROUND_POSITION_KEYWORDS: &[&str] = &["top", "bottom", "left", "right", "center"];

const LIST_STYLE_POSITION_KEYWORDS: &[&str] = &["inside", "outside"];
const LIST_STYLE_TYPE_KEYWORDS: &[&str] = &[
    "disc",
    "circle",
    "square",
    "decimal",
    "decimal-leading-zero",
    "lower-roman",
    "upper-roman",
    "lower-greek",
    "lower-latin",
    "upper-latin",
    "armenian",
    "georgian",
    "lower-alpha",
    "upper-alpha",
    "none",
];

const NAMED_COLORS: &[&str] = &[
    "transparent",
    "currentcolor",
    "black",
    "silver",
    "gray",
    "grey",
    "white",
    "maroon",
    "red",
    "purple",
    "fuchsia",
    "green",
    "lime",
    "olive",
    "yellow",
    "navy",
    "blue",
    "teal",
    "aqua",
    "orange",
    "aliceblue",
    "antiquewhite",
    "rebeccapurple",
];

macro_rules! keyword_set {
    ($name:ident, $list:expr) => {
        lazy_static! {
            pub static ref $name: HashSet<&'static str> = $list.iter().copied().collect();
        }
    };
}

keyword_set!(BORDER_WIDTH, BORDER_WIDTH_KEYWORDS);
keyword_set!(BORDER_STYLE, BORDER_STYLE_KEYWORDS);
keyword_set!(FONT_STYLE, FONT_STYLE_KEYWORDS);
keyword_set!(FONT_VARIANT, FONT_VARIANT_KEYWORDS);
keyword_set!(FONT_WEIGHT, FONT_WEIGHT_KEYWORDS);
keyword_set!(FONT_STRETCH, FONT_STRETCH_KEYWORDS);
keyword_set!(BACKGROUND_REPEAT, BACKGROUND_REPEAT_KEYWORDS);
keyword_set!(BACKGROUND_ATTACHMENT, BACKGROUND_ATTACHMENT_KEYWORDS);
keyword_set!(BACKGROUND_POSITION, BACKGROUND_POSITION_KEYWORDS);
keyword_set!(LIST_STYLE_POSITION, LIST_STYLE_POSITION_KEYWORDS);
keyword_set!(LIST_STYLE_TYPE, LIST_STYLE_TYPE_KEYWORDS);
keyword_set!(NAMED_COLOR, NAMED_COLORS);

/// True if `token` (case-insensitively) ends in a recognized CSS length
/// unit, is `%`-suffixed, or is a named absolute/relative font size
/// keyword — the `font-size` detector described in spec.md §4.3.
pub fn looks_like_font_size(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    if NAMED_SIZES.contains(&lower.as_str()) {
        return true;
    }
    if lower.ends_with('%') && lower[..lower.len() - 1].parse::<f64>().is_ok() {
        return true;
    }
    for unit in LENGTH_UNITS {
        if let Some(num_part) = lower.strip_suffix(unit) {
            if !num_part.is_empty() && is_number_lead(num_part) {
                return true;
            }
        }
    }
    false
}

/// True if `token` is "digit-led": starts with a digit, a sign followed
/// by a digit/dot, or a bare decimal point followed by a digit — the
/// width-vs-style-vs-color tiebreak in spec.md §4.3's `border` expander.
pub fn is_digit_led(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('+') | Some('-') => matches!(chars.next(), Some(c) if c.is_ascii_digit() || c == '.'),
        Some('.') => matches!(chars.next(), Some(c) if c.is_ascii_digit()),
        _ => false,
    }
}

fn is_number_lead(s: &str) -> bool {
    let s = s.strip_prefix('+').or_else(|| s.strip_prefix('-')).unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || c == '.')
}

pub fn looks_like_color(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    lower.starts_with('#')
        || lower.starts_with("rgb(")
        || lower.starts_with("rgba(")
        || lower.starts_with("hsl(")
        || lower.starts_with("hsla(")
        || lower.starts_with("hwb(")
        || lower.starts_with("var(")
        || NAMED_COLOR.contains(lower.as_str())
}

pub fn looks_like_url_or_none(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    lower.starts_with("url(") || lower == "none"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_font_size_tokens() {
        assert!(looks_like_font_size("12px"));
        assert!(looks_like_font_size("150%"));
        assert!(looks_like_font_size("large"));
        assert!(!looks_like_font_size("bold"));
    }

    #[test]
    fn detects_digit_led_widths() {
        assert!(is_digit_led("1px"));
        assert!(is_digit_led(".5em"));
        assert!(is_digit_led("-2px"));
        assert!(!is_digit_led("thin"));
        assert!(!is_digit_led("red"));
    }
}
