//! Four-sided box shorthands: `margin`, `padding`, `border-color`,
//! `border-style`, `border-width` (spec.md §4.3). All five share one
//! expansion/contraction shape — the 1/2/3/4-value CSS box rule — so
//! they're generated from the same pair of functions parameterized by
//! the four longhand property names, the way the teacher's
//! `side_handler!` macro parameterizes one body over several physical/
//! logical property families in `properties/margin_padding.rs`.

use super::{shared_importance, with_important, LonghandMap};
use crate::util::{strip_important, tokenize_value};

pub const MARGIN_PROPS: [&str; 4] =
    ["margin-top", "margin-right", "margin-bottom", "margin-left"];
pub const PADDING_PROPS: [&str; 4] =
    ["padding-top", "padding-right", "padding-bottom", "padding-left"];
pub const BORDER_COLOR_PROPS: [&str; 4] = [
    "border-top-color",
    "border-right-color",
    "border-bottom-color",
    "border-left-color",
];
pub const BORDER_STYLE_PROPS: [&str; 4] = [
    "border-top-style",
    "border-right-style",
    "border-bottom-style",
    "border-left-style",
];
pub const BORDER_WIDTH_PROPS: [&str; 4] = [
    "border-top-width",
    "border-right-width",
    "border-bottom-width",
    "border-left-width",
];

/// Expand a 1/2/3/4-value box shorthand into `props[0..4]`
/// (top, right, bottom, left), per the CSS box-value rule:
/// 1 value -> all sides; 2 -> vertical/horizontal; 3 -> top/horizontal/
/// bottom; 4 -> clockwise from top.
pub fn expand_box(value: &str, props: [&str; 4]) -> Option<LonghandMap> {
    let tokens = tokenize_value(value);
    let (t, r, b, l) = match tokens.len() {
        1 => (tokens[0].clone(), tokens[0].clone(), tokens[0].clone(), tokens[0].clone()),
        2 => (tokens[0].clone(), tokens[1].clone(), tokens[0].clone(), tokens[1].clone()),
        3 => (tokens[0].clone(), tokens[1].clone(), tokens[2].clone(), tokens[1].clone()),
        4 => (tokens[0].clone(), tokens[1].clone(), tokens[2].clone(), tokens[3].clone()),
        _ => return None,
    };
    let mut map = LonghandMap::new();
    map.insert(props[0].to_string(), t);
    map.insert(props[1].to_string(), r);
    map.insert(props[2].to_string(), b);
    map.insert(props[3].to_string(), l);
    Some(map)
}

/// Generates a named `expand_<family>`/`create_<family>` pair delegating
/// to [`expand_box`]/[`create_box`] for one four-sided property family —
/// the same role the teacher's `side_handler!` macro plays in
/// `properties/margin_padding.rs`, generating one handler per physical/
/// logical side family from a single template.
macro_rules! box_family {
    ($fam:ident, $props:expr) => {
        paste::paste! {
            pub fn [<expand_ $fam>](value: &str) -> Option<LonghandMap> {
                expand_box(value, $props)
            }
            pub fn [<create_ $fam>](map: &LonghandMap) -> Option<String> {
                create_box(map, $props, false)
            }
        }
    };
}

box_family!(margin, MARGIN_PROPS);
box_family!(padding, PADDING_PROPS);
box_family!(border_color, BORDER_COLOR_PROPS);
box_family!(border_style, BORDER_STYLE_PROPS);
box_family!(border_width, BORDER_WIDTH_PROPS);

/// Collapse all four sides present in `map` under `props` into the
/// tightest 1/2/3/4-value form, or `None` if any side is missing or
/// importance disagrees across sides.
pub fn create_box(map: &LonghandMap, props: [&str; 4], _reserved: bool) -> Option<String> {
    let top = map.get(props[0])?;
    let right = map.get(props[1])?;
    let bottom = map.get(props[2])?;
    let left = map.get(props[3])?;

    let (top, top_i) = strip_important(top);
    let (right, right_i) = strip_important(right);
    let (bottom, bottom_i) = strip_important(bottom);
    let (left, left_i) = strip_important(left);
    let important = shared_importance(&[top_i, right_i, bottom_i, left_i])?;

    let collapsed = if top == right && right == bottom && bottom == left {
        top.to_string()
    } else if top == bottom && left == right {
        format!("{} {}", top, right)
    } else if left == right {
        format!("{} {} {}", top, right, bottom)
    } else {
        format!("{} {} {} {}", top, right, bottom, left)
    };

    Some(with_important(collapsed, important))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_single_value_to_all_sides() {
        let map = expand_box("1px", MARGIN_PROPS).unwrap();
        assert_eq!(map["margin-top"], "1px");
        assert_eq!(map["margin-left"], "1px");
    }

    #[test]
    fn expands_four_values_clockwise() {
        let map = expand_box("1px 2px 3px 4px", MARGIN_PROPS).unwrap();
        assert_eq!(map["margin-top"], "1px");
        assert_eq!(map["margin-right"], "2px");
        assert_eq!(map["margin-bottom"], "3px");
        assert_eq!(map["margin-left"], "4px");
    }

    #[test]
    fn collapses_all_equal_to_one_value() {
        let mut map = LonghandMap::new();
        for p in MARGIN_PROPS {
            map.insert(p.to_string(), "1px".to_string());
        }
        assert_eq!(create_box(&map, MARGIN_PROPS, false).unwrap(), "1px");
    }

    #[test]
    fn collapses_two_pairs_to_two_values() {
        let mut map = LonghandMap::new();
        map.insert("margin-top".into(), "1px".into());
        map.insert("margin-bottom".into(), "1px".into());
        map.insert("margin-left".into(), "2px".into());
        map.insert("margin-right".into(), "2px".into());
        assert_eq!(create_box(&map, MARGIN_PROPS, false).unwrap(), "1px 2px");
    }

    #[test]
    fn collapses_to_three_values_when_left_equals_right() {
        let mut map = LonghandMap::new();
        map.insert("margin-top".into(), "1px".into());
        map.insert("margin-bottom".into(), "3px".into());
        map.insert("margin-left".into(), "2px".into());
        map.insert("margin-right".into(), "2px".into());
        assert_eq!(create_box(&map, MARGIN_PROPS, false).unwrap(), "1px 2px 3px");
    }

    #[test]
    fn four_distinct_values_stay_four() {
        let mut map = LonghandMap::new();
        map.insert("margin-top".into(), "1px".into());
        map.insert("margin-right".into(), "2px".into());
        map.insert("margin-bottom".into(), "3px".into());
        map.insert("margin-left".into(), "4px".into());
        assert_eq!(create_box(&map, MARGIN_PROPS, false).unwrap(), "1px 2px 3px 4px");
    }

    #[test]
    fn refuses_on_missing_side() {
        let mut map = LonghandMap::new();
        map.insert("margin-top".into(), "1px".into());
        assert!(create_box(&map, MARGIN_PROPS, false).is_none());
    }

    #[test]
    fn refuses_on_mismatched_importance() {
        let mut map = LonghandMap::new();
        map.insert("margin-top".into(), "1px !important".into());
        map.insert("margin-right".into(), "1px".into());
        map.insert("margin-bottom".into(), "1px".into());
        map.insert("margin-left".into(), "1px".into());
        assert!(create_box(&map, MARGIN_PROPS, false).is_none());
    }
}
