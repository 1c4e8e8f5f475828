//! Cascade/flatten engine (spec.md §4.6): collapses a parsed stylesheet
//! into one Rule per distinct selector, applying standard CSS cascade
//! precedence (importance, then specificity, then source order) and
//! recreating shorthands from the surviving longhands.
//!
//! No direct teacher analogue at the file level; grounded in the
//! teacher's `DeclarationHandler` idea in `stylesheet.rs`'s minifier of
//! handlers collapsing same-property declarations, and in
//! `properties/margin_padding.rs`'s flush-on-category-change pattern for
//! ordered precedence resolution.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::model::{AtRule, Declaration, IdList, NestingStyle, Rule, RuleNode, Stylesheet};
use crate::shorthand::{self, LonghandMap};
use crate::specificity;
use crate::util::strip_important;

struct Entry {
    source_order: u64,
    specificity: u32,
    important: bool,
    value: String,
}

/// The cascade working table (spec.md §4.6.3, §9): an ordered
/// `property -> Entry` map. Order must be stable (recreated shorthands
/// are removed/reinserted in place), which is what `indexmap::IndexMap`
/// buys us; the hasher underneath doesn't affect iteration order, so it
/// is swapped for `ahash`'s faster (non-DoS-resistant) hasher, the same
/// trade the teacher makes for its own internal maps where the keys are
/// trusted property names rather than adversarial input.
type Table = IndexMap<String, Entry, ahash::RandomState>;

/// Shorthand families in recreation order (spec.md §4.6.4): four-sided
/// families first, then `border`, `list-style`, `font`, `background`,
/// each paired with its component longhand names.
const FAMILIES: &[(&str, &[&str])] = &[
    ("margin", &["margin-top", "margin-right", "margin-bottom", "margin-left"]),
    ("padding", &["padding-top", "padding-right", "padding-bottom", "padding-left"]),
    (
        "border-width",
        &["border-top-width", "border-right-width", "border-bottom-width", "border-left-width"],
    ),
    (
        "border-style",
        &["border-top-style", "border-right-style", "border-bottom-style", "border-left-style"],
    ),
    (
        "border-color",
        &["border-top-color", "border-right-color", "border-bottom-color", "border-left-color"],
    ),
    ("border", &["border-width", "border-style", "border-color"]),
    ("list-style", &["list-style-type", "list-style-position", "list-style-image"]),
    (
        "font",
        &["font-style", "font-variant", "font-weight", "font-stretch", "font-size", "line-height", "font-family"],
    ),
    (
        "background",
        &[
            "background-color",
            "background-image",
            "background-repeat",
            "background-attachment",
            "background-position",
            "background-size",
        ],
    ),
];

/// Cascade precedence (spec.md §4.6.3.c): new-important beats
/// existing-not-important unconditionally; existing-important beats
/// new-not-important unconditionally; same importance -> higher
/// specificity wins; equal specificity -> later source order wins.
fn upsert(table: &mut Table, prop: String, value: String, important: bool, source_order: u64, specificity: u32) {
    match table.get(&prop) {
        None => {
            table.insert(prop, Entry { source_order, specificity, important, value });
        }
        Some(existing) => {
            let replace = if important && !existing.important {
                true
            } else if !important && existing.important {
                false
            } else if specificity != existing.specificity {
                specificity > existing.specificity
            } else {
                source_order > existing.source_order
            };
            if replace {
                table.insert(prop, Entry { source_order, specificity, important, value });
            }
        }
    }
}

fn apply_declaration(table: &mut Table, decl: &Declaration, source_order: u64, specificity: u32) {
    if shorthand::is_shorthand(&decl.property) {
        let value_with_flag = shorthand::with_important(decl.value.clone(), decl.important);
        if let Some(map) = shorthand::expand_shorthand(&decl.property, &value_with_flag) {
            for (k, v) in map {
                let (clean, important) = strip_important(&v);
                upsert(table, k, clean.to_string(), important, source_order, specificity);
            }
            return;
        }
    }
    upsert(table, decl.property.clone(), decl.value.clone(), decl.important, source_order, specificity);
}

/// Per-family minimum component count the cascade's recreation step
/// requires before even attempting `create_shorthand` (spec.md §4.6.4).
/// `background` already enforces its own >= 2 via `create_background`;
/// `list-style` does not (its standalone creator accepts a single
/// component, per spec.md §4.3), so the cascade step enforces it here.
fn min_components(kind: &str) -> usize {
    match kind {
        "list-style" => 2,
        _ => 1,
    }
}

fn recreate_shorthands(table: &mut Table) {
    for (kind, components) in FAMILIES {
        if table.contains_key(*kind) {
            continue;
        }
        let mut submap = LonghandMap::new();
        for comp in *components {
            if let Some(entry) = table.get(*comp) {
                submap.insert(comp.to_string(), shorthand::with_important(entry.value.clone(), entry.important));
            }
        }
        if submap.len() < min_components(kind) {
            continue;
        }
        if let Some(shorthand_value) = shorthand::create_shorthand(kind, &submap) {
            let (clean, important) = strip_important(&shorthand_value);
            let mut max_order = 0u64;
            let mut max_specificity = 0u32;
            for comp in *components {
                if let Some(e) = table.get(*comp) {
                    max_order = max_order.max(e.source_order);
                    max_specificity = max_specificity.max(e.specificity);
                }
            }
            for comp in *components {
                table.shift_remove(*comp);
            }
            table.insert(
                kind.to_string(),
                Entry {
                    source_order: max_order,
                    specificity: max_specificity,
                    important,
                    value: clean.to_string(),
                },
            );
        }
    }
}

fn candidate_list_id(sheet: &Stylesheet, indices: &[usize]) -> Option<u32> {
    let first = sheet.rules[*indices.first()?].as_style()?.selector_list_id?;
    let all_match = indices
        .iter()
        .all(|&i| sheet.rules[i].as_style().map(|r| r.selector_list_id) == Some(Some(first)));
    all_match.then_some(first)
}

fn merge_group(sheet: &Stylesheet, indices: &[usize]) -> (Vec<Declaration>, Option<u32>) {
    let list_id = candidate_list_id(sheet, indices);
    let mut table: Table = Table::default();
    for &i in indices {
        let r = sheet.rules[i].as_style().expect("grouped index must be a style rule");
        for (j, decl) in r.declarations.iter().enumerate() {
            let source_order = (r.id as u64) * 1000 + j as u64;
            apply_declaration(&mut table, decl, source_order, r.specificity);
        }
    }
    recreate_shorthands(&mut table);
    let declarations = table.into_iter().map(|(p, e)| Declaration::new(p, e.value, e.important)).collect();
    (declarations, list_id)
}

/// Group rules sharing a `selector_list_id` and either keep the id on
/// every rule in the group (if >= 2 share identical declarations) or
/// clear it everywhere (spec.md §4.6 step 6).
fn reconcile_selector_lists(out_rules: &mut [RuleNode]) -> IndexMap<u32, IdList> {
    let mut buckets: IndexMap<u32, Vec<usize>> = IndexMap::new();
    for (i, node) in out_rules.iter().enumerate() {
        if let RuleNode::Style(r) = node {
            if let Some(id) = r.selector_list_id {
                buckets.entry(id).or_default().push(i);
            }
        }
    }

    for indices in buckets.values() {
        if indices.len() < 2 {
            for &i in indices {
                if let RuleNode::Style(r) = &mut out_rules[i] {
                    r.selector_list_id = None;
                }
            }
            continue;
        }
        let reference = match &out_rules[indices[0]] {
            RuleNode::Style(r) => r.declarations.clone(),
            RuleNode::AtRuleNode(_) => unreachable!("bucket only contains style rule indices"),
        };
        let matching: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| matches!(&out_rules[i], RuleNode::Style(r) if r.declarations == reference))
            .collect();
        let keep = matching.len() >= 2;
        for &i in indices {
            if !keep || !matching.contains(&i) {
                if let RuleNode::Style(r) = &mut out_rules[i] {
                    r.selector_list_id = None;
                }
            }
        }
    }

    let mut final_map = IndexMap::new();
    for (i, node) in out_rules.iter().enumerate() {
        if let RuleNode::Style(r) = node {
            if let Some(id) = r.selector_list_id {
                final_map.entry(id).or_insert_with(IdList::new).push(i as u32);
            }
        }
    }
    final_map
}

/// Flatten `sheet` into one Rule per distinct selector string (spec.md
/// §4.6).
pub fn flatten(sheet: &Stylesheet) -> Stylesheet {
    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (idx, node) in sheet.rules.iter().enumerate() {
        if let RuleNode::Style(r) = node {
            if !r.declarations.is_empty() {
                groups.entry(r.selector.clone()).or_default().push(idx);
            }
        }
    }

    let mut emitted_selectors: HashSet<String> = HashSet::new();
    let mut out_rules: Vec<RuleNode> = Vec::new();

    for node in &sheet.rules {
        match node {
            RuleNode::AtRuleNode(ar) => {
                out_rules.push(RuleNode::AtRuleNode(AtRule { id: 0, ..ar.clone() }));
            }
            RuleNode::Style(r) => {
                if r.declarations.is_empty() || emitted_selectors.contains(&r.selector) {
                    continue;
                }
                emitted_selectors.insert(r.selector.clone());
                let indices = &groups[&r.selector];
                let (declarations, candidate_list_id) = merge_group(sheet, indices);
                out_rules.push(RuleNode::Style(Rule {
                    id: 0,
                    selector: r.selector.clone(),
                    specificity: specificity::specificity(&r.selector),
                    declarations,
                    parent_rule_id: None,
                    nesting_style: NestingStyle::None,
                    selector_list_id: candidate_list_id,
                    media_query_id: r.media_query_id,
                }));
            }
        }
    }

    for (i, node) in out_rules.iter_mut().enumerate() {
        match node {
            RuleNode::Style(r) => r.id = i as u32,
            RuleNode::AtRuleNode(a) => a.id = i as u32,
        }
    }

    let selector_lists = reconcile_selector_lists(&mut out_rules);
    let last_rule_id = out_rules.len() as u32;

    Stylesheet {
        rules: out_rules,
        imports: sheet.imports.clone(),
        media_queries: sheet.media_queries.clone(),
        media_query_lists: sheet.media_query_lists.clone(),
        selector_lists,
        media_index: IndexMap::new(),
        charset: sheet.charset.clone(),
        has_nesting: false,
        last_rule_id,
    }
}

/// Single-rule rollup (spec.md §4.6, "Single-rule rollup"; see
/// SPEC_FULL.md §D's Open Question resolution): merges every style
/// rule's declarations into one working table regardless of selector,
/// and emits a single Rule.
pub fn flatten_merge(sheet: &Stylesheet) -> Stylesheet {
    let style_indices: Vec<usize> = sheet
        .rules
        .iter()
        .enumerate()
        .filter_map(|(i, n)| match n {
            RuleNode::Style(r) if !r.declarations.is_empty() => Some(i),
            _ => None,
        })
        .collect();

    let mut table: Table = Table::default();
    for &i in &style_indices {
        let r = sheet.rules[i].as_style().expect("filtered index must be a style rule");
        for (j, decl) in r.declarations.iter().enumerate() {
            let source_order = (r.id as u64) * 1000 + j as u64;
            apply_declaration(&mut table, decl, source_order, r.specificity);
        }
    }
    recreate_shorthands(&mut table);
    let declarations: Vec<Declaration> = table.into_iter().map(|(p, e)| Declaration::new(p, e.value, e.important)).collect();

    let unique_selectors: HashSet<&str> = style_indices
        .iter()
        .map(|&i| sheet.rules[i].as_style().unwrap().selector.as_str())
        .collect();
    let selector = match unique_selectors.len() {
        1 => unique_selectors.into_iter().next().unwrap().to_string(),
        _ => "merged".to_string(),
    };

    let rule = Rule {
        id: 0,
        specificity: specificity::specificity(&selector),
        selector,
        declarations,
        parent_rule_id: None,
        nesting_style: NestingStyle::None,
        selector_list_id: None,
        media_query_id: None,
    };

    let mut media_index: IndexMap<String, IdList> = IndexMap::new();
    media_index.insert("all".to_string(), IdList::from_elem(0, 1));

    Stylesheet {
        rules: vec![RuleNode::Style(rule)],
        imports: sheet.imports.clone(),
        media_queries: sheet.media_queries.clone(),
        media_query_lists: sheet.media_query_lists.clone(),
        selector_lists: IndexMap::new(),
        media_index,
        charset: sheet.charset.clone(),
        has_nesting: false,
        last_rule_id: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, ParserOptions};

    fn flatten_css(css: &str) -> Stylesheet {
        let sheet = parse(css, &ParserOptions::default()).unwrap();
        flatten(&sheet)
    }

    #[test]
    fn collapses_four_margin_longhands_into_shorthand() {
        let sheet = flatten_css(".a { margin-top: 1px; margin-right: 1px; margin-bottom: 1px; margin-left: 1px; }");
        let rule = sheet.rules[0].as_style().unwrap();
        assert_eq!(rule.declarations.len(), 1);
        assert_eq!(rule.declarations[0].property, "margin");
        assert_eq!(rule.declarations[0].value, "1px");
    }

    #[test]
    fn later_declaration_wins_at_equal_specificity() {
        let sheet = flatten_css(".a { color: red; } .a { color: blue; }");
        let rule = sheet.rules[0].as_style().unwrap();
        assert_eq!(rule.declarations[0].value, "blue");
    }

    #[test]
    fn important_beats_later_non_important() {
        let sheet = flatten_css(".a { color: red !important; } .a { color: blue; }");
        let rule = sheet.rules[0].as_style().unwrap();
        assert_eq!(rule.declarations[0].value, "red");
        assert!(rule.declarations[0].important);
    }

    #[test]
    fn distinct_selectors_are_kept_separate() {
        let sheet = flatten_css("#x { color: red; } .c { color: blue; }");
        assert_eq!(sheet.rules.len(), 2);
    }

    #[test]
    fn selector_list_id_retained_when_declarations_match() {
        let sheet = flatten_css(".a, .b { color: red; }");
        assert_eq!(sheet.rules.len(), 2);
        let a = sheet.rules[0].as_style().unwrap();
        let b = sheet.rules[1].as_style().unwrap();
        assert!(a.selector_list_id.is_some());
        assert_eq!(a.selector_list_id, b.selector_list_id);
    }

    #[test]
    fn selector_list_id_cleared_on_divergence() {
        let sheet = flatten_css(".a, .b { color: red; } .a { font-weight: bold; }");
        let a = sheet.rules.iter().filter_map(|r| r.as_style()).find(|r| r.selector == ".a").unwrap();
        let b = sheet.rules.iter().filter_map(|r| r.as_style()).find(|r| r.selector == ".b").unwrap();
        assert!(a.selector_list_id.is_none());
        assert!(b.selector_list_id.is_none());
    }

    #[test]
    fn lone_list_style_longhand_is_not_collapsed_to_shorthand() {
        let sheet = flatten_css(".a { list-style-type: disc; }");
        let rule = sheet.rules[0].as_style().unwrap();
        assert_eq!(rule.declarations.len(), 1);
        assert_eq!(rule.declarations[0].property, "list-style-type");
        assert_eq!(rule.declarations[0].value, "disc");
    }

    #[test]
    fn two_list_style_longhands_recreate_shorthand() {
        let sheet = flatten_css(".a { list-style-type: disc; list-style-position: inside; }");
        let rule = sheet.rules[0].as_style().unwrap();
        assert_eq!(rule.declarations.len(), 1);
        assert_eq!(rule.declarations[0].property, "list-style");
        assert_eq!(rule.declarations[0].value, "disc inside");
    }

    #[test]
    fn nested_font_longhands_recreate_shorthand() {
        let sheet = flatten_css(".p { color: red; & .c { font: bold 12px Arial; } }");
        assert_eq!(sheet.rules.len(), 2);
        let child = sheet.rules.iter().filter_map(|r| r.as_style()).find(|r| r.selector == ".p .c").unwrap();
        assert_eq!(child.declarations.len(), 1);
        assert_eq!(child.declarations[0].property, "font");
        assert_eq!(child.declarations[0].value, "bold 12px Arial");
    }

    #[test]
    fn merge_rollup_combines_everything_into_one_rule() {
        let sheet = parse(".a { color: red; } .b { font-weight: bold; }", &ParserOptions::default()).unwrap();
        let merged = flatten_merge(&sheet);
        assert_eq!(merged.rules.len(), 1);
        let rule = merged.rules[0].as_style().unwrap();
        assert_eq!(rule.selector, "merged");
        assert_eq!(rule.declarations.len(), 2);
    }
}
