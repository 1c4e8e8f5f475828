//! Serializer (spec.md §4.7): renders a [`Stylesheet`] back to CSS text,
//! either minified or formatted, sharing one writer between both modes.
//!
//! Grounded in the teacher's `printer.rs` `Printer<W>` abstraction
//! (indent/dedent/newline/whitespace gated on a `minify` flag). This
//! crate drops the teacher's source-map, CSS-modules and vendor-prefix
//! concerns (see DESIGN.md) since the string-based model has nothing
//! for them to attach to.
//!
//! A rule with `parent_rule_id` set is never emitted at the top level;
//! it's rendered recursively inside its parent's block, with
//! `nesting_style` driving reconstruction of `&`-prefixed (explicit) or
//! bare (implicit) nested selector text (spec.md §4.7 "nested
//! emission"). Post-`flatten()` stylesheets have no `parent_rule_id`
//! links left (flatten renumbers rules flat, see cascade.rs), so this
//! collapses to the old flat behavior there; nesting only survives to
//! print when serializing a freshly parsed, unflattened stylesheet.

use std::collections::HashSet;

use itertools::Itertools;

use crate::model::{AtRuleContent, Declaration, ImportStatement, NestingStyle, Rule, RuleNode, Stylesheet};

struct Printer<'a> {
    dest: &'a mut String,
    indent: u16,
    minify: bool,
}

impl<'a> Printer<'a> {
    fn new(dest: &'a mut String, minify: bool) -> Self {
        Printer { dest, indent: 0, minify }
    }

    fn write_str(&mut self, s: &str) {
        self.dest.push_str(s);
    }

    fn write_char(&mut self, c: char) {
        self.dest.push(c);
    }

    fn whitespace(&mut self) {
        if !self.minify {
            self.write_char(' ');
        }
    }

    fn newline(&mut self) {
        if self.minify {
            return;
        }
        self.write_char('\n');
        if self.indent > 0 {
            self.write_str(&" ".repeat(self.indent as usize));
        }
    }

    fn indent(&mut self) {
        self.indent += 2;
    }

    fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(2);
    }
}

fn media_list_text(sheet: &Stylesheet, list_id: u32) -> String {
    sheet
        .media_query_lists
        .get(&list_id)
        .map(|ids| {
            ids.iter()
                .filter_map(|&id| sheet.media_query(id))
                .map(|q| q.text())
                .join(", ")
        })
        .unwrap_or_default()
}

fn write_declarations(p: &mut Printer, decls: &[Declaration]) {
    p.write_char('{');
    p.indent();
    for decl in decls {
        p.newline();
        p.write_str(&decl.property);
        p.write_char(':');
        p.whitespace();
        p.write_str(&decl.value);
        if decl.important {
            p.write_str(" !important");
        }
        p.write_char(';');
    }
    p.dedent();
    p.newline();
    p.write_char('}');
}

/// `parent_rule_id -> [child Rule id, ...]`, in the order children
/// appear in `sheet.rules`, used to emit nested rules inside their
/// parent's block instead of at the top level.
type ChildIndex = indexmap::IndexMap<u32, crate::model::IdList>;

fn index_children(sheet: &Stylesheet) -> ChildIndex {
    let mut children: ChildIndex = ChildIndex::new();
    for r in sheet.style_rules() {
        if let Some(parent_id) = r.parent_rule_id {
            children.entry(parent_id).or_insert_with(Default::default).push(r.id);
        }
    }
    children
}

/// Inverts `parser::resolve_nested_selector`'s substitution well enough
/// to reprint a nested rule's abbreviated selector: `Explicit` undoes
/// the `&` -> parent text replacement, `Implicit` strips the
/// space-joined parent prefix the parser prepended.
fn nested_selector_text(resolved: &str, parent: &str, style: NestingStyle) -> String {
    match style {
        NestingStyle::Explicit => resolved.replace(parent, "&"),
        NestingStyle::Implicit => {
            let prefix = format!("{} ", parent);
            resolved
                .strip_prefix(prefix.as_str())
                .unwrap_or(resolved)
                .to_string()
        }
        NestingStyle::None => resolved.to_string(),
    }
}

/// Resolves the selector text to print for `r`, coalescing a retained
/// selector list (`.a, .b { ... }`) into one comma-joined line and
/// marking its other members as emitted so the caller skips them.
fn rule_selector_text(
    sheet: &Stylesheet,
    r: &Rule,
    minify: bool,
    emitted_list_members: &mut HashSet<u32>,
) -> String {
    match r.selector_list_id {
        Some(list_id) => match sheet.selector_lists.get(&list_id) {
            Some(members) if members.len() > 1 => {
                for &member_id in members {
                    emitted_list_members.insert(member_id);
                }
                members
                    .iter()
                    .filter_map(|&id| sheet.rules.get(id as usize))
                    .filter_map(RuleNode::as_style)
                    .map(|rule| rule.selector.as_str())
                    .join(if minify { "," } else { ", " })
            }
            _ => r.selector.clone(),
        },
        None => r.selector.clone(),
    }
}

/// Writes `r`'s declaration list followed by any nested children,
/// inside one pair of braces.
fn write_rule_body(
    p: &mut Printer,
    sheet: &Stylesheet,
    r: &Rule,
    minify: bool,
    emitted_list_members: &mut HashSet<u32>,
    children: &ChildIndex,
) {
    p.write_char('{');
    p.indent();
    for decl in &r.declarations {
        p.newline();
        p.write_str(&decl.property);
        p.write_char(':');
        p.whitespace();
        p.write_str(&decl.value);
        if decl.important {
            p.write_str(" !important");
        }
        p.write_char(';');
    }
    if let Some(child_ids) = children.get(&r.id) {
        for &cid in child_ids {
            if emitted_list_members.contains(&cid) {
                continue;
            }
            if let Some(child) = sheet.rules.get(cid as usize).and_then(RuleNode::as_style) {
                p.newline();
                write_nested_rule(p, sheet, child, minify, emitted_list_members, children);
            }
        }
    }
    p.dedent();
    p.newline();
    p.write_char('}');
}

fn write_nested_rule(
    p: &mut Printer,
    sheet: &Stylesheet,
    r: &Rule,
    minify: bool,
    emitted_list_members: &mut HashSet<u32>,
    children: &ChildIndex,
) {
    let selector_text = rule_selector_text(sheet, r, minify, emitted_list_members);
    let display = match r
        .parent_rule_id
        .and_then(|pid| sheet.rules.get(pid as usize))
        .and_then(RuleNode::as_style)
    {
        Some(parent) => nested_selector_text(&selector_text, &parent.selector, r.nesting_style),
        None => selector_text,
    };
    p.write_str(&display);
    p.whitespace();
    write_rule_body(p, sheet, r, minify, emitted_list_members, children);
}

fn write_import(p: &mut Printer, sheet: &Stylesheet, import: &ImportStatement) {
    p.write_str("@import url('");
    p.write_str(import.resolved.as_deref().unwrap_or(&import.url));
    p.write_str("')");
    if let Some(list_id) = import.media_query_list_id {
        let text = media_list_text(sheet, list_id);
        if !text.is_empty() {
            p.write_char(' ');
            p.write_str(&text);
        }
    } else if let Some(text) = &import.media_text {
        p.write_char(' ');
        p.write_str(text);
    }
    p.write_char(';');
}

fn write_at_rule(p: &mut Printer, content: &AtRuleContent, selector: &str) {
    p.write_str(selector);
    match content {
        AtRuleContent::None => p.write_char(';'),
        AtRuleContent::Declarations(decls) => {
            p.whitespace();
            write_declarations(p, decls);
        }
        AtRuleContent::Rules(rules) => {
            p.whitespace();
            p.write_char('{');
            p.indent();
            for rule in rules {
                p.newline();
                p.write_str(&rule.selector);
                p.whitespace();
                write_declarations(p, &rule.declarations);
            }
            p.dedent();
            p.newline();
            p.write_char('}');
        }
    }
}

/// Render `sheet` to CSS text. `minify` selects compact (no whitespace
/// or newlines) vs. formatted (2-space indented) output (spec.md §4.7).
pub fn serialize(sheet: &Stylesheet, minify: bool) -> String {
    let mut out = String::new();
    let mut p = Printer::new(&mut out, minify);
    let mut first = true;

    if let Some(charset) = &sheet.charset {
        p.write_str("@charset \"");
        p.write_str(charset);
        p.write_str("\";");
        first = false;
    }

    for import in &sheet.imports {
        if !first {
            p.newline();
        }
        write_import(&mut p, sheet, import);
        first = false;
    }

    let children = index_children(sheet);
    let mut emitted_list_members: HashSet<u32> = HashSet::new();
    let mut current_media: Option<u32> = None;
    let mut media_open = false;

    for node in &sheet.rules {
        let media_id = match node {
            RuleNode::Style(r) => r.media_query_id,
            RuleNode::AtRuleNode(a) => a.media_query_id,
        };

        if let RuleNode::Style(r) = node {
            if r.parent_rule_id.is_some() || emitted_list_members.contains(&r.id) {
                continue;
            }
        }

        if media_id != current_media {
            if media_open {
                p.dedent();
                p.newline();
                p.write_char('}');
            }
            media_open = false;
            current_media = media_id;
            if !first {
                p.newline();
            }
            if let Some(id) = media_id {
                p.write_str("@media ");
                p.write_str(&media_list_text(sheet, id));
                p.whitespace();
                p.write_char('{');
                p.indent();
                p.newline();
                media_open = true;
                first = true; // next statement is the first inside the block
            }
        } else if !first {
            p.newline();
        }

        match node {
            RuleNode::AtRuleNode(ar) => {
                write_at_rule(&mut p, &ar.content, &ar.selector);
            }
            RuleNode::Style(r) => {
                let selector_text = rule_selector_text(sheet, r, minify, &mut emitted_list_members);
                p.write_str(&selector_text);
                p.whitespace();
                write_rule_body(&mut p, sheet, r, minify, &mut emitted_list_members, &children);
            }
        }
        first = false;
    }

    if media_open {
        p.dedent();
        p.newline();
        p.write_char('}');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::flatten;
    use crate::parser::{parse, ParserOptions};

    fn render(css: &str, minify: bool) -> String {
        let sheet = parse(css, &ParserOptions::default()).unwrap();
        let flat = flatten(&sheet);
        serialize(&flat, minify)
    }

    #[test]
    fn minifies_a_simple_rule() {
        assert_eq!(render(".a { color: red; }", true), ".a{color:red;}");
    }

    #[test]
    fn formats_a_simple_rule_with_indentation() {
        assert_eq!(render(".a { color: red; }", false), ".a {\n  color: red;\n}");
    }

    #[test]
    fn wraps_rules_in_a_media_block() {
        let out = render("@media screen { .a { color: red; } }", false);
        assert!(out.starts_with("@media screen {"));
        assert!(out.contains("  .a {\n    color: red;\n  }"));
        assert!(out.ends_with('}'));
    }

    #[test]
    fn coalesces_a_retained_selector_list() {
        let out = render(".a, .b { color: red; }", true);
        assert_eq!(out, ".a,.b{color:red;}");
    }

    #[test]
    fn renders_charset_first() {
        let sheet = parse("@charset \"utf-8\"; .a { color: red; }", &ParserOptions::default()).unwrap();
        let flat = flatten(&sheet);
        let out = serialize(&flat, true);
        assert!(out.starts_with("@charset \"utf-8\";"));
    }

    #[test]
    fn renders_font_face_declarations() {
        let out = render("@font-face { font-family: A; src: url(a.woff); }", true);
        assert_eq!(out, "@font-face{font-family:A;src:url(a.woff);}");
    }

    #[test]
    fn renders_keyframes_with_nested_rules() {
        let out = render("@keyframes spin { from { opacity: 0; } to { opacity: 1; } }", true);
        assert_eq!(out, "@keyframes spin{from{opacity:0;}to{opacity:1;}}");
    }

    #[test]
    fn reprints_explicit_nesting_on_an_unflattened_sheet() {
        let sheet = parse(".p { color: red; & .c { color: blue; } }", &ParserOptions::default()).unwrap();
        assert!(sheet.has_nesting);
        let out = serialize(&sheet, true);
        assert_eq!(out, ".p{color:red;& .c{color:blue;}}");
    }

    #[test]
    fn reprints_implicit_nesting_on_an_unflattened_sheet() {
        let sheet = parse(".p { color: red; .c { color: blue; } }", &ParserOptions::default()).unwrap();
        let out = serialize(&sheet, true);
        assert_eq!(out, ".p{color:red;.c{color:blue;}}");
    }

    #[test]
    fn flattening_dissolves_nesting_before_printing() {
        let out = render(".p { color: red; & .c { color: blue; } }", true);
        assert_eq!(out, ".p{color:red;}.p .c{color:blue;}");
    }
}
