//! The in-memory stylesheet data model (spec.md §3).
//!
//! The teacher's loose `CssRule`-vs-typed-property duck typing becomes
//! one tagged-variant sum type, `RuleNode`, exactly as spec.md §9's
//! "Host language mapping" describes: `Rule` and `AtRule` live side by
//! side in one flat, ordered array instead of a recursive typed AST.

use indexmap::IndexMap;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Storage for a comma-separated selector list or `@media` list's member
/// ids. These lists are small in practice (a handful of selectors or
/// queries sharing one block), so — mirroring the teacher's use of
/// `smallvec` for `SelectorList` storage — small lists live inline
/// without a heap allocation.
pub type IdList = SmallVec<[u32; 4]>;

/// `(property, value, important)` — spec.md §3. `property` is
/// ASCII-lowercased unless it begins with `--` (a custom property),
/// which keeps its original case and may contain arbitrary UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>, important: bool) -> Self {
        Declaration {
            property: property.into(),
            value: value.into(),
            important,
        }
    }
}

/// How a rule's selector relates to CSS nesting (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NestingStyle {
    /// Selector substitution used `&` explicitly.
    Explicit,
    /// The nested selector had no `&`; the parent was prepended as a
    /// descendant combinator.
    Implicit,
    /// Top-level rule, not produced by nesting.
    None,
}

/// A style rule (spec.md §3). Rule ids are arena indices: sequential
/// and identical to the rule's position in `Stylesheet::rules`'
/// style-rule ordering (the placeholder-then-fill pattern used for
/// parent-before-children nesting preserves this, see `parser.rs`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rule {
    pub id: u32,
    pub selector: String,
    pub declarations: Vec<Declaration>,
    pub specificity: u32,
    pub parent_rule_id: Option<u32>,
    pub nesting_style: NestingStyle,
    pub selector_list_id: Option<u32>,
    pub media_query_id: Option<u32>,
}

/// The content of an opaque at-rule: either nested style rules
/// (`@keyframes`) or a flat declaration list (`@font-face`-style, also
/// used for `@page`/`@counter-style`) (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AtRuleContent {
    Rules(Vec<Rule>),
    Declarations(Vec<Declaration>),
    /// A bare at-rule with no block at all, e.g. `@layer foo, bar;`.
    None,
}

/// An opaque-content at-rule (spec.md §3): `@keyframes`, `@font-face`,
/// `@page`, `@layer`, etc. `selector` carries the full `@name prelude`
/// text (e.g. `@keyframes spin` or `@font-face`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AtRule {
    pub id: u32,
    pub selector: String,
    pub content: AtRuleContent,
    pub media_query_id: Option<u32>,
}

/// One entry of a (possibly comma-separated) `@media` prelude (spec.md
/// §3). `media_type` is conceptually an interned symbol (`screen`,
/// `print`, `all`, ...); `conditions` is the optional trailing
/// `(min-width: 500px)`-style expression text, already including any
/// parent-combined ` and ` prefix from nested `@media` (spec.md §4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MediaQuery {
    pub id: u32,
    pub media_type: String,
    pub conditions: Option<String>,
}

impl MediaQuery {
    /// The textual form `<type>` or `<type> and <conditions>`, used when
    /// reconstructing `@media` preludes during serialization.
    pub fn text(&self) -> String {
        match &self.conditions {
            Some(c) => format!("{} and {}", self.media_type, c),
            None => self.media_type.clone(),
        }
    }
}

/// A parsed `@import` entry (spec.md §3). Only `@import`s appearing
/// before the first rule are recorded (spec.md §4.5); later ones are
/// warned-and-ignored by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImportStatement {
    pub id: u32,
    pub url: String,
    pub media_text: Option<String>,
    pub media_query_list_id: Option<u32>,
    /// The URL after resolver rewriting, if URL rewriting was active
    /// and produced a different value from `url`.
    pub resolved: Option<String>,
}

/// One entry in `Stylesheet::rules`: a tagged-variant sum type standing
/// in for the teacher's loose `CssRule`-vs-typed-property duck typing
/// (spec.md §9).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RuleNode {
    Style(Rule),
    AtRuleNode(AtRule),
}

impl RuleNode {
    pub fn as_style(&self) -> Option<&Rule> {
        match self {
            RuleNode::Style(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_style_mut(&mut self) -> Option<&mut Rule> {
        match self {
            RuleNode::Style(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_at_rule(&self) -> Option<&AtRule> {
        match self {
            RuleNode::AtRuleNode(a) => Some(a),
            _ => None,
        }
    }
}

/// The parser's output / flatten's input and output (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Stylesheet {
    pub rules: Vec<RuleNode>,
    pub imports: Vec<ImportStatement>,
    /// Indexed by id: `media_queries[id]` is the query with that id.
    pub media_queries: Vec<MediaQuery>,
    /// `list_id -> [MediaQuery id, ...]`, used to reconstruct
    /// comma-separated `@media screen, print`.
    pub media_query_lists: IndexMap<u32, IdList>,
    /// `list_id -> [Rule id, ...]` for a comma-separated selector list.
    pub selector_lists: IndexMap<u32, IdList>,
    /// `media type symbol -> [Rule id, ...]`.
    pub media_index: IndexMap<String, IdList>,
    pub charset: Option<String>,
    pub has_nesting: bool,
    pub last_rule_id: u32,
}

impl Stylesheet {
    pub fn empty() -> Self {
        Stylesheet::default()
    }

    pub fn style_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter_map(RuleNode::as_style)
    }

    pub fn style_rules_mut(&mut self) -> impl Iterator<Item = &mut Rule> {
        self.rules.iter_mut().filter_map(RuleNode::as_style_mut)
    }

    pub fn media_query(&self, id: u32) -> Option<&MediaQuery> {
        self.media_queries.get(id as usize)
    }
}
