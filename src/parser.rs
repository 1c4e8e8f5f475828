//! Rule parser core (spec.md §4.5): a byte-range recursive-descent
//! parser with an explicit depth counter, producing a [`Stylesheet`].
//!
//! The teacher splits this into `TopLevelRuleParser`/`NestedRuleParser`
//! driven by `cssparser`'s token stream; this crate parses raw byte
//! ranges directly (spec.md mandates byte-range recursion, not a
//! token-stream grammar), but keeps the teacher's idea of a single
//! `ParserOptions` struct threading configuration through the whole
//! descent.

use bitflags::bitflags;
use indexmap::IndexMap;

use crate::declaration::{self, DeclarationContext};
use crate::error::{CssError, CssResult, ErrorKind};
use crate::model::{AtRule, AtRuleContent, IdList, ImportStatement, MediaQuery, NestingStyle, Rule, RuleNode, Stylesheet};
use crate::scanner;
use crate::specificity;
use crate::url_rewriter::{AbsolutePathResolver, UrlResolver};

pub const MAX_PARSE_DEPTH: usize = 10;
pub const MAX_MEDIA_QUERIES: usize = 1000;
pub const MAX_BLOCK_SIZE: usize = 1024 * 1024;

bitflags! {
    /// Per-check strict-mode toggles (spec.md §6's `raise_parse_errors`
    /// map). The teacher uses `bitflags` for `VendorPrefix`; here it
    /// models which structural violations are fatal versus tolerated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StrictChecks: u32 {
        const EMPTY_VALUES             = 0b0000_0001;
        const MALFORMED_DECLARATIONS   = 0b0000_0010;
        const INVALID_SELECTORS        = 0b0000_0100;
        const INVALID_SELECTOR_SYNTAX  = 0b0000_1000;
        const MALFORMED_AT_RULES       = 0b0001_0000;
        const UNCLOSED_BLOCKS          = 0b0010_0000;
    }
}

impl Default for StrictChecks {
    fn default() -> Self {
        StrictChecks::empty()
    }
}

/// Configuration for [`parse`] (spec.md §6).
pub struct ParserOptions<'a> {
    pub selector_lists: bool,
    pub base_uri: Option<&'a str>,
    pub absolute_paths: bool,
    pub uri_resolver: Option<&'a dyn UrlResolver>,
    pub strict: StrictChecks,
}

impl<'a> Default for ParserOptions<'a> {
    fn default() -> Self {
        ParserOptions {
            selector_lists: true,
            base_uri: None,
            absolute_paths: false,
            uri_resolver: None,
            strict: StrictChecks::empty(),
        }
    }
}

impl<'a> ParserOptions<'a> {
    /// `raise_parse_errors: true` in spec.md §6 means every check is
    /// strict; `false` (the default) means none are.
    pub fn with_raise_parse_errors(mut self, all: bool) -> Self {
        self.strict = if all { StrictChecks::all() } else { StrictChecks::empty() };
        self
    }

    fn resolver_for_rewriting(&self) -> Option<&dyn UrlResolver> {
        if self.uri_resolver.is_some() {
            self.uri_resolver
        } else if self.absolute_paths {
            Some(&ABSOLUTE_PATH_RESOLVER)
        } else {
            None
        }
    }
}

static ABSOLUTE_PATH_RESOLVER: AbsolutePathResolver = AbsolutePathResolver;

/// Character whitelist for strict-mode selector syntax checks (spec.md
/// §4.5). Built at compile time rather than written out as one long
/// literal.
const SELECTOR_WHITELIST: &str = const_str::concat!(
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789",
    "-_.#[]:*>+~()='\"^$|&%/!,"
);

fn is_selector_char_allowed(c: char) -> bool {
    c.is_whitespace() || SELECTOR_WHITELIST.contains(c)
}

struct ParseState<'a> {
    options: &'a ParserOptions<'a>,
    rules: Vec<RuleNode>,
    imports: Vec<ImportStatement>,
    media_queries: Vec<MediaQuery>,
    media_query_lists: IndexMap<u32, IdList>,
    selector_lists: IndexMap<u32, IdList>,
    media_index: IndexMap<String, IdList>,
    media_list_text: IndexMap<u32, String>,
    charset: Option<String>,
    has_nesting: bool,
    seen_rule: bool,
    next_media_list_id: u32,
    next_selector_list_id: u32,
    next_import_id: u32,
}

impl<'a> ParseState<'a> {
    fn new(options: &'a ParserOptions<'a>) -> Self {
        ParseState {
            options,
            rules: Vec::new(),
            imports: Vec::new(),
            media_queries: Vec::new(),
            media_query_lists: IndexMap::new(),
            selector_lists: IndexMap::new(),
            media_index: IndexMap::new(),
            media_list_text: IndexMap::new(),
            charset: None,
            has_nesting: false,
            seen_rule: false,
            next_media_list_id: 0,
            next_selector_list_id: 0,
            next_import_id: 0,
        }
    }

    fn decl_ctx(&self) -> DeclarationContext<'_> {
        DeclarationContext {
            check_empty_values: self.options.strict.contains(StrictChecks::EMPTY_VALUES),
            check_malformed_declarations: self.options.strict.contains(StrictChecks::MALFORMED_DECLARATIONS),
            base_uri: self.options.base_uri,
            resolver: self.options.resolver_for_rewriting(),
        }
    }

    fn register_media_list(&mut self, entries: Vec<(String, Option<String>)>) -> CssResult<u32> {
        if self.media_queries.len() + entries.len() > MAX_MEDIA_QUERIES {
            return Err(CssError::new(ErrorKind::Size, 0, "media query count exceeds cap"));
        }
        let list_id = self.next_media_list_id;
        self.next_media_list_id += 1;
        let mut ids = IdList::with_capacity(entries.len());
        for (media_type, conditions) in entries {
            let id = self.media_queries.len() as u32;
            self.media_queries.push(MediaQuery {
                id,
                media_type: media_type.clone(),
                conditions,
            });
            ids.push(id);
            self.media_index.entry(media_type).or_default();
        }
        let text = ids
            .first()
            .and_then(|id| self.media_queries.get(*id as usize))
            .map(MediaQuery::text)
            .unwrap_or_default();
        self.media_list_text.insert(list_id, text);
        self.media_query_lists.insert(list_id, ids);
        Ok(list_id)
    }

    fn index_rule_under_media(&mut self, list_id: u32, rule_id: u32) {
        if let Some(ids) = self.media_query_lists.get(&list_id).cloned() {
            for qid in ids {
                if let Some(mq) = self.media_queries.get(qid as usize) {
                    self.media_index.entry(mq.media_type.clone()).or_default().push(rule_id);
                }
            }
        }
    }
}

/// Parse `css` into a [`Stylesheet`] (spec.md §4.5).
pub fn parse(css: &str, options: &ParserOptions) -> CssResult<Stylesheet> {
    let mut state = ParseState::new(options);
    let bytes = css.as_bytes();
    parse_top_level(&mut state, css, bytes, 0, bytes.len(), 0, None)?;

    let last_rule_id = state.rules.len() as u32;
    Ok(Stylesheet {
        rules: state.rules,
        imports: state.imports,
        media_queries: state.media_queries,
        media_query_lists: state.media_query_lists,
        selector_lists: state.selector_lists,
        media_index: state.media_index,
        charset: state.charset,
        has_nesting: state.has_nesting,
        last_rule_id,
    })
}

fn split_media_prelude(prelude: &str) -> Vec<(String, Option<String>)> {
    let bytes = prelude.as_bytes();
    scanner::split_top_level_commas(bytes, 0, bytes.len())
        .into_iter()
        .map(|(s, e)| {
            let (s, e) = scanner::trim(bytes, s, e);
            let segment = scanner::substring(bytes, s, e).trim().to_string();
            parse_one_media_query(&segment)
        })
        .collect()
}

fn parse_one_media_query(segment: &str) -> (String, Option<String>) {
    if segment.is_empty() {
        return (crate::intern::intern_media_type("all"), None);
    }
    if segment.starts_with('(') {
        return (crate::intern::intern_media_type("all"), Some(segment.to_string()));
    }
    let mut parts = segment.splitn(2, char::is_whitespace);
    let media_type = crate::intern::intern_media_type(parts.next().unwrap_or("all"));
    let rest = parts.next().unwrap_or("").trim();
    let rest = rest.strip_prefix("and").unwrap_or(rest).trim();
    let conditions = if rest.is_empty() { None } else { Some(rest.to_string()) };
    (media_type, conditions)
}

fn combine_with_parent(entries: Vec<(String, Option<String>)>, parent_text: Option<&str>) -> Vec<(String, Option<String>)> {
    match parent_text {
        None => entries,
        Some(parent) => entries
            .into_iter()
            .map(|(ty, cond)| {
                let combined = match cond {
                    Some(c) => format!("{} and {}", parent, c),
                    None => parent.to_string(),
                };
                (ty, Some(combined))
            })
            .collect(),
    }
}

/// Scan `css[start..end]` at the top level (or inside a transparent
/// container like `@supports`/`@layer`), dispatching at-rules and
/// accumulating plain selectors into rule blocks.
fn parse_top_level(
    state: &mut ParseState,
    css: &str,
    bytes: &[u8],
    start: usize,
    end: usize,
    depth: usize,
    media_query_id: Option<u32>,
) -> CssResult<()> {
    if depth > MAX_PARSE_DEPTH {
        return Err(CssError::new(ErrorKind::Depth, start, "max nesting depth exceeded"));
    }

    let mut pos = start;
    loop {
        pos = scanner::skip_whitespace_and_comments(bytes, pos, end);
        while pos < end && bytes[pos] == b';' {
            pos += 1;
            pos = scanner::skip_whitespace_and_comments(bytes, pos, end);
        }
        if pos >= end {
            return Ok(());
        }

        if bytes[pos] == b'@' {
            pos = parse_at_rule(state, css, bytes, pos, end, depth, media_query_id)?;
            continue;
        }

        let brace = match find_top_level_brace(bytes, pos, end) {
            Some(p) => p,
            None => {
                if state.options.strict.contains(StrictChecks::UNCLOSED_BLOCKS) {
                    return Err(CssError::new(ErrorKind::UnclosedBlock, pos, "selector with no block"));
                }
                return Ok(());
            }
        };
        let body_start = brace + 1;
        let body_end = scanner::find_matching_brace_strict(bytes, brace, end)
            .map_err(|_| CssError::new(ErrorKind::UnclosedBlock, brace, "unclosed rule block"))?;
        if body_end - body_start > MAX_BLOCK_SIZE {
            return Err(CssError::new(ErrorKind::Size, body_start, "rule block exceeds size cap"));
        }

        parse_rule(state, css, bytes, pos, brace, body_start, body_end, depth, media_query_id, None, None)?;
        state.seen_rule = true;
        pos = body_end + 1;
    }
}

/// Find the top-level `{` that opens a rule block, skipping comments and
/// quoted/parenthesized text in the selector.
fn find_top_level_brace(bytes: &[u8], start: usize, end: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut i = start;
    while i < end {
        match bytes[i] {
            b'/' if i + 1 < end && bytes[i + 1] == b'*' => {
                i = scanner::skip_comment(bytes, i, end);
                continue;
            }
            b'"' | b'\'' => {
                i = scanner::skip_string(bytes, i, end);
                continue;
            }
            b'(' => depth += 1,
            b')' => depth -= 1,
            b'{' if depth <= 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn at_rule_name(bytes: &[u8], at_pos: usize, end: usize) -> (usize, String) {
    let mut i = at_pos + 1;
    while i < end && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    let name = String::from_utf8_lossy(&bytes[at_pos + 1..i]).to_ascii_lowercase();
    (i, name)
}

fn parse_at_rule(
    state: &mut ParseState,
    css: &str,
    bytes: &[u8],
    at_pos: usize,
    end: usize,
    depth: usize,
    media_query_id: Option<u32>,
) -> CssResult<usize> {
    let (after_name, name) = at_rule_name(bytes, at_pos, end);

    match name.as_str() {
        "charset" => {
            let semi = scanner::find_top_level(bytes, after_name, end, b';').unwrap_or(end);
            let (s, e) = scanner::trim(bytes, after_name, semi);
            let text = scanner::substring(bytes, s, e).trim_matches(|c| c == '"' || c == '\'').to_string();
            if state.charset.is_none() {
                state.charset = Some(text);
            }
            Ok((semi + 1).min(end))
        }
        "import" => {
            let semi = scanner::find_top_level(bytes, after_name, end, b';').unwrap_or(end);
            if state.seen_rule {
                // spec.md §4.5, §7: @import after rules is warned and ignored.
                return Ok((semi + 1).min(end));
            }
            let (s, e) = scanner::trim(bytes, after_name, semi);
            let prelude = scanner::substring(bytes, s, e).to_string();
            parse_import(state, &prelude)?;
            Ok((semi + 1).min(end))
        }
        "media" => {
            let brace = find_top_level_brace(bytes, after_name, end).ok_or_else(|| {
                CssError::new(ErrorKind::UnclosedBlock, after_name, "@media with no block")
            })?;
            let prelude = scanner::substring(bytes, after_name, brace).trim().to_string();
            if state.options.strict.contains(StrictChecks::MALFORMED_AT_RULES) && prelude.is_empty() {
                return Err(CssError::new(ErrorKind::MalformedAtRule, after_name, "@media with no condition"));
            }
            let body_start = brace + 1;
            let body_end = scanner::find_matching_brace_strict(bytes, brace, end)
                .map_err(|_| CssError::new(ErrorKind::UnclosedBlock, brace, "unclosed @media block"))?;

            let parent_text = media_query_id.and_then(|id| state.media_list_text.get(&id).cloned());
            let entries = combine_with_parent(split_media_prelude(&prelude), parent_text.as_deref());
            let list_id = state.register_media_list(entries)?;

            parse_top_level(state, css, bytes, body_start, body_end, depth + 1, Some(list_id))?;
            Ok(body_end + 1)
        }
        "supports" | "layer" | "container" | "scope" => {
            let requires_condition = name == "supports" || name == "container";
            let boundary = scanner::find_top_level(bytes, after_name, end, b';');
            let brace = find_top_level_brace(bytes, after_name, end);
            let is_bare = match (boundary, brace) {
                (Some(b), Some(br)) => b < br,
                (Some(_), None) => true,
                _ => false,
            };
            if is_bare {
                let semi = boundary.unwrap_or(end);
                let prelude = scanner::substring(bytes, after_name, semi).trim().to_string();
                let id = state.rules.len() as u32;
                state.rules.push(RuleNode::AtRuleNode(AtRule {
                    id,
                    selector: format!("@{} {}", name, prelude),
                    content: AtRuleContent::None,
                    media_query_id,
                }));
                return Ok((semi + 1).min(end));
            }
            let brace = brace.unwrap();
            let prelude = scanner::substring(bytes, after_name, brace).trim().to_string();
            if requires_condition
                && state.options.strict.contains(StrictChecks::MALFORMED_AT_RULES)
                && prelude.is_empty()
            {
                return Err(CssError::new(
                    ErrorKind::MalformedAtRule,
                    after_name,
                    format!("@{} requires a condition", name),
                ));
            }
            let body_start = brace + 1;
            let body_end = scanner::find_matching_brace_strict(bytes, brace, end)
                .map_err(|_| CssError::new(ErrorKind::UnclosedBlock, brace, "unclosed block"))?;
            // Transparent container: preserves the parent's media context
            // and (absence of a) parent selector (spec.md §4.5).
            parse_top_level(state, css, bytes, body_start, body_end, depth + 1, media_query_id)?;
            Ok(body_end + 1)
        }
        "keyframes" | "font-face" => {
            let brace = find_top_level_brace(bytes, after_name, end).ok_or_else(|| {
                CssError::new(ErrorKind::UnclosedBlock, after_name, "at-rule with no block")
            })?;
            let prelude = scanner::substring(bytes, after_name, brace).trim().to_string();
            let body_start = brace + 1;
            let body_end = scanner::find_matching_brace_strict(bytes, brace, end)
                .map_err(|_| CssError::new(ErrorKind::UnclosedBlock, brace, "unclosed block"))?;
            if body_end - body_start > MAX_BLOCK_SIZE {
                return Err(CssError::new(ErrorKind::Size, body_start, "at-rule block exceeds size cap"));
            }

            let content = if name == "font-face" {
                let decls = declaration::parse_declarations(css, body_start, body_end, &state.decl_ctx())?;
                AtRuleContent::Declarations(decls)
            } else {
                let rules = parse_keyframe_rules(state, css, bytes, body_start, body_end, depth + 1)?;
                AtRuleContent::Rules(rules)
            };

            let id = state.rules.len() as u32;
            state.rules.push(RuleNode::AtRuleNode(AtRule {
                id,
                selector: format!("@{} {}", name, prelude).trim().to_string(),
                content,
                media_query_id,
            }));
            state.seen_rule = true;
            Ok(body_end + 1)
        }
        _ => {
            // Unknown at-rule: skip to its terminator (`;` or a balanced
            // block), lenient recovery per spec.md §7.
            let semi = scanner::find_top_level(bytes, after_name, end, b';');
            let brace = find_top_level_brace(bytes, after_name, end);
            match (semi, brace) {
                (Some(s), Some(b)) if s < b => Ok(s + 1),
                (_, Some(b)) => {
                    let body_end = scanner::find_matching_brace_strict(bytes, b, end)
                        .map_err(|_| CssError::new(ErrorKind::UnclosedBlock, b, "unclosed block"))?;
                    Ok(body_end + 1)
                }
                (Some(s), None) => Ok(s + 1),
                (None, None) => {
                    if state.options.strict.contains(StrictChecks::MALFORMED_AT_RULES) {
                        return Err(CssError::new(ErrorKind::MalformedAtRule, at_pos, "unterminated at-rule"));
                    }
                    Ok(end)
                }
            }
        }
    }
}

fn parse_import(state: &mut ParseState, prelude: &str) -> CssResult<()> {
    let trimmed = prelude.trim();
    let (url_text, rest) = if trimmed.starts_with("url(") {
        let close = trimmed.find(')').map(|p| p + 1).unwrap_or(trimmed.len());
        (trimmed[..close].to_string(), trimmed[close..].trim())
    } else if let Some(stripped) = trimmed.strip_prefix('"').or_else(|| trimmed.strip_prefix('\'')) {
        let quote = trimmed.as_bytes()[0] as char;
        match stripped.find(quote) {
            Some(end) => (stripped[..end].to_string(), stripped[end + 1..].trim()),
            None => (stripped.to_string(), ""),
        }
    } else {
        let mut parts = trimmed.splitn(2, char::is_whitespace);
        (parts.next().unwrap_or("").to_string(), parts.next().unwrap_or("").trim())
    };

    let media_text = if rest.is_empty() { None } else { Some(rest.to_string()) };
    let media_query_list_id = match &media_text {
        Some(text) => Some(state.register_media_list(split_media_prelude(text))?),
        None => None,
    };

    let resolved = state
        .options
        .resolver_for_rewriting()
        .and_then(|resolver| resolver.resolve(&url_text, state.options.base_uri.unwrap_or("")));

    let id = state.next_import_id;
    state.next_import_id += 1;
    state.imports.push(ImportStatement {
        id,
        url: url_text,
        media_text,
        media_query_list_id,
        resolved,
    });
    Ok(())
}

fn check_selector_syntax(state: &ParseState, selector: &str, pos: usize) -> CssResult<()> {
    if !state.options.strict.contains(StrictChecks::INVALID_SELECTOR_SYNTAX) {
        return Ok(());
    }
    if selector.contains("..") || selector.contains("##") {
        return Err(CssError::new(
            ErrorKind::InvalidSelectorSyntax,
            pos,
            "disallowed repeated selector character sequence",
        ));
    }
    if let Some(c) = selector.chars().find(|c| !is_selector_char_allowed(*c)) {
        return Err(CssError::new(
            ErrorKind::InvalidSelectorSyntax,
            pos,
            format!("selector contains disallowed character '{}'", c),
        ));
    }
    Ok(())
}

fn check_selector_semantics(state: &ParseState, selector: &str, pos: usize, is_nested: bool) -> CssResult<()> {
    if !state.options.strict.contains(StrictChecks::INVALID_SELECTORS) {
        return Ok(());
    }
    if selector.is_empty() {
        return Err(CssError::new(ErrorKind::InvalidSelector, pos, "empty selector"));
    }
    if !is_nested {
        if let Some(c) = selector.chars().next() {
            if matches!(c, '>' | '+' | '~') {
                return Err(CssError::new(
                    ErrorKind::InvalidSelector,
                    pos,
                    "selector starts with a combinator",
                ));
            }
        }
    }
    Ok(())
}

fn resolve_nested_selector(raw: &str, parent: &str) -> (String, NestingStyle) {
    if raw.contains('&') {
        let mut replaced = raw.replace('&', parent);
        if let Some(c) = raw.chars().next() {
            if matches!(c, '>' | '+' | '~') {
                replaced = format!("{} {}", parent, replaced);
            }
        }
        (replaced, NestingStyle::Explicit)
    } else {
        (format!("{} {}", parent, raw.trim_start()), NestingStyle::Implicit)
    }
}

/// Parse one `selector { body }` occurrence, splitting the selector on
/// top-level commas and, when `parent_selector` is set, resolving `&`
/// substitution per segment (spec.md §4.5).
#[allow(clippy::too_many_arguments)]
fn parse_rule(
    state: &mut ParseState,
    css: &str,
    bytes: &[u8],
    selector_start: usize,
    selector_end: usize,
    body_start: usize,
    body_end: usize,
    depth: usize,
    media_query_id: Option<u32>,
    enclosing_parent_id: Option<u32>,
    parent_selector: Option<&str>,
) -> CssResult<()> {
    if depth > MAX_PARSE_DEPTH {
        return Err(CssError::new(ErrorKind::Depth, selector_start, "max nesting depth exceeded"));
    }

    let raw_selector = scanner::substring(bytes, selector_start, selector_end);
    let segments = scanner::split_top_level_commas(raw_selector.as_bytes(), 0, raw_selector.len());

    let mut resolved_segments = Vec::with_capacity(segments.len());
    for (s, e) in &segments {
        let seg = raw_selector[*s..*e].trim();
        if state.options.strict.contains(StrictChecks::INVALID_SELECTORS) && seg.is_empty() && segments.len() > 1 {
            return Err(CssError::new(
                ErrorKind::InvalidSelector,
                selector_start,
                "empty segment in comma-separated selector list",
            ));
        }
        check_selector_syntax(state, seg, selector_start)?;
        let (resolved, nesting_style) = match parent_selector {
            Some(parent) => resolve_nested_selector(seg, parent),
            None => (seg.to_string(), NestingStyle::None),
        };
        check_selector_semantics(state, &resolved, selector_start, parent_selector.is_some())?;
        resolved_segments.push((resolved, nesting_style));
    }
    if resolved_segments.is_empty() {
        return Ok(());
    }

    let shares_list = state.options.selector_lists && resolved_segments.len() >= 2;
    let list_id = if shares_list {
        let id = state.next_selector_list_id;
        state.next_selector_list_id += 1;
        state.selector_lists.insert(id, IdList::new());
        Some(id)
    } else {
        None
    };

    for (resolved, nesting_style) in resolved_segments {
        let this_id = state.rules.len() as u32;
        let specificity_value = specificity::specificity(&resolved);
        state.rules.push(RuleNode::Style(Rule {
            id: this_id,
            selector: resolved.clone(),
            declarations: Vec::new(),
            specificity: specificity_value,
            parent_rule_id: enclosing_parent_id,
            nesting_style,
            selector_list_id: list_id,
            media_query_id,
        }));
        if enclosing_parent_id.is_some() {
            state.has_nesting = true;
        }
        if let Some(id) = list_id {
            state.selector_lists.get_mut(&id).unwrap().push(this_id);
        }
        if let Some(mlid) = media_query_id {
            state.index_rule_under_media(mlid, this_id);
        }

        let own_decls = parse_mixed_body(state, css, bytes, body_start, body_end, depth + 1, media_query_id, this_id, &resolved)?;
        if let Some(RuleNode::Style(rule)) = state.rules.get_mut(this_id as usize) {
            rule.declarations = own_decls;
        }
    }

    Ok(())
}

/// Parse the body of a rule, which may interleave plain declarations
/// with nested selector rules and nested `@media` blocks (CSS Nesting,
/// spec.md §4.5). Returns the declarations belonging directly to this
/// rule (not its nested children).
#[allow(clippy::too_many_arguments)]
fn parse_mixed_body(
    state: &mut ParseState,
    css: &str,
    bytes: &[u8],
    start: usize,
    end: usize,
    depth: usize,
    media_query_id: Option<u32>,
    parent_id: u32,
    parent_selector: &str,
) -> CssResult<Vec<crate::model::Declaration>> {
    if depth > MAX_PARSE_DEPTH {
        return Err(CssError::new(ErrorKind::Depth, start, "max nesting depth exceeded"));
    }

    let mut own = Vec::new();
    let mut pos = start;
    loop {
        pos = scanner::skip_whitespace_and_comments(bytes, pos, end);
        while pos < end && bytes[pos] == b';' {
            pos += 1;
            pos = scanner::skip_whitespace_and_comments(bytes, pos, end);
        }
        if pos >= end {
            return Ok(own);
        }

        if bytes[pos] == b'@' {
            let (after_name, name) = at_rule_name(bytes, pos, end);

            if name == "media" {
                // Nested `@media` inside a `&`-nesting body (spec.md
                // §4.5): combine with the enclosing media context (if
                // any) and recurse, spawning child rules under this
                // same parent with the combined query.
                let brace = find_top_level_brace(bytes, after_name, end).ok_or_else(|| {
                    CssError::new(ErrorKind::UnclosedBlock, after_name, "@media with no block")
                })?;
                let prelude = scanner::substring(bytes, after_name, brace).trim().to_string();
                if state.options.strict.contains(StrictChecks::MALFORMED_AT_RULES) && prelude.is_empty() {
                    return Err(CssError::new(ErrorKind::MalformedAtRule, after_name, "@media with no condition"));
                }
                let nested_body_start = brace + 1;
                let nested_body_end = scanner::find_matching_brace_strict(bytes, brace, end)
                    .map_err(|_| CssError::new(ErrorKind::UnclosedBlock, brace, "unclosed @media block"))?;

                let parent_text = media_query_id.and_then(|id| state.media_list_text.get(&id).cloned());
                let entries = combine_with_parent(split_media_prelude(&prelude), parent_text.as_deref());
                let list_id = state.register_media_list(entries)?;

                let nested_decls = parse_mixed_body(
                    state,
                    css,
                    bytes,
                    nested_body_start,
                    nested_body_end,
                    depth + 1,
                    Some(list_id),
                    parent_id,
                    parent_selector,
                )?;
                own.extend(nested_decls);
                pos = nested_body_end + 1;
                continue;
            }

            // Other nested at-rules inside a `&`-nesting body: recover
            // by skipping the statement or balanced block.
            let semi = scanner::find_top_level(bytes, after_name, end, b';');
            let brace = find_top_level_brace(bytes, after_name, end);
            pos = match (semi, brace) {
                (Some(s), Some(b)) if s < b => s + 1,
                (_, Some(b)) => scanner::find_matching_brace(bytes, b, end) + 1,
                (Some(s), None) => s + 1,
                (None, None) => end,
            };
            continue;
        }

        let stmt_start = pos;
        let next_semi = scanner::find_top_level(bytes, pos, end, b';');
        let next_brace = find_top_level_brace(bytes, pos, end);

        let is_nested_rule = match (next_semi, next_brace) {
            (Some(s), Some(b)) => b < s,
            (None, Some(_)) => true,
            _ => false,
        };

        if is_nested_rule {
            let brace = next_brace.unwrap();
            let nested_body_start = brace + 1;
            let nested_body_end = scanner::find_matching_brace_strict(bytes, brace, end)
                .map_err(|_| CssError::new(ErrorKind::UnclosedBlock, brace, "unclosed nested rule"))?;
            parse_rule(
                state,
                css,
                bytes,
                stmt_start,
                brace,
                nested_body_start,
                nested_body_end,
                depth + 1,
                media_query_id,
                Some(parent_id),
                Some(parent_selector),
            )?;
            pos = nested_body_end + 1;
        } else {
            let stmt_end = next_semi.unwrap_or(end);
            let decls = declaration::parse_declarations(css, stmt_start, stmt_end, &state.decl_ctx())?;
            own.extend(decls);
            pos = (stmt_end + 1).min(end);
        }
    }
}

fn parse_keyframe_rules(
    state: &mut ParseState,
    css: &str,
    bytes: &[u8],
    start: usize,
    end: usize,
    depth: usize,
) -> CssResult<Vec<Rule>> {
    if depth > MAX_PARSE_DEPTH {
        return Err(CssError::new(ErrorKind::Depth, start, "max nesting depth exceeded"));
    }
    let mut rules = Vec::new();
    let mut pos = start;
    let mut next_id = 0u32;
    loop {
        pos = scanner::skip_whitespace_and_comments(bytes, pos, end);
        while pos < end && bytes[pos] == b';' {
            pos += 1;
            pos = scanner::skip_whitespace_and_comments(bytes, pos, end);
        }
        if pos >= end {
            return Ok(rules);
        }
        let brace = match find_top_level_brace(bytes, pos, end) {
            Some(p) => p,
            None => return Ok(rules),
        };
        let selector = scanner::substring(bytes, pos, brace).trim().to_string();
        let body_start = brace + 1;
        let body_end = scanner::find_matching_brace_strict(bytes, brace, end)
            .map_err(|_| CssError::new(ErrorKind::UnclosedBlock, brace, "unclosed keyframe block"))?;
        let decls = declaration::parse_declarations(css, body_start, body_end, &state.decl_ctx())?;
        rules.push(Rule {
            id: next_id,
            specificity: specificity::specificity(&selector),
            selector,
            declarations: decls,
            parent_rule_id: None,
            nesting_style: NestingStyle::None,
            selector_list_id: None,
            media_query_id: None,
        });
        next_id += 1;
        pos = body_end + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_default(css: &str) -> Stylesheet {
        parse(css, &ParserOptions::default()).unwrap()
    }

    #[test]
    fn parses_single_rule() {
        let sheet = parse_default(".a { color: red; }");
        assert_eq!(sheet.rules.len(), 1);
        let rule = sheet.rules[0].as_style().unwrap();
        assert_eq!(rule.selector, ".a");
        assert_eq!(rule.declarations[0].property, "color");
    }

    #[test]
    fn splits_selector_list_sharing_id() {
        let sheet = parse_default(".a, .b { color: red; }");
        assert_eq!(sheet.rules.len(), 2);
        let a = sheet.rules[0].as_style().unwrap();
        let b = sheet.rules[1].as_style().unwrap();
        assert!(a.selector_list_id.is_some());
        assert_eq!(a.selector_list_id, b.selector_list_id);
    }

    #[test]
    fn nested_explicit_ampersand() {
        let sheet = parse_default(".p { color: red; & .c { color: blue; } }");
        assert_eq!(sheet.rules.len(), 2);
        let parent = sheet.rules[0].as_style().unwrap();
        let child = sheet.rules[1].as_style().unwrap();
        assert_eq!(parent.selector, ".p");
        assert_eq!(child.selector, ".p .c");
        assert_eq!(child.nesting_style, NestingStyle::Explicit);
        assert_eq!(child.parent_rule_id, Some(parent.id));
        assert!(sheet.has_nesting);
    }

    #[test]
    fn nested_implicit_descendant() {
        let sheet = parse_default(".p { & { } .c { color: blue; } }");
        let child = sheet.rules.iter().filter_map(|r| r.as_style()).find(|r| r.selector.contains("c")).unwrap();
        assert_eq!(child.selector, ".p .c");
        assert_eq!(child.nesting_style, NestingStyle::Implicit);
    }

    #[test]
    fn nested_media_inside_nesting_body_spawns_child_rule() {
        let sheet = parse_default(".a { color: red; @media screen { .b { color: blue; } } }");
        let parent = sheet.rules.iter().filter_map(|r| r.as_style()).find(|r| r.selector == ".a").unwrap();
        let child = sheet.rules.iter().filter_map(|r| r.as_style()).find(|r| r.selector == ".a .b").unwrap();
        assert_eq!(child.parent_rule_id, Some(parent.id));
        assert!(child.media_query_id.is_some());
        let list_id = child.media_query_id.unwrap();
        let ids = &sheet.media_query_lists[&list_id];
        assert_eq!(sheet.media_queries[ids[0] as usize].media_type, "screen");
    }

    #[test]
    fn media_grouups_import_under_one_list() {
        let sheet = parse_default(r#"@import "a.css" screen, print;"#);
        assert_eq!(sheet.imports.len(), 1);
        let list_id = sheet.imports[0].media_query_list_id.unwrap();
        assert_eq!(sheet.media_query_lists[&list_id].len(), 2);
    }

    #[test]
    fn import_after_rules_is_ignored() {
        let sheet = parse_default(r#".a { color: red; } @import "late.css";"#);
        assert!(sheet.imports.is_empty());
    }

    #[test]
    fn media_block_combines_with_nested_media() {
        let sheet = parse_default("@media screen { @media (min-width: 500px) { .a { color: red; } } }");
        let rule = sheet.rules[0].as_style().unwrap();
        let list_id = rule.media_query_id.unwrap();
        let ids = &sheet.media_query_lists[&list_id];
        let mq = &sheet.media_queries[ids[0] as usize];
        assert!(mq.conditions.as_deref().unwrap().contains("min-width"));
        assert!(mq.conditions.as_deref().unwrap().starts_with("screen"));
    }

    #[test]
    fn keyframes_are_captured_as_at_rule() {
        let sheet = parse_default("@keyframes spin { from { opacity: 0; } to { opacity: 1; } }");
        let at_rule = sheet.rules[0].as_at_rule().unwrap();
        assert_eq!(at_rule.selector, "@keyframes spin");
        match &at_rule.content {
            AtRuleContent::Rules(rules) => assert_eq!(rules.len(), 2),
            _ => panic!("expected Rules content"),
        }
    }

    #[test]
    fn font_face_captures_declarations() {
        let sheet = parse_default("@font-face { font-family: Arial; src: url(a.woff); }");
        let at_rule = sheet.rules[0].as_at_rule().unwrap();
        match &at_rule.content {
            AtRuleContent::Declarations(decls) => assert_eq!(decls.len(), 2),
            _ => panic!("expected Declarations content"),
        }
    }

    #[test]
    fn supports_block_is_transparent() {
        let sheet = parse_default("@supports (display: grid) { .a { color: red; } }");
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].as_style().unwrap().selector, ".a");
    }

    #[test]
    fn depth_cap_is_enforced() {
        let mut css = String::new();
        for i in 0..12 {
            css.push_str(&format!(".l{} {{ ", i));
        }
        css.push_str("color: red;");
        for _ in 0..12 {
            css.push_str(" }");
        }
        // Not nested via `&`, so this parses as plain top-level rules
        // and never hits the depth cap; depth is exercised for `&`
        // nesting instead.
        let mut nested = String::from(".a {");
        for i in 0..12 {
            nested.push_str(&format!(" & .n{} {{", i));
        }
        nested.push_str(" color: red;");
        for _ in 0..12 {
            nested.push_str(" }");
        }
        nested.push('}');
        let result = parse(&nested, &ParserOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn strict_mode_rejects_empty_selector() {
        let options = ParserOptions::default().with_raise_parse_errors(true);
        let result = parse(", .b { color: red; }", &options);
        assert!(result.is_err());
    }
}
