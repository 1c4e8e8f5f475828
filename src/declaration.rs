//! Declaration parser (spec.md §4.2): turns a `prop: val; prop: val;`
//! byte range into a sequence of [`crate::model::Declaration`].
//!
//! The teacher splits declaration *parsing* from property *modeling*
//! (`declaration.rs` vs. `properties/*.rs`) because it builds a typed
//! property AST; this crate's string-based model has no separate
//! typed-property layer, so both roles fold into this one module.

use crate::error::{CssError, CssResult, ErrorKind};
use crate::model::Declaration;
use crate::scanner;
use crate::url_rewriter::{self, UrlResolver};
use crate::util::{normalize_property_name, strip_important};

pub const MAX_PROPERTY_NAME_LENGTH: usize = 256;
pub const MAX_PROPERTY_VALUE_LENGTH: usize = 32 * 1024;

/// Per-parse context threaded down from [`crate::parser::ParserOptions`]
/// (declaration.rs sits below parser.rs in the dependency order, so it
/// defines its own narrow context rather than depending on the parser's
/// full options type).
pub struct DeclarationContext<'a> {
    pub check_empty_values: bool,
    pub check_malformed_declarations: bool,
    pub base_uri: Option<&'a str>,
    pub resolver: Option<&'a dyn UrlResolver>,
}

impl<'a> DeclarationContext<'a> {
    pub fn lenient() -> Self {
        DeclarationContext {
            check_empty_values: false,
            check_malformed_declarations: false,
            base_uri: None,
            resolver: None,
        }
    }
}

/// Find the first top-level (paren/quote-depth 0) `:` or `;` at or after
/// `start`. Returns `(pos, byte)`, or `None` if neither appears before
/// `end`.
fn find_colon_or_semi(css: &[u8], start: usize, end: usize) -> Option<(usize, u8)> {
    let mut depth = 0i32;
    let mut i = start;
    while i < end {
        match css[i] {
            b'"' | b'\'' => {
                i = scanner::skip_string(css, i, end);
                continue;
            }
            b'(' => depth += 1,
            b')' => depth -= 1,
            b':' if depth <= 0 => return Some((i, b':')),
            b';' if depth <= 0 => return Some((i, b';')),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Parse every `prop: val [!important];` statement in `css[start..end]`
/// (spec.md §4.2).
pub fn parse_declarations(
    css: &str,
    start: usize,
    end: usize,
    ctx: &DeclarationContext,
) -> CssResult<Vec<Declaration>> {
    let bytes = css.as_bytes();
    let mut out = Vec::new();
    let mut pos = start;

    loop {
        pos = scanner::skip_whitespace_and_comments(bytes, pos, end);
        while pos < end && bytes[pos] == b';' {
            pos += 1;
            pos = scanner::skip_whitespace_and_comments(bytes, pos, end);
        }
        if pos >= end {
            break;
        }

        let stmt_start = pos;
        let colon_pos = match find_colon_or_semi(bytes, stmt_start, end) {
            Some((p, b':')) => p,
            Some((semi, b';')) => {
                if ctx.check_malformed_declarations {
                    return Err(CssError::new(
                        ErrorKind::MalformedDeclaration,
                        stmt_start,
                        "declaration missing ':'",
                    ));
                }
                pos = semi + 1;
                continue;
            }
            _ => {
                if ctx.check_malformed_declarations {
                    return Err(CssError::new(
                        ErrorKind::MalformedDeclaration,
                        stmt_start,
                        "declaration missing ':'",
                    ));
                }
                pos = end;
                continue;
            }
        };

        let (prop_start, prop_end) = scanner::trim(bytes, stmt_start, colon_pos);
        if prop_end <= prop_start {
            if ctx.check_malformed_declarations {
                return Err(CssError::new(
                    ErrorKind::MalformedDeclaration,
                    stmt_start,
                    "empty property name",
                ));
            }
            // Recover: skip to the next top-level ';'.
            pos = scanner::find_top_level(bytes, colon_pos + 1, end, b';')
                .map(|p| p + 1)
                .unwrap_or(end);
            continue;
        }
        if prop_end - prop_start > MAX_PROPERTY_NAME_LENGTH {
            return Err(CssError::new(
                ErrorKind::Size,
                prop_start,
                format!(
                    "property name exceeds {} bytes",
                    MAX_PROPERTY_NAME_LENGTH
                ),
            ));
        }
        let property_raw = scanner::substring(bytes, prop_start, prop_end);

        let value_start = colon_pos + 1;
        let value_end_semi = scanner::find_top_level(bytes, value_start, end, b';');
        let raw_value_end = value_end_semi.unwrap_or(end);
        let (val_start, val_end) = scanner::trim(bytes, value_start, raw_value_end);
        let raw_value = scanner::substring(bytes, val_start, val_end);

        let (stripped, important) = strip_important(&raw_value);
        let value_text = stripped.trim();

        if value_text.len() > MAX_PROPERTY_VALUE_LENGTH {
            return Err(CssError::new(
                ErrorKind::Size,
                val_start,
                format!(
                    "property value exceeds {} bytes",
                    MAX_PROPERTY_VALUE_LENGTH
                ),
            ));
        }

        pos = value_end_semi.map(|p| p + 1).unwrap_or(end);

        if value_text.is_empty() {
            if ctx.check_empty_values {
                return Err(CssError::new(ErrorKind::EmptyValue, value_start, "empty value"));
            }
            continue;
        }

        let property = normalize_property_name(&property_raw);
        let value = match ctx.resolver {
            Some(resolver) => url_rewriter::rewrite_urls(value_text, ctx.base_uri, Some(resolver)),
            None => value_text.to_string(),
        };

        out.push(Declaration::new(property, value, important));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(css: &str) -> Vec<Declaration> {
        parse_declarations(css, 0, css.len(), &DeclarationContext::lenient()).unwrap()
    }

    #[test]
    fn parses_simple_declarations() {
        let decls = parse("color: red; margin: 0;");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0], Declaration::new("color", "red", false));
        assert_eq!(decls[1], Declaration::new("margin", "0", false));
    }

    #[test]
    fn detects_important() {
        let decls = parse("color: red !important;");
        assert_eq!(decls[0], Declaration::new("color", "red", true));
    }

    #[test]
    fn preserves_custom_property_case() {
        let decls = parse("--MyVar: 10px;");
        assert_eq!(decls[0].property, "--MyVar");
    }

    #[test]
    fn lowercases_standard_property_name() {
        let decls = parse("COLOR: red;");
        assert_eq!(decls[0].property, "color");
    }

    #[test]
    fn url_with_embedded_semicolon_does_not_truncate_value() {
        let decls = parse("background: url(data:image/png;base64,Zm9v);");
        assert_eq!(decls[0].value, "url(data:image/png;base64,Zm9v)");
    }

    #[test]
    fn skips_empty_declaration_in_lenient_mode() {
        let decls = parse("color: ;margin: 0;");
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].property, "margin");
    }

    #[test]
    fn empty_value_is_fatal_in_strict_mode() {
        let ctx = DeclarationContext {
            check_empty_values: true,
            ..DeclarationContext::lenient()
        };
        let result = parse_declarations("color: ;", 0, 8, &ctx);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_declaration_recovers_in_lenient_mode() {
        let decls = parse("not-a-declaration; color: red;");
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].property, "color");
    }

    #[test]
    fn malformed_declaration_is_fatal_in_strict_mode() {
        let ctx = DeclarationContext {
            check_malformed_declarations: true,
            ..DeclarationContext::lenient()
        };
        let result = parse_declarations("not-a-declaration;", 0, 18, &ctx);
        assert!(result.is_err());
    }

    #[test]
    fn property_name_over_limit_is_a_size_error() {
        let long_name = "a".repeat(MAX_PROPERTY_NAME_LENGTH + 1);
        let css = format!("{}: red;", long_name);
        let result = parse_declarations(&css, 0, css.len(), &DeclarationContext::lenient());
        assert!(matches!(result, Err(e) if e.kind == ErrorKind::Size));
    }

    #[test]
    fn rewrites_urls_when_resolver_present() {
        struct Upper;
        impl UrlResolver for Upper {
            fn resolve(&self, url: &str, _base: &str) -> Option<String> {
                Some(url.to_ascii_uppercase())
            }
        }
        let ctx = DeclarationContext {
            base_uri: Some("/x/"),
            resolver: Some(&Upper),
            ..DeclarationContext::lenient()
        };
        let decls = parse_declarations("background: url(a.png);", 0, 24, &ctx).unwrap();
        assert_eq!(decls[0].value, "url('A.PNG')");
    }
}
