//! URL rewriting inside declaration values (spec.md §4.4).
//!
//! Grounded in the teacher's `bundler.rs` resolver-trait idiom
//! (`SourceProvider`/`FileProvider`): the caller supplies a pluggable
//! resolver, failures are swallowed locally, and the original text is
//! preserved rather than propagating the error up through parsing.

use crate::scanner;
use pathdiff::diff_paths;
use std::path::Path;

/// A pluggable URL resolver, analogous to the teacher's `SourceProvider`
/// trait for file loading. `resolve` may fail for any reason (missing
/// file, invalid path, network error in a caller's own implementation);
/// a `None` return preserves the original URL text unchanged (spec.md
/// §4.4, §7).
pub trait UrlResolver: Send + Sync {
    fn resolve(&self, url: &str, base_uri: &str) -> Option<String>;
}

/// The default resolver used when `absolute_paths` is set but no
/// `UrlResolver` was supplied: joins `url` onto the directory of
/// `base_uri` and normalizes `.`/`..` segments via `pathdiff`, the same
/// relative-path math the teacher's bundler needs when resolving
/// `@import` targets against the importing file's directory.
pub struct AbsolutePathResolver;

impl UrlResolver for AbsolutePathResolver {
    fn resolve(&self, url: &str, base_uri: &str) -> Option<String> {
        if url.is_empty() {
            return None;
        }
        let base_dir = Path::new(base_uri).parent().unwrap_or_else(|| Path::new(""));
        let joined = base_dir.join(url);
        let root = Path::new("/");
        let normalized = diff_paths(&joined, root)?;
        Some(format!("/{}", normalized.to_string_lossy()))
    }
}

fn starts_with_ignore_ascii_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// A URL is left unchanged when it begins with any of these (spec.md
/// §4.4): already-absolute, protocol-relative, a data URI, or a
/// fragment-only reference.
fn is_untouchable(url: &str) -> bool {
    starts_with_ignore_ascii_case(url, "data:")
        || starts_with_ignore_ascii_case(url, "http://")
        || starts_with_ignore_ascii_case(url, "https://")
        || url.starts_with("//")
        || url.starts_with('#')
}

/// Extract the URL body from `css[paren_start..paren_end]`, where
/// `paren_start` is the index of the `(` and `paren_end` the index of
/// the matching `)`. Strips one layer of matching quotes if present.
fn extract_url_body(css: &str, paren_start: usize, paren_end: usize) -> &str {
    let inner = css[paren_start + 1..paren_end].trim();
    if inner.len() >= 2 {
        let bytes = inner.as_bytes();
        if (bytes[0] == b'"' && bytes[inner.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[inner.len() - 1] == b'\'')
        {
            return &inner[1..inner.len() - 1];
        }
    }
    inner
}

/// Rewrite every `url(...)` token in `value` against `base_uri` using
/// `resolver`. Output URLs are canonicalized with single quotes (spec.md
/// §4.4). If `resolver` is `None`, the value is returned unchanged.
pub fn rewrite_urls(value: &str, base_uri: Option<&str>, resolver: Option<&dyn UrlResolver>) -> String {
    let (base_uri, resolver) = match (base_uri, resolver) {
        (Some(b), Some(r)) => (b, r),
        _ => return value.to_string(),
    };

    let bytes = value.as_bytes();
    let len = bytes.len();
    let mut out = String::with_capacity(value.len());
    let mut i = 0;
    while i < len {
        if i + 4 <= len && value[i..i + 4].eq_ignore_ascii_case("url(") {
            let paren_start = i + 3;
            let paren_end = scanner::find_matching_paren(bytes, paren_start, len);
            if paren_end < len {
                let url = extract_url_body(value, paren_start, paren_end);
                let rewritten = if is_untouchable(url) {
                    url.to_string()
                } else {
                    resolver.resolve(url, base_uri).unwrap_or_else(|| url.to_string())
                };
                out.push_str("url('");
                out.push_str(&rewritten);
                out.push_str("')");
                i = paren_end + 1;
                continue;
            }
        }
        // Advance by one char (not one byte) to stay on a UTF-8 boundary.
        let ch_len = value[i..].chars().next().map(char::len_utf8).unwrap_or(1);
        out.push_str(&value[i..i + ch_len]);
        i += ch_len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UpperResolver;
    impl UrlResolver for UpperResolver {
        fn resolve(&self, url: &str, _base: &str) -> Option<String> {
            Some(url.to_ascii_uppercase())
        }
    }

    struct FailingResolver;
    impl UrlResolver for FailingResolver {
        fn resolve(&self, _url: &str, _base: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn rewrites_relative_url() {
        let out = rewrite_urls("url(img.png)", Some("/base/"), Some(&UpperResolver));
        assert_eq!(out, "url('IMG.PNG')");
    }

    #[test]
    fn leaves_data_urls_untouched() {
        let out = rewrite_urls(
            "url(data:image/png;base64,abcd)",
            Some("/base/"),
            Some(&UpperResolver),
        );
        assert_eq!(out, "url('data:image/png;base64,abcd')");
    }

    #[test]
    fn leaves_absolute_and_fragment_urls_untouched() {
        assert_eq!(
            rewrite_urls("url(https://a.com/b.png)", Some("/base/"), Some(&UpperResolver)),
            "url('https://a.com/b.png')"
        );
        assert_eq!(
            rewrite_urls("url(#frag)", Some("/base/"), Some(&UpperResolver)),
            "url('#frag')"
        );
    }

    #[test]
    fn resolver_failure_preserves_original() {
        let out = rewrite_urls("url(img.png)", Some("/base/"), Some(&FailingResolver));
        assert_eq!(out, "url('img.png')");
    }

    #[test]
    fn quoted_urls_are_unwrapped_and_requoted() {
        let out = rewrite_urls("url(\"img.png\")", Some("/base/"), Some(&UpperResolver));
        assert_eq!(out, "url('IMG.PNG')");
    }

    #[test]
    fn no_resolver_leaves_value_untouched() {
        assert_eq!(rewrite_urls("url(img.png)", None, None), "url(img.png)");
    }
}
