//! `csscade` — a CSS stylesheet processing engine: parse, cascade
//! ("flatten"), and serialize stylesheets, plus a standalone
//! shorthand/longhand expansion engine (spec.md §1, §2).
//!
//! The crate is organized the way the teacher splits stylesheet
//! concerns across modules — a scanner for raw text, a parser that
//! builds a flat rule arena, a cascade pass that resolves precedence,
//! and a printer that serializes the result back to CSS — rather than
//! one monolithic pass.
//!
//! ```
//! use csscade::{parse, flatten, serialize, ParserOptions};
//!
//! let sheet = parse(".a { color: red; } .a { color: blue; }", &ParserOptions::default()).unwrap();
//! let flat = flatten(&sheet);
//! assert_eq!(serialize(&flat, true), ".a{color:blue;}");
//! ```

pub mod cascade;
pub mod declaration;
pub mod error;
mod intern;
pub mod model;
pub mod parser;
pub mod printer;
pub mod scanner;
pub mod shorthand;
pub mod specificity;
mod util;
pub mod url_rewriter;

pub use cascade::{flatten, flatten_merge};
pub use error::{CssError, CssResult, ErrorKind};
pub use model::{
    AtRule, AtRuleContent, Declaration, ImportStatement, MediaQuery, NestingStyle, Rule, RuleNode,
    Stylesheet,
};
pub use parser::{parse, ParserOptions, StrictChecks};
pub use printer::serialize;
pub use shorthand::{create_shorthand, expand_shorthand, is_shorthand, LonghandMap};
pub use specificity::specificity;
pub use url_rewriter::{AbsolutePathResolver, UrlResolver};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_small_stylesheet() {
        let css = ".a { margin: 1px 2px; } .a { margin-top: 5px; }";
        let sheet = parse(css, &ParserOptions::default()).unwrap();
        let flat = flatten(&sheet);
        let out = serialize(&flat, true);
        assert_eq!(out, ".a{margin:5px 2px 1px;}");
    }

    #[test]
    fn merges_everything_into_one_rule() {
        let css = ".a { color: red; } .b { color: blue; }";
        let sheet = parse(css, &ParserOptions::default()).unwrap();
        let merged = flatten_merge(&sheet);
        assert_eq!(merged.rules.len(), 1);
        let out = serialize(&merged, true);
        assert!(out.contains("color:blue"));
    }
}
