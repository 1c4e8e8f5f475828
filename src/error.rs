//! Error types returned by [`crate::parse`].
//!
//! Mirrors the teacher's `BundleErrorKind` shape (one enum, a `reason()`
//! method, a carried position) rather than pulling in a separate error
//! crate — this repo has no `thiserror`/`anyhow` dependency, matching the
//! corpus this is grounded on.

use std::fmt;

/// The symbolic tag carried on a [`CssError`], per spec.md §6's
/// `ParseError` payload (`type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedDeclaration,
    EmptyValue,
    InvalidSelector,
    InvalidSelectorSyntax,
    MalformedAtRule,
    UnclosedBlock,
    Depth,
    Size,
}

impl ErrorKind {
    fn label(&self) -> &'static str {
        match self {
            ErrorKind::MalformedDeclaration => "malformed_declaration",
            ErrorKind::EmptyValue => "empty_value",
            ErrorKind::InvalidSelector => "invalid_selector",
            ErrorKind::InvalidSelectorSyntax => "invalid_selector_syntax",
            ErrorKind::MalformedAtRule => "malformed_at_rule",
            ErrorKind::UnclosedBlock => "unclosed_block",
            ErrorKind::Depth => "depth_error",
            ErrorKind::Size => "size_error",
        }
    }
}

/// A fatal parse/flatten error.
///
/// Carries the byte offset at which the condition was detected and a
/// symbolic `kind`, per spec.md §6/§7. All three error "kinds" described
/// in §7 (parse, depth, size) are represented as one enum, following the
/// teacher's `BundleErrorKind` precedent of folding distinct failure
/// causes into a single error type with a `reason()` string rather than
/// three separate types the caller has to match across.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssError {
    pub kind: ErrorKind,
    pub pos: usize,
    pub message: String,
}

impl CssError {
    pub fn new(kind: ErrorKind, pos: usize, message: impl Into<String>) -> Self {
        CssError {
            kind,
            pos,
            message: message.into(),
        }
    }

    pub fn reason(&self) -> String {
        format!("{} at byte {}: {}", self.kind.label(), self.pos, self.message)
    }

    pub fn type_tag(&self) -> &'static str {
        self.kind.label()
    }
}

impl fmt::Display for CssError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason())
    }
}

impl std::error::Error for CssError {}

pub type CssResult<T> = Result<T, CssError>;
