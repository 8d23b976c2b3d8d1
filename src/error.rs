/// Errors raised by pattern compilation and matching.
use std::fmt;

use crate::haystack::TextKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong in the engine.
///
/// A failed match is not an error: matching operations return `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The pattern is malformed.
    #[error("{kind} at position {pos}")]
    Syntax { kind: SyntaxErrorKind, pos: usize },

    /// The pattern is well formed but uses something the engine does not implement.
    #[error("unsupported regex feature: {0}")]
    Unsupported(Feature),

    /// A str pattern was used on bytes, or the other way around.
    #[error("cannot use a {pattern} pattern on a {subject} subject")]
    TypeMismatch { pattern: TextKind, subject: TextKind },

    /// The matcher ran out of backtracking steps.
    #[error("match budget of {limit} steps exceeded")]
    BudgetExceeded { limit: u64 },

    /// Quantifier expansion produced more instructions than allowed.
    #[error("compiled pattern exceeds {limit} instructions")]
    TooLarge { limit: usize },
}

impl Error {
    pub(crate) fn syntax(kind: SyntaxErrorKind, pos: usize) -> Self {
        Error::Syntax { kind, pos }
    }

    /// The syntax error class, if this is a syntax error.
    pub fn syntax_kind(&self) -> Option<SyntaxErrorKind> {
        match self {
            Error::Syntax { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum SyntaxErrorKind {
    #[error("unbalanced parenthesis")]
    UnbalancedGroup,
    #[error("unterminated character set")]
    UnbalancedClass,
    #[error("bad escape (end of pattern)")]
    DanglingEscape,
    #[error("bad quantifier")]
    BadQuantifier,
    #[error("bad inline flags")]
    BadInlineFlags,
    #[error("bad escape")]
    BadEscape,
    #[error("bad character range")]
    BadCharRange,
    #[error("bad group name")]
    BadGroupName,
    #[error("incompatible flags")]
    IncompatibleFlags,
}

/// Regex constructs the engine recognizes but refuses to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Lookahead,
    Lookbehind,
    Backreference,
    PossessiveQuantifier,
    AtomicGroup,
    UnicodeProperty,
    WordBoundary,
    ConditionalGroup,
    ScopedFlags,
    MultilineAnchors,
    ReplacementTemplate,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Feature::Lookahead => "lookahead",
            Feature::Lookbehind => "lookbehind",
            Feature::Backreference => "backreference",
            Feature::PossessiveQuantifier => "possessive quantifier",
            Feature::AtomicGroup => "atomic group",
            Feature::UnicodeProperty => "unicode property escape",
            Feature::WordBoundary => "word boundary",
            Feature::ConditionalGroup => "conditional group",
            Feature::ScopedFlags => "scoped inline flags",
            Feature::MultilineAnchors => "multiline anchors",
            Feature::ReplacementTemplate => "replacement template",
        };
        f.write_str(name)
    }
}
