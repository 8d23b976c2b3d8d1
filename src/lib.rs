//! A small backtracking regular-expression engine with a Python `re`
//! shaped surface.
//!
//! Patterns are parsed into an [`ast::Node`] tree, lowered to a flat
//! program and run by an iterative backtracking VM with a step budget.
//! A handful of hot patterns are served by hand-written linear matchers
//! instead; they produce the same results as the general engine.
//!
//! ```
//! use minire::{Flags, Pattern};
//!
//! let pattern = Pattern::new(r"(\w+)@(\w+)\.com", Flags::empty())?;
//! let m = pattern.search("mail alice@example.com today")?.unwrap();
//! assert_eq!(m.group(1), Some("alice"));
//! assert_eq!(m.span(), (5, 22));
//! # Ok::<(), minire::Error>(())
//! ```

pub mod ast;
pub mod charset;
mod compiler;
mod config;
mod error;
mod fastpath;
mod flags;
mod haystack;
mod matches;
mod parser;
mod pattern;
mod scanner;
mod vm;

pub use config::{Config, DEFAULT_SIZE_LIMIT, DEFAULT_STEP_LIMIT};
pub use error::{Error, Feature, Result, SyntaxErrorKind};
pub use flags::Flags;
pub use haystack::{Haystack, TextKind};
pub use matches::{Found, Match};
pub use parser::parse;
pub use pattern::{Matches, Pattern, PatternBuilder, ScanCursor};
pub use scanner::Scanner;

/// Compile a text pattern.
pub fn compile(pattern: &str, flags: Flags) -> Result<Pattern> {
    Pattern::new(pattern, flags)
}

/// Compile a bytes pattern.
pub fn compile_bytes(pattern: &[u8], flags: Flags) -> Result<Pattern> {
    Pattern::new_bytes(pattern, flags)
}

fn compile_for<H: Haystack + ?Sized>(pattern: &H, flags: Flags) -> Result<Pattern> {
    PatternBuilder::with_kind(pattern.to_pattern_text(), H::KIND)
        .flags(flags)
        .build()
}

/// Match `pattern` at the start of `text`.
pub fn prefix_match<'h, H: Haystack + ?Sized>(
    pattern: &H,
    text: &'h H,
    flags: Flags,
) -> Result<Option<Match<'h, H>>> {
    compile_for(pattern, flags)?.prefix_match(text)
}

/// Match `pattern` against all of `text`.
pub fn fullmatch<'h, H: Haystack + ?Sized>(
    pattern: &H,
    text: &'h H,
    flags: Flags,
) -> Result<Option<Match<'h, H>>> {
    compile_for(pattern, flags)?.fullmatch(text)
}

/// Leftmost match of `pattern` in `text`.
pub fn search<'h, H: Haystack + ?Sized>(
    pattern: &H,
    text: &'h H,
    flags: Flags,
) -> Result<Option<Match<'h, H>>> {
    compile_for(pattern, flags)?.search(text)
}

pub fn findall<'h, H: Haystack + ?Sized>(
    pattern: &H,
    text: &'h H,
    flags: Flags,
) -> Result<Vec<Found<'h, H>>> {
    compile_for(pattern, flags)?.findall(text)
}

/// Every non-overlapping match of `pattern` in `text`, collected.
pub fn finditer<'h, H: Haystack + ?Sized>(
    pattern: &H,
    text: &'h H,
    flags: Flags,
) -> Result<Vec<Match<'h, H>>> {
    compile_for(pattern, flags)?.finditer(text)?.collect()
}

pub fn sub<H: Haystack + ?Sized>(
    pattern: &H,
    repl: &H,
    text: &H,
    count: usize,
    flags: Flags,
) -> Result<H::Owned> {
    compile_for(pattern, flags)?.sub(repl, text, count)
}

pub fn subn<H: Haystack + ?Sized>(
    pattern: &H,
    repl: &H,
    text: &H,
    count: usize,
    flags: Flags,
) -> Result<(H::Owned, usize)> {
    compile_for(pattern, flags)?.subn(repl, text, count)
}

pub fn split<'h, H: Haystack + ?Sized>(
    pattern: &H,
    text: &'h H,
    maxsplit: usize,
    flags: Flags,
) -> Result<Vec<Option<&'h H>>> {
    compile_for(pattern, flags)?.split(text, maxsplit)
}

/// Backslash-escape every char of `text` that is not alphanumeric or `_`,
/// so the result matches `text` literally.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if !(c.is_alphanumeric() || c == '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
