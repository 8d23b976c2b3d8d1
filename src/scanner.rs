//! A lexicon-driven tokenizer.

use std::fmt;

use crate::error::Result;
use crate::flags::Flags;
use crate::haystack::Haystack;
use crate::pattern::Pattern;
use crate::vm::Anchor;

type Action<T> = Box<dyn Fn(&str) -> T>;

struct Rule<T> {
    pattern: Pattern,
    /// `None` drops the matched text.
    action: Option<Action<T>>,
}

/// Tokenizes text with an ordered list of `(pattern, action)` rules.
///
/// At each position the rules are tried in order and the first that
/// matches wins. Scanning stops at the first position where no rule
/// matches or where the winning rule matches nothing.
///
/// ```
/// use minire::Scanner;
///
/// let scanner = Scanner::new()
///     .token(r"\d+", |s| s.parse::<i64>().unwrap_or_default())?
///     .skip(r"\s+")?;
/// let (tokens, rest) = scanner.scan("1 22 333 x")?;
/// assert_eq!(tokens, vec![1, 22, 333]);
/// assert_eq!(rest, "x");
/// # Ok::<(), minire::Error>(())
/// ```
pub struct Scanner<T> {
    flags: Flags,
    rules: Vec<Rule<T>>,
}

impl<T> Scanner<T> {
    pub fn new() -> Self {
        Scanner {
            flags: Flags::empty(),
            rules: Vec::new(),
        }
    }

    /// Flags used to compile rules added after this call.
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Add a rule whose matches become tokens through `action`.
    pub fn token(mut self, pattern: &str, action: impl Fn(&str) -> T + 'static) -> Result<Self> {
        self.push(pattern, Some(Box::new(action)))?;
        Ok(self)
    }

    /// Add a rule whose matches are consumed without producing a token.
    pub fn skip(mut self, pattern: &str) -> Result<Self> {
        self.push(pattern, None)?;
        Ok(self)
    }

    fn push(&mut self, pattern: &str, action: Option<Action<T>>) -> Result<()> {
        let pattern = Pattern::new(pattern, self.flags)?;
        self.rules.push(Rule { pattern, action });
        Ok(())
    }

    /// Tokenize `text`, returning the tokens and the unscanned remainder.
    pub fn scan<'h>(&self, text: &'h str) -> Result<(Vec<T>, &'h str)> {
        let decoded = text.decode();
        let end = decoded.len();
        let mut tokens = Vec::new();
        let mut at = 0;
        'scan: loop {
            for rule in &self.rules {
                let Some(slots) = rule.pattern.run(&decoded, at, end, Anchor::Start)? else {
                    continue;
                };
                let stop = slots[1].unwrap_or(at);
                if stop == at {
                    break 'scan;
                }
                if let Some(action) = &rule.action {
                    let piece = &text[decoded.byte_offset(at)..decoded.byte_offset(stop)];
                    tokens.push(action(piece));
                }
                at = stop;
                continue 'scan;
            }
            break;
        }
        tracing::trace!(tokens = tokens.len(), at, "scan finished");
        Ok((tokens, &text[decoded.byte_offset(at)..]))
    }
}

impl<T> Default for Scanner<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Scanner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns: Vec<&str> = self.rules.iter().map(|r| r.pattern.as_str()).collect();
        f.debug_struct("Scanner")
            .field("flags", &self.flags)
            .field("patterns", &patterns)
            .finish()
    }
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
