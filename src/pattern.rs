//! Compiled patterns and the matching operations on them.

use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use crate::compiler::{self, CaseMode, Program};
use crate::config::Config;
use crate::error::{Error, Feature, Result, SyntaxErrorKind};
use crate::fastpath::{self, FastPath};
use crate::flags::Flags;
use crate::haystack::{Decoded, Haystack, TextKind};
use crate::matches::{Found, Match};
use crate::parser;
use crate::vm::{self, Anchor, Slots};

/// How a pattern is executed.
#[derive(Debug, Clone)]
enum Strategy {
    Fast(FastPath),
    General(Program),
}

/// Builds a [`Pattern`] with non-default options.
#[derive(Debug, Clone)]
pub struct PatternBuilder {
    pattern: String,
    kind: TextKind,
    config: Config,
}

impl PatternBuilder {
    /// Builder for a text pattern.
    pub fn new(pattern: &str) -> Self {
        Self::with_kind(pattern.to_string(), TextKind::Str)
    }

    /// Builder for a bytes pattern. Each byte stands for one pattern char.
    pub fn bytes(pattern: &[u8]) -> Self {
        Self::with_kind(pattern.to_pattern_text(), TextKind::Bytes)
    }

    pub(crate) fn with_kind(pattern: String, kind: TextKind) -> Self {
        PatternBuilder {
            pattern,
            kind,
            config: Config::default(),
        }
    }

    pub fn flags(&mut self, flags: Flags) -> &mut Self {
        self.config.flags = flags;
        self
    }

    pub fn step_limit(&mut self, limit: u64) -> &mut Self {
        self.config.step_limit = limit;
        self
    }

    pub fn size_limit(&mut self, limit: usize) -> &mut Self {
        self.config.size_limit = limit;
        self
    }

    /// Enable or disable the hand-written matchers for known patterns.
    pub fn fast_paths(&mut self, enabled: bool) -> &mut Self {
        self.config.fast_paths = enabled;
        self
    }

    pub fn build(&self) -> Result<Pattern> {
        let mut config = self.config;

        if config.fast_paths {
            let fingerprint = fastpath::fingerprint(&self.pattern, config.flags, self.kind);
            if let Some(fast) = fastpath::lookup(&fingerprint) {
                check_flags(fingerprint.flags, self.kind)?;
                tracing::debug!(pattern = %self.pattern, ?fast, "using fast path");
                config.flags = fingerprint.flags;
                let mut names = vec![None; fast.group_count() + 1];
                for &(id, name) in fast.group_names() {
                    names[id] = Some(name.to_string());
                }
                return Ok(Pattern {
                    pattern: self.pattern.clone(),
                    kind: self.kind,
                    config,
                    names: names.into(),
                    strategy: Strategy::Fast(fast),
                });
            }
        }

        let (ast, flags) = parser::parse(&self.pattern, config.flags)?;
        check_flags(flags, self.kind)?;
        config.flags = flags;
        let program = compiler::compile(&ast, case_mode(flags, self.kind), config.size_limit)?;
        tracing::debug!(
            pattern = %self.pattern,
            groups = ast.group_count,
            insts = program.insts.len(),
            "compiled general program"
        );
        Ok(Pattern {
            pattern: self.pattern.clone(),
            kind: self.kind,
            config,
            names: ast.group_names.into(),
            strategy: Strategy::General(program),
        })
    }
}

fn check_flags(flags: Flags, kind: TextKind) -> Result<()> {
    let incompatible = match kind {
        TextKind::Str => flags.contains(Flags::LOCALE),
        TextKind::Bytes => flags.contains(Flags::UNICODE),
    } || flags.contains(Flags::ASCII | Flags::UNICODE)
        || flags.contains(Flags::ASCII | Flags::LOCALE);
    if incompatible {
        return Err(Error::syntax(SyntaxErrorKind::IncompatibleFlags, 0));
    }
    Ok(())
}

fn case_mode(flags: Flags, kind: TextKind) -> CaseMode {
    if !flags.contains(Flags::IGNORECASE) {
        CaseMode::Sensitive
    } else if kind == TextKind::Bytes || flags.ascii_folding() {
        CaseMode::AsciiInsensitive
    } else {
        CaseMode::Insensitive
    }
}

/// Clamp a caller window to `0..=len` with `pos <= endpos`.
fn window(range: impl RangeBounds<usize>, len: usize) -> (usize, usize) {
    let pos = match range.start_bound() {
        Bound::Included(&n) => n,
        Bound::Excluded(&n) => n.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let endpos = match range.end_bound() {
        Bound::Included(&n) => n.saturating_add(1),
        Bound::Excluded(&n) => n,
        Bound::Unbounded => len,
    };
    let pos = pos.min(len);
    (pos, endpos.min(len).max(pos))
}

/// A compiled regular expression.
///
/// Patterns are immutable and can be shared between threads. Every
/// matching method takes the subject as a [`Haystack`] and fails with
/// [`Error::TypeMismatch`] when it is not the pattern's text kind.
#[derive(Debug, Clone)]
pub struct Pattern {
    pattern: String,
    kind: TextKind,
    config: Config,
    /// Index 0 is the whole match and never has a name.
    names: Arc<[Option<String>]>,
    strategy: Strategy,
}

impl Pattern {
    /// Compile a text pattern.
    pub fn new(pattern: &str, flags: Flags) -> Result<Pattern> {
        PatternBuilder::new(pattern).flags(flags).build()
    }

    /// Compile a bytes pattern.
    pub fn new_bytes(pattern: &[u8], flags: Flags) -> Result<Pattern> {
        PatternBuilder::bytes(pattern).flags(flags).build()
    }

    /// The pattern text. Bytes patterns read one char per byte.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Flags in effect, including leading inline flags.
    pub fn flags(&self) -> Flags {
        self.config.flags
    }

    pub fn kind(&self) -> TextKind {
        self.kind
    }

    pub fn group_count(&self) -> usize {
        self.names.len() - 1
    }

    /// Named groups and their indices, in pattern order.
    pub fn group_index(&self) -> Vec<(&str, usize)> {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| Some((name.as_deref()?, i)))
            .collect()
    }

    /// Whether this pattern is served by a hand-written matcher.
    pub fn is_fast_path(&self) -> bool {
        matches!(self.strategy, Strategy::Fast(_))
    }

    /// Match at the start of `text` (Python's `match`).
    pub fn prefix_match<'h, H: Haystack + ?Sized>(
        &self,
        text: &'h H,
    ) -> Result<Option<Match<'h, H>>> {
        self.find_at(text, .., Anchor::Start)
    }

    /// Match at the start of the window `range` of `text`.
    pub fn prefix_match_in<'h, H: Haystack + ?Sized>(
        &self,
        text: &'h H,
        range: impl RangeBounds<usize>,
    ) -> Result<Option<Match<'h, H>>> {
        self.find_at(text, range, Anchor::Start)
    }

    /// Match all of `text`.
    pub fn fullmatch<'h, H: Haystack + ?Sized>(&self, text: &'h H) -> Result<Option<Match<'h, H>>> {
        self.find_at(text, .., Anchor::Both)
    }

    /// Match all of the window `range` of `text`.
    pub fn fullmatch_in<'h, H: Haystack + ?Sized>(
        &self,
        text: &'h H,
        range: impl RangeBounds<usize>,
    ) -> Result<Option<Match<'h, H>>> {
        self.find_at(text, range, Anchor::Both)
    }

    /// Leftmost match anywhere in `text`.
    pub fn search<'h, H: Haystack + ?Sized>(&self, text: &'h H) -> Result<Option<Match<'h, H>>> {
        self.find_at(text, .., Anchor::Unanchored)
    }

    /// Leftmost match inside the window `range` of `text`.
    pub fn search_in<'h, H: Haystack + ?Sized>(
        &self,
        text: &'h H,
        range: impl RangeBounds<usize>,
    ) -> Result<Option<Match<'h, H>>> {
        self.find_at(text, range, Anchor::Unanchored)
    }

    /// Every non-overlapping match, as texts or group tuples.
    pub fn findall<'h, H: Haystack + ?Sized>(&self, text: &'h H) -> Result<Vec<Found<'h, H>>> {
        self.finditer(text)?
            .map(|m| m.map(|m| Found::from_match(&m)))
            .collect()
    }

    /// Iterate over non-overlapping matches from left to right.
    ///
    /// After an empty match the next search starts one unit further on.
    pub fn finditer<'p, 'h, H: Haystack + ?Sized>(
        &'p self,
        text: &'h H,
    ) -> Result<Matches<'p, 'h, H>> {
        self.check_kind::<H>()?;
        let decoded = text.decode();
        let endpos = decoded.len();
        Ok(Matches {
            pattern: self,
            haystack: text,
            text: decoded,
            at: 0,
            endpos,
            done: false,
        })
    }

    /// Replace up to `count` matches (`0` means all) with `repl`.
    pub fn sub<H: Haystack + ?Sized>(&self, repl: &H, text: &H, count: usize) -> Result<H::Owned> {
        Ok(self.subn(repl, text, count)?.0)
    }

    /// Replace up to `count` matches (`0` means all) with `repl` and report
    /// how many were replaced.
    ///
    /// `repl` is literal. A backslash is only accepted for the registered
    /// bracket-trimming templates, where `\1` stands for the first group;
    /// anything else fails with [`Feature::ReplacementTemplate`].
    pub fn subn<H: Haystack + ?Sized>(
        &self,
        repl: &H,
        text: &H,
        count: usize,
    ) -> Result<(H::Owned, usize)> {
        if !repl.as_bytes().contains(&b'\\') {
            return self.replace(text, count, |_| repl);
        }
        let group = fastpath::group_template(&self.pattern, self.kind, &repl.to_pattern_text())
            .ok_or(Error::Unsupported(Feature::ReplacementTemplate))?;
        tracing::debug!(pattern = %self.pattern, group, "expanding group template");
        self.replace(text, count, |m| m.group(group).unwrap_or(H::empty()))
    }

    /// Replace up to `count` matches (`0` means all) with whatever
    /// `replace` returns for each.
    pub fn sub_fn<'h, H, F, R>(&self, text: &'h H, count: usize, replace: F) -> Result<(H::Owned, usize)>
    where
        H: Haystack + ?Sized,
        F: FnMut(&Match<'h, H>) -> R,
        R: AsRef<H>,
    {
        self.replace(text, count, replace)
    }

    fn replace<'h, H, F, R>(&self, text: &'h H, count: usize, mut replace: F) -> Result<(H::Owned, usize)>
    where
        H: Haystack + ?Sized,
        F: FnMut(&Match<'h, H>) -> R,
        R: AsRef<H>,
    {
        let mut out = H::Owned::default();
        let mut last = 0;
        let mut replaced = 0;
        let mut matches = self.finditer(text)?;
        while count == 0 || replaced < count {
            let Some(m) = matches.next().transpose()? else {
                break;
            };
            let (start, end) = m.byte_span();
            text.slice(last..start).push_onto(&mut out);
            replace(&m).as_ref().push_onto(&mut out);
            last = end;
            replaced += 1;
        }
        text.slice(last..text.as_bytes().len()).push_onto(&mut out);
        Ok((out, replaced))
    }

    /// Split `text` at up to `maxsplit` matches (`0` means all). The groups
    /// of each separator are interleaved with the pieces; groups that did
    /// not participate appear as `None`.
    pub fn split<'h, H: Haystack + ?Sized>(
        &self,
        text: &'h H,
        maxsplit: usize,
    ) -> Result<Vec<Option<&'h H>>> {
        let mut out = Vec::new();
        let mut last = 0;
        let mut splits = 0;
        let mut matches = self.finditer(text)?;
        while maxsplit == 0 || splits < maxsplit {
            let Some(m) = matches.next().transpose()? else {
                break;
            };
            let (start, end) = m.byte_span();
            out.push(Some(text.slice(last..start)));
            out.extend(m.groups());
            last = end;
            splits += 1;
        }
        out.push(Some(text.slice(last..text.as_bytes().len())));
        Ok(out)
    }

    /// A cursor over `text` that keeps its position between calls.
    pub fn scanner<'p, 'h, H: Haystack + ?Sized>(
        &'p self,
        text: &'h H,
    ) -> Result<ScanCursor<'p, 'h, H>> {
        self.check_kind::<H>()?;
        let decoded = text.decode();
        let endpos = decoded.len();
        Ok(ScanCursor {
            pattern: self,
            haystack: text,
            text: decoded,
            at: 0,
            endpos,
        })
    }

    fn find_at<'h, H: Haystack + ?Sized>(
        &self,
        text: &'h H,
        range: impl RangeBounds<usize>,
        anchor: Anchor,
    ) -> Result<Option<Match<'h, H>>> {
        self.check_kind::<H>()?;
        let decoded = text.decode();
        let (pos, endpos) = window(range, decoded.len());
        let Some(slots) = self.run(&decoded, pos, endpos, anchor)? else {
            return Ok(None);
        };
        Ok(Some(self.to_match(text, &decoded, &slots, (pos, endpos))))
    }

    fn check_kind<H: Haystack + ?Sized>(&self) -> Result<()> {
        if H::KIND != self.kind {
            return Err(Error::TypeMismatch {
                pattern: self.kind,
                subject: H::KIND,
            });
        }
        Ok(())
    }

    /// Run over `text.units[start..end]`, returning capture slots.
    pub(crate) fn run(
        &self,
        text: &Decoded<'_>,
        start: usize,
        end: usize,
        anchor: Anchor,
    ) -> Result<Option<Slots>> {
        match &self.strategy {
            Strategy::Fast(fast) => {
                let ascii_fold = self.kind == TextKind::Bytes || self.config.flags.ascii_folding();
                Ok(fast.run(&text.units, start, end, anchor, ascii_fold))
            }
            Strategy::General(program) => {
                vm::run(program, text, start, end, anchor, self.config.step_limit)
            }
        }
    }

    pub(crate) fn to_match<'h, H: Haystack + ?Sized>(
        &self,
        haystack: &'h H,
        text: &Decoded<'_>,
        slots: &Slots,
        window: (usize, usize),
    ) -> Match<'h, H> {
        Match::new(haystack, text, slots, Arc::clone(&self.names), window)
    }
}

/// Iterator over successive matches, from [`Pattern::finditer`].
pub struct Matches<'p, 'h, H: Haystack + ?Sized> {
    pattern: &'p Pattern,
    haystack: &'h H,
    text: Decoded<'h>,
    at: usize,
    endpos: usize,
    done: bool,
}

impl<'h, H: Haystack + ?Sized> Iterator for Matches<'_, 'h, H> {
    type Item = Result<Match<'h, H>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.at > self.endpos {
            return None;
        }
        let slots = match self.pattern.run(&self.text, self.at, self.endpos, Anchor::Unanchored) {
            Ok(Some(slots)) => slots,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };
        let m = self
            .pattern
            .to_match(self.haystack, &self.text, &slots, (0, self.endpos));
        let (start, end) = m.span();
        self.at = if start == end { end + 1 } else { end };
        Some(Ok(m))
    }
}

/// A matching cursor over one subject, from [`Pattern::scanner`].
///
/// Each call starts where the previous match ended, or one unit further
/// on after an empty match.
pub struct ScanCursor<'p, 'h, H: Haystack + ?Sized> {
    pattern: &'p Pattern,
    haystack: &'h H,
    text: Decoded<'h>,
    at: usize,
    endpos: usize,
}

impl<'h, H: Haystack + ?Sized> ScanCursor<'_, 'h, H> {
    /// Match exactly at the cursor.
    pub fn match_next(&mut self) -> Result<Option<Match<'h, H>>> {
        self.step(Anchor::Start)
    }

    /// Search from the cursor onwards.
    pub fn search_next(&mut self) -> Result<Option<Match<'h, H>>> {
        self.step(Anchor::Unanchored)
    }

    /// Current cursor position in units.
    pub fn position(&self) -> usize {
        self.at
    }

    fn step(&mut self, anchor: Anchor) -> Result<Option<Match<'h, H>>> {
        if self.at > self.endpos {
            return Ok(None);
        }
        let Some(slots) = self.pattern.run(&self.text, self.at, self.endpos, anchor)? else {
            return Ok(None);
        };
        let m = self
            .pattern
            .to_match(self.haystack, &self.text, &slots, (self.at, self.endpos));
        let (start, end) = m.span();
        self.at = if start == end { end + 1 } else { end };
        Ok(Some(m))
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
