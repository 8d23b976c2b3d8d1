//! Match results.

use std::fmt;
use std::sync::Arc;

use crate::haystack::{Decoded, Haystack};
use crate::vm::Slots;

type Span = Option<(usize, usize)>;

/// A successful match against a borrowed subject.
///
/// Spans are counted in units of the subject (chars for `str`, bytes for
/// `[u8]`). Group 0 is the whole match.
pub struct Match<'h, H: Haystack + ?Sized> {
    haystack: &'h H,
    spans: Vec<Span>,
    byte_spans: Vec<Span>,
    names: Arc<[Option<String>]>,
    pos: usize,
    endpos: usize,
}

impl<'h, H: Haystack + ?Sized> Match<'h, H> {
    pub(crate) fn new(
        haystack: &'h H,
        text: &Decoded<'_>,
        slots: &Slots,
        names: Arc<[Option<String>]>,
        window: (usize, usize),
    ) -> Self {
        let n_groups = names.len();
        let mut spans = Vec::with_capacity(n_groups);
        let mut byte_spans = Vec::with_capacity(n_groups);
        for group in 0..n_groups {
            let start = slots.get(group * 2).copied().flatten();
            let end = slots.get(group * 2 + 1).copied().flatten();
            let span = start.zip(end);
            spans.push(span);
            byte_spans.push(span.map(|(s, e)| (text.byte_offset(s), text.byte_offset(e))));
        }
        Match {
            haystack,
            spans,
            byte_spans,
            names,
            pos: window.0,
            endpos: window.1,
        }
    }

    /// The matched text.
    pub fn as_text(&self) -> &'h H {
        self.group(0).unwrap_or(H::empty())
    }

    /// Text of group `index`, or `None` if it did not participate or does
    /// not exist.
    pub fn group(&self, index: usize) -> Option<&'h H> {
        let (start, end) = (*self.byte_spans.get(index)?)?;
        Some(self.haystack.slice(start..end))
    }

    /// Text of the group called `name`.
    pub fn named(&self, name: &str) -> Option<&'h H> {
        self.group(self.index_of(name)?)
    }

    /// Index of the group called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n.as_deref() == Some(name))
    }

    /// Groups 1..N; `None` for groups that did not participate.
    pub fn groups(&self) -> Vec<Option<&'h H>> {
        (1..self.spans.len()).map(|i| self.group(i)).collect()
    }

    /// Groups 1..N with `default` for groups that did not participate.
    pub fn groups_or(&self, default: &'h H) -> Vec<&'h H> {
        (1..self.spans.len())
            .map(|i| self.group(i).unwrap_or(default))
            .collect()
    }

    /// Named groups in pattern order.
    pub fn groupdict(&self) -> Vec<(&str, Option<&'h H>)> {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| Some((name.as_deref()?, self.group(i))))
            .collect()
    }

    pub fn start(&self) -> usize {
        self.span().0
    }

    pub fn end(&self) -> usize {
        self.span().1
    }

    pub fn span(&self) -> (usize, usize) {
        self.spans[0].unwrap_or((self.pos, self.pos))
    }

    /// Span of group `index`, or `None` if it did not participate or does
    /// not exist.
    pub fn span_of(&self, index: usize) -> Option<(usize, usize)> {
        *self.spans.get(index)?
    }

    /// Number of capturing groups in the pattern.
    pub fn group_count(&self) -> usize {
        self.spans.len() - 1
    }

    /// The subject that was searched.
    pub fn haystack(&self) -> &'h H {
        self.haystack
    }

    /// Start of the window the search ran over.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// End of the window the search ran over.
    pub fn endpos(&self) -> usize {
        self.endpos
    }

    pub(crate) fn byte_span(&self) -> (usize, usize) {
        self.byte_spans[0].unwrap_or((0, 0))
    }
}

impl<H: Haystack + ?Sized> Clone for Match<'_, H> {
    fn clone(&self) -> Self {
        Match {
            haystack: self.haystack,
            spans: self.spans.clone(),
            byte_spans: self.byte_spans.clone(),
            names: Arc::clone(&self.names),
            pos: self.pos,
            endpos: self.endpos,
        }
    }
}

impl<H: Haystack + fmt::Debug + ?Sized> fmt::Debug for Match<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("span", &self.span())
            .field("text", &self.as_text())
            .finish()
    }
}

/// One item of [`Pattern::findall`](crate::Pattern::findall).
#[derive(Debug, PartialEq, Eq)]
pub enum Found<'h, H: ?Sized> {
    /// The whole match, or the only group when the pattern has exactly one.
    Text(&'h H),
    /// Every group, with an empty text for groups that did not participate.
    Groups(Vec<&'h H>),
}

impl<'h, H: Haystack + ?Sized> Found<'h, H> {
    pub(crate) fn from_match(m: &Match<'h, H>) -> Self {
        match m.group_count() {
            0 => Found::Text(m.as_text()),
            1 => Found::Text(m.group(1).unwrap_or(H::empty())),
            _ => Found::Groups(m.groups_or(H::empty())),
        }
    }
}

impl<H: ?Sized> Clone for Found<'_, H> {
    fn clone(&self) -> Self {
        match self {
            Found::Text(text) => Found::Text(text),
            Found::Groups(groups) => Found::Groups(groups.clone()),
        }
    }
}
