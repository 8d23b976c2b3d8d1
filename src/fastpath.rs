//! Hand-written matchers for hot patterns.
//!
//! The table is keyed on a normalized fingerprint of the pattern. Every
//! entry returns exactly the slots the general engine would produce for
//! the same pattern; it only gets there in linear time.

use crate::charset::eq_folded;
use crate::flags::Flags;
use crate::haystack::TextKind;
use crate::vm::{Anchor, Slots};

/// A closed-form matcher standing in for a compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastPath {
    /// `\s+`
    WhitespaceRun,
    /// `0*$`
    AllZeros,
    /// `50*$`
    ExactHalf,
    /// `\n\n\n+`
    BlankLines,
    /// `[0-9a-fA-F]{n}`
    HexRun(usize),
    /// `(.*?)(["\\\x00-\x1f])`, the string chunker of a JSON decoder.
    StringChunk,
    /// The decimal numeric-string grammar, matched case-insensitively.
    DecimalNumber,
    /// The format-specification mini-language.
    FormatSpec,
    /// `\(.*?\)+(?=\s|$)|\[.*?\]+(?=\s|$)|\S+`, the usage-line splitter of
    /// an argument parser's help formatter.
    UsageWord,
}

/// The normalized identity of a pattern used for table lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub kind: TextKind,
    pub text: String,
    /// Flags after folding in the leading inline flags.
    pub flags: Flags,
}

struct Entry {
    pattern: &'static str,
    ignore_case: bool,
    fast: FastPath,
}

const DECIMAL_PATTERN: &str = concat!(
    r"(?P<sign>[-+])?",
    r"((?=\d|\.\d)(?P<int>\d*)(\.(?P<frac>\d*))?(E(?P<exp>[-+]?\d+))?",
    r"|Inf(inity)?",
    r"|(?P<signal>s)?NaN(?P<diag>\d*))",
    r"\Z",
);

const FORMAT_SPEC_PATTERN: &str = concat!(
    r"\A(?:(?P<fill>.)?(?P<align>[<>=^]))?",
    r"(?P<sign>[-+ ])?",
    r"(?P<no_neg_0>z)?",
    r"(?P<alt>\#)?",
    r"(?P<zeropad>0)?",
    r"(?P<minimumwidth>(?!0)\d+)?",
    r"(?P<thousands_sep>[,_])?",
    r"(?:\.(?P<precision>0|(?!0)\d+))?",
    r"(?P<type>[eEfFgGn%])?",
    r"\Z",
);

const USAGE_WORD_PATTERN: &str = concat!(
    r"\(.*?\)+(?=\s|$)|",
    r"\[.*?\]+(?=\s|$)|",
    r"\S+",
);

static STR_TABLE: &[Entry] = &[
    Entry {
        pattern: r"\s+",
        ignore_case: false,
        fast: FastPath::WhitespaceRun,
    },
    Entry {
        pattern: "0*$",
        ignore_case: false,
        fast: FastPath::AllZeros,
    },
    Entry {
        pattern: "50*$",
        ignore_case: false,
        fast: FastPath::ExactHalf,
    },
    Entry {
        pattern: r"\n\n\n+",
        ignore_case: false,
        fast: FastPath::BlankLines,
    },
    Entry {
        pattern: "[0-9a-fA-F]{4}",
        ignore_case: false,
        fast: FastPath::HexRun(4),
    },
    Entry {
        pattern: r#"(.*?)(["\\\x00-\x1f])"#,
        ignore_case: false,
        fast: FastPath::StringChunk,
    },
    Entry {
        pattern: DECIMAL_PATTERN,
        ignore_case: true,
        fast: FastPath::DecimalNumber,
    },
    Entry {
        pattern: FORMAT_SPEC_PATTERN,
        ignore_case: false,
        fast: FastPath::FormatSpec,
    },
    Entry {
        pattern: USAGE_WORD_PATTERN,
        ignore_case: false,
        fast: FastPath::UsageWord,
    },
];

/// `(pattern, replacement, group)`: replacement templates that stand for
/// one group of the match. Used to trim blanks inside brackets.
static GROUP_TEMPLATES: &[(&str, &str, usize)] = &[
    (r"([\[(]) ", r"\1", 1),
    (r" ([\])])", r"\1", 1),
];

static BYTES_TABLE: &[Entry] = &[
    Entry {
        pattern: r"\s+",
        ignore_case: false,
        fast: FastPath::WhitespaceRun,
    },
    Entry {
        pattern: "[0-9a-fA-F]{2}",
        ignore_case: false,
        fast: FastPath::HexRun(2),
    },
];

/// Compute the lookup key for `pattern`: leading `(?flags)` groups are folded
/// into the flags and, in verbose mode, whitespace and comments are dropped.
pub fn fingerprint(pattern: &str, flags: Flags, kind: TextKind) -> Fingerprint {
    let (rest, flags) = strip_leading_flags(pattern, flags);
    let text = if flags.contains(Flags::VERBOSE) {
        strip_verbose(rest)
    } else {
        rest.to_string()
    };
    Fingerprint { kind, text, flags }
}

/// Find the fast path registered for `fingerprint`, if any.
///
/// `$` in these matchers only binds to the end of the window, so under
/// `MULTILINE` the entries using it are refused and the pattern goes to
/// the general engine.
pub fn lookup(fingerprint: &Fingerprint) -> Option<FastPath> {
    let table = match fingerprint.kind {
        TextKind::Str => STR_TABLE,
        TextKind::Bytes => BYTES_TABLE,
    };
    let ignore_case = fingerprint.flags.contains(Flags::IGNORECASE);
    let multiline = fingerprint.flags.contains(Flags::MULTILINE);
    table
        .iter()
        .find(|e| e.pattern == fingerprint.text && e.ignore_case == ignore_case)
        .map(|e| e.fast)
        .filter(|fast| !(multiline && fast.has_line_anchor()))
}

/// The group a replacement template stands for, when `(pattern, repl)` is
/// a registered pair.
pub fn group_template(pattern: &str, kind: TextKind, repl: &str) -> Option<usize> {
    if kind != TextKind::Str {
        return None;
    }
    GROUP_TEMPLATES
        .iter()
        .find(|&&(p, r, _)| p == pattern && r == repl)
        .map(|&(_, _, group)| group)
}

fn strip_leading_flags(mut pattern: &str, mut flags: Flags) -> (&str, Flags) {
    loop {
        let trimmed = if flags.contains(Flags::VERBOSE) {
            pattern.trim_start()
        } else {
            pattern
        };
        let Some(body) = trimmed.strip_prefix("(?") else {
            return (pattern, flags);
        };
        let Some(close) = body.find(')') else {
            return (pattern, flags);
        };
        match Flags::from_letters(&body[..close]) {
            Some(parsed) if close > 0 => {
                flags |= parsed;
                pattern = &body[close + 1..];
            }
            _ => return (pattern, flags),
        }
    }
}

fn strip_verbose(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '[' if !in_class => {
                in_class = true;
                out.push(c);
                // A `]` right after `[` or `[^` is a member, not the end.
                if chars.clone().next() == Some('^') {
                    out.push('^');
                    chars.next();
                }
                if chars.clone().next() == Some(']') {
                    out.push(']');
                    chars.next();
                }
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            '#' if !in_class => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
            }
            c if c.is_whitespace() && !in_class => {}
            c => out.push(c),
        }
    }
    out
}

impl FastPath {
    /// Whether the pattern contains `$`.
    fn has_line_anchor(self) -> bool {
        matches!(
            self,
            FastPath::AllZeros | FastPath::ExactHalf | FastPath::UsageWord
        )
    }

    pub fn group_count(self) -> usize {
        match self {
            FastPath::StringChunk => 2,
            FastPath::DecimalNumber | FastPath::FormatSpec => 10,
            _ => 0,
        }
    }

    /// `(id, name)` for each named group.
    pub fn group_names(self) -> &'static [(usize, &'static str)] {
        match self {
            FastPath::DecimalNumber => &[
                (1, "sign"),
                (3, "int"),
                (5, "frac"),
                (7, "exp"),
                (9, "signal"),
                (10, "diag"),
            ],
            FastPath::FormatSpec => &[
                (1, "fill"),
                (2, "align"),
                (3, "sign"),
                (4, "no_neg_0"),
                (5, "alt"),
                (6, "zeropad"),
                (7, "minimumwidth"),
                (8, "thousands_sep"),
                (9, "precision"),
                (10, "type"),
            ],
            _ => &[],
        }
    }

    /// Match over `units[start..end]` with the same contract as the VM.
    pub fn run(
        self,
        units: &[char],
        start: usize,
        end: usize,
        anchor: Anchor,
        ascii_fold: bool,
    ) -> Option<Slots> {
        let scan = Scan {
            units,
            end,
            ascii_fold,
        };
        match anchor {
            Anchor::Start => self.match_at(&scan, start, false),
            Anchor::Both => self.match_at(&scan, start, true),
            Anchor::Unanchored => self.search(&scan, start),
        }
    }

    fn match_at(self, s: &Scan<'_>, pos: usize, full: bool) -> Option<Slots> {
        let slots = match self {
            FastPath::WhitespaceRun => {
                let run = s.run(pos, is_space);
                (run > pos).then(|| whole(pos, run))?
            }
            FastPath::AllZeros => {
                let run = s.run(pos, |c| c == '0');
                (run == s.end).then(|| whole(pos, run))?
            }
            FastPath::ExactHalf => {
                if !s.is(pos, '5') {
                    return None;
                }
                let run = s.run(pos + 1, |c| c == '0');
                (run == s.end).then(|| whole(pos, run))?
            }
            FastPath::BlankLines => {
                let run = s.run(pos, |c| c == '\n');
                (run >= pos + 3).then(|| whole(pos, run))?
            }
            FastPath::HexRun(width) => {
                let stop = pos.checked_add(width)?;
                if stop > s.end || !s.units[pos..stop].iter().all(char::is_ascii_hexdigit) {
                    return None;
                }
                whole(pos, stop)
            }
            FastPath::StringChunk => string_chunk(s, pos, full)?,
            FastPath::DecimalNumber => decimal_number(s, pos)?,
            FastPath::FormatSpec => format_spec(s, pos)?,
            FastPath::UsageWord => usage_word(s, pos, full)?,
        };
        // Everything except the lazy matchers is deterministic, so a match
        // that stops short of the end means there is no full match.
        if full && slots[1] != Some(s.end) {
            return None;
        }
        Some(slots)
    }

    fn search(self, s: &Scan<'_>, start: usize) -> Option<Slots> {
        match self {
            FastPath::WhitespaceRun => {
                let first = (start..s.end).find(|&i| is_space(s.units[i]))?;
                self.match_at(s, first, false)
            }
            FastPath::AllZeros | FastPath::ExactHalf => {
                let mut zeros = s.end;
                while zeros > start && s.units[zeros - 1] == '0' {
                    zeros -= 1;
                }
                if self == FastPath::AllZeros {
                    return Some(whole(zeros, s.end));
                }
                let five = zeros.checked_sub(1).filter(|&i| i >= start)?;
                self.match_at(s, five, false)
            }
            FastPath::BlankLines => {
                let mut i = start;
                while i < s.end {
                    let run = s.run(i, |c| c == '\n');
                    if run >= i + 3 {
                        return Some(whole(i, run));
                    }
                    i = run.max(i + 1);
                }
                None
            }
            FastPath::HexRun(width) => {
                let mut run = 0;
                for i in start..s.end {
                    if s.units[i].is_ascii_hexdigit() {
                        run += 1;
                        if run == width {
                            return Some(whole(i + 1 - width, i + 1));
                        }
                    } else {
                        run = 0;
                    }
                }
                // A zero width run matches at the first position.
                (width == 0).then(|| whole(start, start))
            }
            // A terminator anywhere ahead makes the first position match.
            FastPath::StringChunk => self.match_at(s, start, false),
            FastPath::DecimalNumber | FastPath::FormatSpec => {
                (start..=s.end).find_map(|i| self.match_at(s, i, false))
            }
            // Any non-blank starts a word.
            FastPath::UsageWord => {
                let first = (start..s.end).find(|&i| !is_space(s.units[i]))?;
                self.match_at(s, first, false)
            }
        }
    }
}

/// The subject window seen by a fast path.
struct Scan<'a> {
    units: &'a [char],
    end: usize,
    ascii_fold: bool,
}

impl Scan<'_> {
    /// End of the run of units satisfying `pred` starting at `pos`.
    fn run(&self, mut pos: usize, pred: impl Fn(char) -> bool) -> usize {
        while pos < self.end && pred(self.units[pos]) {
            pos += 1;
        }
        pos
    }

    fn is(&self, pos: usize, c: char) -> bool {
        pos < self.end && self.units[pos] == c
    }

    fn is_folded(&self, pos: usize, c: char) -> bool {
        pos < self.end && eq_folded(self.units[pos], c, self.ascii_fold)
    }

    fn is_word_folded(&self, pos: usize, word: &str) -> bool {
        word.chars()
            .enumerate()
            .all(|(i, c)| self.is_folded(pos + i, c))
    }

    fn is_digit(&self, pos: usize) -> bool {
        pos < self.end && self.units[pos].is_ascii_digit()
    }

    fn one_of(&self, pos: usize, set: &str) -> bool {
        pos < self.end && set.contains(self.units[pos])
    }

    fn digits(&self, pos: usize) -> usize {
        self.run(pos, |c| c.is_ascii_digit())
    }
}

/// Same members as `\s`.
fn is_space(c: char) -> bool {
    matches!(c, '\t'..='\r' | ' ')
}

fn whole(start: usize, end: usize) -> Slots {
    vec![Some(start), Some(end)]
}

fn with_groups(n_groups: usize, start: usize) -> Slots {
    let mut slots = vec![None; (n_groups + 1) * 2];
    slots[0] = Some(start);
    slots
}

fn set_group(slots: &mut Slots, id: usize, start: usize, end: usize) {
    slots[id * 2] = Some(start);
    slots[id * 2 + 1] = Some(end);
}

fn is_terminator(c: char) -> bool {
    c == '"' || c == '\\' || c <= '\x1f'
}

fn string_chunk(s: &Scan<'_>, pos: usize, full: bool) -> Option<Slots> {
    let stop = if full {
        // The lazy prefix can stretch up to a terminator in the last position.
        let last = s.end.checked_sub(1).filter(|&i| i >= pos)?;
        is_terminator(s.units[last]).then_some(last)?
    } else {
        (pos..s.end).find(|&i| is_terminator(s.units[i]))?
    };
    let mut slots = with_groups(2, pos);
    slots[1] = Some(stop + 1);
    set_group(&mut slots, 1, pos, stop);
    set_group(&mut slots, 2, stop, stop + 1);
    Some(slots)
}

/// sign? ( digits-with-point exponent? | Inf(inity)? | s?NaN digits ) end
fn decimal_number(s: &Scan<'_>, pos: usize) -> Option<Slots> {
    let mut slots = with_groups(10, pos);
    let mut p = pos;
    if s.one_of(p, "+-") {
        set_group(&mut slots, 1, p, p + 1);
        p += 1;
    }
    let body = p;

    if s.is_digit(p) || (s.is(p, '.') && s.is_digit(p + 1)) {
        let int_end = s.digits(p);
        set_group(&mut slots, 3, p, int_end);
        p = int_end;
        if s.is(p, '.') {
            let frac_end = s.digits(p + 1);
            set_group(&mut slots, 4, p, frac_end);
            set_group(&mut slots, 5, p + 1, frac_end);
            p = frac_end;
        }
        if s.is_folded(p, 'E') {
            let exp_start = p + 1;
            let sign_end = if s.one_of(exp_start, "+-") {
                exp_start + 1
            } else {
                exp_start
            };
            let exp_end = s.digits(sign_end);
            if exp_end > sign_end {
                set_group(&mut slots, 6, p, exp_end);
                set_group(&mut slots, 7, exp_start, exp_end);
                p = exp_end;
            }
        }
    } else if s.is_word_folded(p, "Inf") {
        p += 3;
        if s.is_word_folded(p, "inity") && p + 5 == s.end {
            set_group(&mut slots, 8, p, p + 5);
            p += 5;
        }
    } else {
        if s.is_folded(p, 's') {
            set_group(&mut slots, 9, p, p + 1);
            p += 1;
        }
        if !s.is_word_folded(p, "NaN") {
            return None;
        }
        p += 3;
        let diag_end = s.digits(p);
        set_group(&mut slots, 10, p, diag_end);
        p = diag_end;
    }

    if p != s.end {
        return None;
    }
    set_group(&mut slots, 2, body, p);
    slots[1] = Some(p);
    Some(slots)
}

/// [[fill]align][sign][z][#][0][width][,|_][.precision][type], whole subject.
fn format_spec(s: &Scan<'_>, pos: usize) -> Option<Slots> {
    if pos != 0 {
        return None;
    }
    const ALIGN: &str = "<>=^";
    let mut slots = with_groups(10, pos);
    let mut p = pos;
    if p + 1 < s.end && s.one_of(p + 1, ALIGN) {
        set_group(&mut slots, 1, p, p + 1);
        set_group(&mut slots, 2, p + 1, p + 2);
        p += 2;
    } else if s.one_of(p, ALIGN) {
        set_group(&mut slots, 2, p, p + 1);
        p += 1;
    }
    for (id, set) in [(3, "-+ "), (4, "z"), (5, "#"), (6, "0")] {
        if s.one_of(p, set) {
            set_group(&mut slots, id, p, p + 1);
            p += 1;
        }
    }
    if s.one_of(p, "123456789") {
        let width_end = s.digits(p);
        set_group(&mut slots, 7, p, width_end);
        p = width_end;
    }
    if s.one_of(p, ",_") {
        set_group(&mut slots, 8, p, p + 1);
        p += 1;
    }
    if s.is(p, '.') {
        if s.is(p + 1, '0') {
            set_group(&mut slots, 9, p + 1, p + 2);
            p += 2;
        } else if s.one_of(p + 1, "123456789") {
            let precision_end = s.digits(p + 1);
            set_group(&mut slots, 9, p + 1, precision_end);
            p = precision_end;
        }
    }
    if s.one_of(p, "eEfFgGn%") {
        set_group(&mut slots, 10, p, p + 1);
        p += 1;
    }
    if p != s.end {
        return None;
    }
    slots[1] = Some(p);
    Some(slots)
}

/// A word opening with `(` or `[` may run through blanks up to a closer
/// run that is followed by a blank or the end; otherwise a word is a run
/// of non-blanks.
fn usage_word(s: &Scan<'_>, pos: usize, full: bool) -> Option<Slots> {
    if pos >= s.end || is_space(s.units[pos]) {
        return None;
    }
    let closer = match s.units[pos] {
        '(' => Some(')'),
        '[' => Some(']'),
        _ => None,
    };
    if let Some(closer) = closer {
        let mut j = pos + 1;
        while j < s.end {
            if s.units[j] != closer {
                j += 1;
                continue;
            }
            // `\)+` only backs off onto another closer, never onto a blank.
            let run = s.run(j, |c| c == closer);
            if run == s.end || (!full && is_space(s.units[run])) {
                return Some(whole(pos, run));
            }
            j = run;
        }
    }
    let run = s.run(pos, |c| !is_space(c));
    (!full || run == s.end).then(|| whole(pos, run))
}

#[cfg(test)]
#[path = "fastpath_tests.rs"]
mod tests;
