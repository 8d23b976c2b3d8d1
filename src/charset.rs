/// Explicit character sets used by character classes.

/// A set of chars stored as sorted, non-overlapping, non-adjacent inclusive ranges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CharSet {
    ranges: Vec<(char, char)>,
}

impl CharSet {
    pub fn new() -> Self {
        CharSet { ranges: Vec::new() }
    }

    pub fn from_ranges<I: IntoIterator<Item = (char, char)>>(ranges: I) -> Self {
        let mut set = CharSet::new();
        for (lo, hi) in ranges {
            set.ranges.push((lo.min(hi), lo.max(hi)));
        }
        set.canonicalize();
        set
    }

    pub fn from_chars<I: IntoIterator<Item = char>>(chars: I) -> Self {
        CharSet::from_ranges(chars.into_iter().map(|c| (c, c)))
    }

    /// `\d`: ASCII digits.
    pub fn digit() -> Self {
        CharSet::from_ranges([('0', '9')])
    }

    /// `\w`: ASCII letters, digits and underscore.
    pub fn word() -> Self {
        CharSet::from_ranges([('0', '9'), ('A', 'Z'), ('_', '_'), ('a', 'z')])
    }

    /// `\s`: space, `\t`, `\n`, `\v`, `\f`, `\r`.
    pub fn space() -> Self {
        CharSet::from_ranges([('\t', '\r'), (' ', ' ')])
    }

    pub fn push(&mut self, c: char) {
        self.push_range(c, c);
    }

    pub fn push_range(&mut self, lo: char, hi: char) {
        self.ranges.push((lo.min(hi), lo.max(hi)));
        self.canonicalize();
    }

    pub fn union(&mut self, other: &CharSet) {
        self.ranges.extend_from_slice(&other.ranges);
        self.canonicalize();
    }

    /// Every scalar value not in `self`.
    pub fn complement(&self) -> CharSet {
        let mut out = Vec::with_capacity(self.ranges.len() + 1);
        let mut next = Some(char::MIN);
        for &(lo, hi) in &self.ranges {
            if let Some(start) = next {
                if start < lo {
                    if let Some(end) = pred(lo) {
                        out.push((start, end));
                    }
                }
            }
            next = succ(hi);
        }
        if let Some(start) = next {
            out.push((start, char::MAX));
        }
        CharSet { ranges: out }
    }

    pub fn contains(&self, c: char) -> bool {
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if hi < c {
                    std::cmp::Ordering::Less
                } else if lo > c {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Membership test that also accepts the case variants of `c`.
    pub fn contains_folded(&self, c: char, ascii_only: bool) -> bool {
        if self.contains(c)
            || case_variants(c, ascii_only)
                .into_iter()
                .flatten()
                .any(|v| self.contains(v))
        {
            return true;
        }
        if ascii_only || c.is_ascii() && !c.is_ascii_alphabetic() {
            return false;
        }
        let key = fold(c);
        self.contains(key)
            || FOLD_ALIASES
                .iter()
                .any(|&alias| fold(alias) == key && self.contains(alias))
    }

    pub fn ranges(&self) -> &[(char, char)] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    fn canonicalize(&mut self) {
        self.ranges.sort_unstable();
        let mut merged: Vec<(char, char)> = Vec::with_capacity(self.ranges.len());
        for &(lo, hi) in &self.ranges {
            if let Some(last) = merged.last_mut() {
                let touches = last.1 >= lo || succ(last.1) == Some(lo);
                if touches {
                    last.1 = last.1.max(hi);
                    continue;
                }
            }
            merged.push((lo, hi));
        }
        self.ranges = merged;
    }
}

/// Lowercase and uppercase variants of `c` that differ from it.
pub(crate) fn case_variants(c: char, ascii_only: bool) -> [Option<char>; 2] {
    if ascii_only || c.is_ascii() {
        if !c.is_ascii_alphabetic() {
            return [None, None];
        }
        return [Some(c.to_ascii_lowercase()), Some(c.to_ascii_uppercase())];
    }
    [single(c.to_lowercase()), single(c.to_uppercase())]
}

/// Simple case-insensitive char equality. Symmetric in `a` and `b`.
pub(crate) fn eq_folded(a: char, b: char, ascii_only: bool) -> bool {
    if a == b {
        return true;
    }
    if ascii_only {
        return a.is_ascii() && a.eq_ignore_ascii_case(&b);
    }
    fold(a) == fold(b)
}

/// Simple case fold: the lowercase of the uppercase, when both are single
/// chars. Chars like `ſ` and `K` (Kelvin) fold onto their ASCII letters.
fn fold(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }
    single(c.to_uppercase())
        .and_then(|upper| single(upper.to_lowercase()))
        .or_else(|| single(c.to_lowercase()))
        .unwrap_or(c)
}

/// Chars whose fold is shared with a more common letter but which are not
/// a case variant of it. Classes check these so that membership folds both
/// ways.
const FOLD_ALIASES: &[char] = &[
    '\u{00B5}', '\u{0131}', '\u{017F}', '\u{0345}', '\u{03C2}', '\u{03D0}', '\u{03D1}',
    '\u{03D5}', '\u{03D6}', '\u{03F0}', '\u{03F1}', '\u{03F4}', '\u{03F5}', '\u{1C80}',
    '\u{1C81}', '\u{1C82}', '\u{1C83}', '\u{1C84}', '\u{1C85}', '\u{1C86}', '\u{1C87}',
    '\u{1C88}', '\u{1E9B}', '\u{1E9E}', '\u{1FBE}', '\u{2126}', '\u{212A}', '\u{212B}',
];

fn single(mut it: impl Iterator<Item = char>) -> Option<char> {
    let first = it.next()?;
    match it.next() {
        Some(_) => None,
        None => Some(first),
    }
}

fn succ(c: char) -> Option<char> {
    match c {
        '\u{D7FF}' => Some('\u{E000}'),
        _ => char::from_u32(c as u32 + 1),
    }
}

fn pred(c: char) -> Option<char> {
    match c {
        '\u{E000}' => Some('\u{D7FF}'),
        _ => (c as u32).checked_sub(1).and_then(char::from_u32),
    }
}
