/// Text types the engine can search: `str` and `[u8]`.
use std::fmt;
use std::ops::Range;

/// Whether a pattern or subject is text or bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    Str,
    Bytes,
}

impl fmt::Display for TextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextKind::Str => f.write_str("str"),
            TextKind::Bytes => f.write_str("bytes"),
        }
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for str {}
    impl Sealed for [u8] {}
}

/// A subject the engine can match against.
///
/// Positions reported by matches count units of the haystack: chars for
/// `str`, bytes for `[u8]`.
pub trait Haystack: private::Sealed + AsRef<Self> + 'static {
    const KIND: TextKind;

    /// Owned form produced by substitution.
    type Owned: Default;

    fn as_bytes(&self) -> &[u8];

    /// Slice by byte range. The range always lies on unit boundaries.
    fn slice(&self, bytes: Range<usize>) -> &Self;

    fn empty() -> &'static Self;

    fn push_onto(&self, out: &mut Self::Owned);

    /// The haystack read as pattern text. Bytes map one-to-one onto
    /// `U+0000..=U+00FF`.
    fn to_pattern_text(&self) -> String;

    #[doc(hidden)]
    fn decode(&self) -> Decoded<'_>;
}

impl Haystack for str {
    const KIND: TextKind = TextKind::Str;
    type Owned = String;

    fn as_bytes(&self) -> &[u8] {
        str::as_bytes(self)
    }

    fn slice(&self, bytes: Range<usize>) -> &str {
        &self[bytes]
    }

    fn empty() -> &'static str {
        ""
    }

    fn push_onto(&self, out: &mut String) {
        out.push_str(self);
    }

    fn to_pattern_text(&self) -> String {
        self.to_string()
    }

    fn decode(&self) -> Decoded<'_> {
        let mut units = Vec::with_capacity(self.len());
        let mut offsets = Vec::with_capacity(self.len() + 1);
        for (i, c) in self.char_indices() {
            units.push(c);
            offsets.push(i);
        }
        offsets.push(self.len());
        Decoded {
            units,
            offsets: Some(offsets),
            bytes: str::as_bytes(self),
        }
    }
}

impl Haystack for [u8] {
    const KIND: TextKind = TextKind::Bytes;
    type Owned = Vec<u8>;

    fn as_bytes(&self) -> &[u8] {
        self
    }

    fn slice(&self, bytes: Range<usize>) -> &[u8] {
        &self[bytes]
    }

    fn empty() -> &'static [u8] {
        &[]
    }

    fn push_onto(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }

    fn to_pattern_text(&self) -> String {
        self.iter().copied().map(char::from).collect()
    }

    fn decode(&self) -> Decoded<'_> {
        Decoded {
            units: self.iter().copied().map(char::from).collect(),
            offsets: None,
            bytes: self,
        }
    }
}

/// A haystack split into units for the matcher.
#[doc(hidden)]
pub struct Decoded<'h> {
    pub(crate) units: Vec<char>,
    /// Byte offset of every unit plus the total length; `None` when units are bytes.
    offsets: Option<Vec<usize>>,
    bytes: &'h [u8],
}

impl Decoded<'_> {
    pub(crate) fn len(&self) -> usize {
        self.units.len()
    }

    pub(crate) fn byte_offset(&self, unit: usize) -> usize {
        match &self.offsets {
            Some(offsets) => offsets[unit],
            None => unit,
        }
    }

    fn unit_at_byte(&self, byte: usize) -> usize {
        match &self.offsets {
            Some(offsets) => offsets.partition_point(|&b| b < byte),
            None => byte,
        }
    }

    /// Next unit equal to `c` in `from..to`, found with `memchr` when `c`
    /// is a single byte in this encoding. `None` means "cannot tell".
    pub(crate) fn find_unit(&self, c: char, from: usize, to: usize) -> Option<Option<usize>> {
        let byte = match self.offsets {
            Some(_) if c.is_ascii() => c as u8,
            None if (c as u32) <= 0xFF => c as u32 as u8,
            _ => return None,
        };
        let start = self.byte_offset(from);
        let end = self.byte_offset(to);
        let found = memchr::memchr(byte, &self.bytes[start..end]);
        Some(found.map(|i| self.unit_at_byte(start + i)))
    }
}
