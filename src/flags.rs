use bitflags::bitflags;

bitflags! {
    /// Compile flags. Values mirror CPython's `re` module.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u32 {
        const IGNORECASE = 2;
        const LOCALE = 4;
        const MULTILINE = 8;
        const DOTALL = 16;
        const UNICODE = 32;
        const VERBOSE = 64;
        const ASCII = 256;
    }
}

impl Flags {
    /// Flag for an inline `(?...)` letter.
    pub fn from_letter(letter: char) -> Option<Flags> {
        let flag = match letter {
            'i' => Flags::IGNORECASE,
            'L' => Flags::LOCALE,
            'm' => Flags::MULTILINE,
            's' => Flags::DOTALL,
            'u' => Flags::UNICODE,
            'x' => Flags::VERBOSE,
            'a' => Flags::ASCII,
            _ => return None,
        };
        Some(flag)
    }

    /// Parse a string of inline flag letters such as `"ix"`.
    pub fn from_letters(letters: &str) -> Option<Flags> {
        letters
            .chars()
            .try_fold(Flags::empty(), |acc, c| Some(acc | Flags::from_letter(c)?))
    }

    /// Case folding is limited to ASCII.
    pub(crate) fn ascii_folding(self) -> bool {
        self.intersects(Flags::ASCII | Flags::LOCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_combine() {
        assert_eq!(
            Flags::from_letters("ix"),
            Some(Flags::IGNORECASE | Flags::VERBOSE)
        );
        assert_eq!(Flags::from_letters(""), Some(Flags::empty()));
        assert_eq!(Flags::from_letters("iq"), None);
    }

    #[test]
    fn values_match_cpython() {
        assert_eq!(Flags::IGNORECASE.bits(), 2);
        assert_eq!(Flags::VERBOSE.bits(), 64);
        assert_eq!(Flags::ASCII.bits(), 256);
    }
}
