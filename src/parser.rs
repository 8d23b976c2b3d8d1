/// Regex parser: converts a pattern string into an AST.
use crate::ast::*;
use crate::charset::CharSet;
use crate::error::{Error, Feature, Result, SyntaxErrorKind};
use crate::flags::Flags;

/// Parse `pattern` under `flags`.
///
/// Returns the AST together with the effective flags, which include any
/// leading `(?flags)` groups found in the pattern.
pub fn parse(pattern: &str, flags: Flags) -> Result<(Ast, Flags)> {
    let mut parser = Parser::new(pattern, flags);
    let nodes = parser.parse()?;
    Ok((
        Ast {
            nodes,
            group_count: parser.group_count,
            group_names: parser.group_names,
        },
        parser.flags,
    ))
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    group_count: usize,
    group_names: Vec<Option<String>>,
    flags: Flags,
    saw_line_anchor: bool,
}

/// One element of a character class.
enum ClassAtom {
    Char(char),
    Set(CharSet),
}

impl Parser {
    fn new(pattern: &str, flags: Flags) -> Self {
        Parser {
            chars: pattern.chars().collect(),
            pos: 0,
            group_count: 0,
            group_names: vec![None],
            flags,
            saw_line_anchor: false,
        }
    }

    /// Parse the full pattern and return its top-level sequence.
    fn parse(&mut self) -> Result<Vec<Node>> {
        self.parse_leading_flags()?;
        let nodes = self.parse_alternation()?;
        if self.pos < self.chars.len() {
            // Only a stray ')' stops the top-level alternation early.
            return Err(Error::syntax(SyntaxErrorKind::UnbalancedGroup, self.pos));
        }
        if self.saw_line_anchor && self.flags.contains(Flags::MULTILINE) {
            return Err(Error::Unsupported(Feature::MultilineAnchors));
        }
        Ok(nodes)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn verbose(&self) -> bool {
        self.flags.contains(Flags::VERBOSE)
    }

    /// Skip whitespace and `#` comments in verbose mode.
    fn skip_trivia(&mut self) {
        if !self.verbose() {
            return;
        }
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' {
                while let Some(c) = self.advance() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Consume `(?imsx)` groups at the start of the pattern.
    fn parse_leading_flags(&mut self) -> Result<()> {
        loop {
            self.skip_trivia();
            if self.peek() != Some('(') || self.peek_at(1) != Some('?') {
                return Ok(());
            }
            let mut end = self.pos + 2;
            while self.chars.get(end).is_some_and(|c| c.is_ascii_alphabetic()) {
                end += 1;
            }
            if end == self.pos + 2 || self.chars.get(end) != Some(&')') {
                // Not a global flag group: `(?:`, `(?P<`, `(?i:` and friends.
                return Ok(());
            }
            let letters: String = self.chars[self.pos + 2..end].iter().collect();
            let parsed = Flags::from_letters(&letters)
                .ok_or_else(|| Error::syntax(SyntaxErrorKind::BadInlineFlags, self.pos))?;
            self.flags |= parsed;
            self.pos = end + 1;
        }
    }

    /// Parse alternation: `a|b|c`
    fn parse_alternation(&mut self) -> Result<Vec<Node>> {
        let mut branches = vec![self.parse_sequence()?];
        while self.peek() == Some('|') {
            self.advance(); // consume '|'
            branches.push(self.parse_sequence()?);
        }
        match branches.len() {
            1 => Ok(branches.pop().unwrap_or_default()),
            _ => Ok(vec![Node::Alternation(branches)]),
        }
    }

    /// Parse concatenation: `abc`
    fn parse_sequence(&mut self) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None | Some(')') | Some('|') => break,
                Some(_) => {
                    if let Some(node) = self.parse_quantified()? {
                        nodes.push(node);
                    }
                }
            }
        }
        Ok(nodes)
    }

    /// Parse an atom possibly followed by a quantifier.
    fn parse_quantified(&mut self) -> Result<Option<Node>> {
        let Some(node) = self.parse_atom()? else {
            return Ok(None);
        };
        self.skip_trivia();
        let quant_pos = self.pos;
        let Some((min, max)) = self.parse_quantifier()? else {
            return Ok(Some(node));
        };
        if matches!(node, Node::AnchorStart | Node::AnchorEnd) {
            return Err(Error::syntax(SyntaxErrorKind::BadQuantifier, quant_pos));
        }
        let greedy = if self.peek() == Some('?') {
            self.advance();
            false
        } else {
            if self.peek() == Some('+') {
                return Err(Error::Unsupported(Feature::PossessiveQuantifier));
            }
            true
        };
        self.skip_trivia();
        if self.at_quantifier() {
            // `a**`, `a{2}{3}`: multiple repeat.
            return Err(Error::syntax(SyntaxErrorKind::BadQuantifier, self.pos));
        }
        Ok(Some(Node::Repeat {
            min,
            max,
            body: Box::new(node),
            greedy,
        }))
    }

    fn at_quantifier(&self) -> bool {
        match self.peek() {
            Some('*' | '+' | '?') => true,
            Some('{') => self.scan_brace().is_some(),
            _ => false,
        }
    }

    /// Parse `?`, `*`, `+` or a brace quantifier into `(min, max)`.
    fn parse_quantifier(&mut self) -> Result<Option<(usize, Option<usize>)>> {
        let bounds = match self.peek() {
            Some('*') => (0, None),
            Some('+') => (1, None),
            Some('?') => (0, Some(1)),
            Some('{') => return self.parse_brace_quantifier(),
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(bounds))
    }

    /// Parse `{n}`, `{n,}`, `{,m}`, `{n,m}`. A brace that does not form a
    /// quantifier is left in place to be read as a literal.
    fn parse_brace_quantifier(&mut self) -> Result<Option<(usize, Option<usize>)>> {
        let start = self.pos;
        let Some((min_text, max_text, end)) = self.scan_brace() else {
            return Ok(None);
        };
        let bad = || Error::syntax(SyntaxErrorKind::BadQuantifier, start);
        let min = match &min_text {
            Some(text) => text.parse::<usize>().map_err(|_| bad())?,
            None => 0,
        };
        let max = match max_text {
            Bound::Exact => Some(min),
            Bound::Unbounded => None,
            Bound::Upto(text) => Some(text.parse::<usize>().map_err(|_| bad())?),
        };
        if max.is_some_and(|max| max < min) {
            return Err(bad());
        }
        self.pos = end;
        Ok(Some((min, max)))
    }

    /// Look ahead for a brace quantifier at the current position without
    /// consuming it. Returns the digit runs and the position after `}`.
    fn scan_brace(&self) -> Option<(Option<String>, Bound, usize)> {
        let mut i = self.pos;
        if self.chars.get(i) != Some(&'{') {
            return None;
        }
        i += 1;
        let digits = |mut i: usize| {
            let from = i;
            while self.chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
            let text: String = self.chars[from..i].iter().collect();
            (text, i)
        };
        let (min_text, after_min) = digits(i);
        i = after_min;
        let max = if self.chars.get(i) == Some(&',') {
            let (max_text, after_max) = digits(i + 1);
            i = after_max;
            if max_text.is_empty() {
                Bound::Unbounded
            } else {
                Bound::Upto(max_text)
            }
        } else {
            Bound::Exact
        };
        if self.chars.get(i) != Some(&'}') {
            return None;
        }
        let min_text = (!min_text.is_empty()).then_some(min_text);
        match (&min_text, &max) {
            (None, Bound::Exact | Bound::Unbounded) => None,
            _ => Some((min_text, max, i + 1)),
        }
    }

    /// Parse a single atom (literal, class, group, anchor, etc.)
    fn parse_atom(&mut self) -> Result<Option<Node>> {
        let start = self.pos;
        let node = match self.peek() {
            None => return Err(Error::syntax(SyntaxErrorKind::UnbalancedGroup, start)),
            Some('(') => return self.parse_group(),
            Some('[') => self.parse_char_class()?,
            Some('\\') => self.parse_escape()?,
            Some('*' | '+' | '?') => {
                return Err(Error::syntax(SyntaxErrorKind::BadQuantifier, start));
            }
            Some('{') if self.scan_brace().is_some() => {
                return Err(Error::syntax(SyntaxErrorKind::BadQuantifier, start));
            }
            Some('.') => {
                self.advance();
                Node::AnyChar
            }
            Some('^') => {
                self.advance();
                self.saw_line_anchor = true;
                Node::AnchorStart
            }
            Some('$') => {
                self.advance();
                self.saw_line_anchor = true;
                Node::AnchorEnd
            }
            Some(ch) => {
                self.advance();
                Node::Literal(ch)
            }
        };
        Ok(Some(node))
    }

    /// Parse an escape sequence outside a class.
    fn parse_escape(&mut self) -> Result<Node> {
        let start = self.pos;
        self.advance(); // consume '\\'
        let Some(ch) = self.advance() else {
            return Err(Error::syntax(SyntaxErrorKind::DanglingEscape, start));
        };
        if let Some(kind) = ShorthandKind::from_escape(ch) {
            return Ok(Node::class(kind.expand()));
        }
        match ch {
            'A' => Ok(Node::AnchorStart),
            'Z' => Ok(Node::AnchorEnd),
            'b' | 'B' => Err(Error::Unsupported(Feature::WordBoundary)),
            'p' | 'P' => Err(Error::Unsupported(Feature::UnicodeProperty)),
            '1'..='9' => Err(Error::Unsupported(Feature::Backreference)),
            _ => match self.parse_char_escape(ch, start)? {
                Some(c) => Ok(Node::Literal(c)),
                None if ch.is_ascii_alphanumeric() => {
                    Err(Error::syntax(SyntaxErrorKind::BadEscape, start))
                }
                // Escaped literal: \., \*, \\, etc.
                None => Ok(Node::Literal(ch)),
            },
        }
    }

    /// Escapes shared by classes and the top level. `None` means `ch` is not
    /// one of them.
    fn parse_char_escape(&mut self, ch: char, start: usize) -> Result<Option<char>> {
        let c = match ch {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'f' => '\x0c',
            'v' => '\x0b',
            'a' => '\x07',
            '0' => {
                let mut value = 0u32;
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            self.advance();
                        }
                        None => break,
                    }
                }
                char::from_u32(value).unwrap_or('\0')
            }
            'x' => self.parse_hex(2, start)?,
            'u' => self.parse_hex(4, start)?,
            'U' => self.parse_hex(8, start)?,
            _ => return Ok(None),
        };
        Ok(Some(c))
    }

    fn parse_hex(&mut self, width: usize, start: usize) -> Result<char> {
        let mut value = 0u32;
        for _ in 0..width {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| Error::syntax(SyntaxErrorKind::BadEscape, start))?;
            value = value.checked_mul(16).unwrap_or(u32::MAX).saturating_add(digit);
            self.advance();
        }
        char::from_u32(value).ok_or_else(|| Error::syntax(SyntaxErrorKind::BadEscape, start))
    }

    /// Parse a group: `(...)`, `(?:...)`, `(?P<name>...)`, `(?#...)`.
    /// Lookaround and the other extensions are recognized and rejected.
    fn parse_group(&mut self) -> Result<Option<Node>> {
        let open = self.pos;
        self.advance(); // consume '('

        if self.peek() != Some('?') {
            // Capturing group
            let id = self.open_group(None);
            let body = self.parse_group_body(open)?;
            return Ok(Some(Node::Group { id, body }));
        }
        self.advance(); // consume '?'
        match self.peek() {
            Some(':') => {
                self.advance();
                let body = self.parse_group_body(open)?;
                Ok(Some(Node::NonCapturingGroup(body)))
            }
            Some('P') => {
                self.advance();
                match self.advance() {
                    Some('<') => self.parse_named_group(open),
                    Some('=') => Err(Error::Unsupported(Feature::Backreference)),
                    _ => Err(Error::syntax(SyntaxErrorKind::BadGroupName, open)),
                }
            }
            Some('<') => {
                self.advance();
                match self.peek() {
                    Some('=' | '!') => Err(Error::Unsupported(Feature::Lookbehind)),
                    _ => self.parse_named_group(open),
                }
            }
            Some('=' | '!') => Err(Error::Unsupported(Feature::Lookahead)),
            Some('>') => Err(Error::Unsupported(Feature::AtomicGroup)),
            Some('(') => Err(Error::Unsupported(Feature::ConditionalGroup)),
            Some('#') => {
                while let Some(c) = self.advance() {
                    if c == ')' {
                        return Ok(None);
                    }
                }
                Err(Error::syntax(SyntaxErrorKind::UnbalancedGroup, open))
            }
            _ => self.parse_inline_flags(open),
        }
    }

    /// `(?i)` after the start of the pattern, or scoped `(?i:...)`.
    fn parse_inline_flags(&mut self, open: usize) -> Result<Option<Node>> {
        let bad = || Error::syntax(SyntaxErrorKind::BadInlineFlags, open);
        let mut letters = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() || c == '-' {
                letters.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if letters.is_empty() || Flags::from_letters(&letters.replace('-', "")).is_none() {
            return Err(bad());
        }
        match self.peek() {
            Some(':') => Err(Error::Unsupported(Feature::ScopedFlags)),
            // Global flags are only accepted at the start of the pattern.
            _ => Err(bad()),
        }
    }

    fn parse_named_group(&mut self, open: usize) -> Result<Option<Node>> {
        let mut name = String::new();
        loop {
            match self.advance() {
                Some('>') => break,
                Some(c) => name.push(c),
                None => return Err(Error::syntax(SyntaxErrorKind::BadGroupName, open)),
            }
        }
        let valid = name
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_alphanumeric() || c == '_');
        let duplicate = self.group_names.iter().flatten().any(|n| *n == name);
        if !valid || duplicate {
            return Err(Error::syntax(SyntaxErrorKind::BadGroupName, open));
        }
        let id = self.open_group(Some(name));
        let body = self.parse_group_body(open)?;
        Ok(Some(Node::Group { id, body }))
    }

    fn open_group(&mut self, name: Option<String>) -> usize {
        self.group_count += 1;
        self.group_names.push(name);
        self.group_count
    }

    fn parse_group_body(&mut self, open: usize) -> Result<Vec<Node>> {
        let body = self.parse_alternation()?;
        match self.advance() {
            Some(')') => Ok(body),
            _ => Err(Error::syntax(SyntaxErrorKind::UnbalancedGroup, open)),
        }
    }

    /// Parse a character class: `[abc]`, `[a-z]`, `[^abc]`.
    fn parse_char_class(&mut self) -> Result<Node> {
        let open = self.pos;
        self.advance(); // consume '['
        let negated = if self.peek() == Some('^') {
            self.advance();
            true
        } else {
            false
        };

        let mut set = CharSet::new();
        // Allow ']' as first character in class
        if self.peek() == Some(']') {
            self.advance();
            set.push(']');
        }

        loop {
            match self.peek() {
                None => return Err(Error::syntax(SyntaxErrorKind::UnbalancedClass, open)),
                Some(']') => break,
                Some(_) => {}
            }
            let item_pos = self.pos;
            match self.parse_class_atom(open)? {
                ClassAtom::Set(s) => set.union(&s),
                ClassAtom::Char(lo) => {
                    // Check for range like a-z
                    let is_range = self.peek() == Some('-')
                        && self.peek_at(1).is_some_and(|c| c != ']');
                    if !is_range {
                        set.push(lo);
                        continue;
                    }
                    self.advance(); // consume '-'
                    match self.parse_class_atom(open)? {
                        ClassAtom::Char(hi) if lo <= hi => set.push_range(lo, hi),
                        _ => return Err(Error::syntax(SyntaxErrorKind::BadCharRange, item_pos)),
                    }
                }
            }
        }
        self.advance(); // consume ']'
        Ok(Node::CharClass { set, negated })
    }

    fn parse_class_atom(&mut self, open: usize) -> Result<ClassAtom> {
        let start = self.pos;
        match self.advance() {
            None => Err(Error::syntax(SyntaxErrorKind::UnbalancedClass, open)),
            Some('\\') => {
                let Some(ch) = self.advance() else {
                    return Err(Error::syntax(SyntaxErrorKind::DanglingEscape, start));
                };
                if let Some(kind) = ShorthandKind::from_escape(ch) {
                    return Ok(ClassAtom::Set(kind.expand()));
                }
                match ch {
                    'b' => Ok(ClassAtom::Char('\x08')),
                    'p' | 'P' => Err(Error::Unsupported(Feature::UnicodeProperty)),
                    _ => match self.parse_char_escape(ch, start)? {
                        Some(c) => Ok(ClassAtom::Char(c)),
                        None if ch.is_ascii_alphanumeric() => {
                            Err(Error::syntax(SyntaxErrorKind::BadEscape, start))
                        }
                        None => Ok(ClassAtom::Char(ch)),
                    },
                }
            }
            Some(ch) => Ok(ClassAtom::Char(ch)),
        }
    }
}

/// Upper part of a brace quantifier.
enum Bound {
    /// `{n}`
    Exact,
    /// `{n,}`
    Unbounded,
    /// `{n,m}` or `{,m}`
    Upto(String),
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
