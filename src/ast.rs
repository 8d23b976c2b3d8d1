/// AST types for the regex engine.
use crate::charset::CharSet;

/// A single node in the regex AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Matches a single literal character.
    Literal(char),
    /// Matches any character, newline included.
    AnyChar,
    /// Character class like `[abc]`, `[a-z]`, `[^abc]`, `\d`.
    CharClass { set: CharSet, negated: bool },
    /// `^` or `\A`: position 0 of the subject.
    AnchorStart,
    /// `$` or `\Z`: end of the subject window.
    AnchorEnd,
    /// Capturing group `(...)` with its 1-based id.
    Group { id: usize, body: Vec<Node> },
    /// Non-capturing group `(?:...)`.
    NonCapturingGroup(Vec<Node>),
    /// Alternation (`a|b`), branches in source order.
    Alternation(Vec<Vec<Node>>),
    /// Quantifier applied to a sub-expression. `max == None` is unbounded.
    Repeat {
        min: usize,
        max: Option<usize>,
        body: Box<Node>,
        greedy: bool,
    },
}

impl Node {
    pub fn class(set: CharSet) -> Node {
        Node::CharClass {
            set,
            negated: false,
        }
    }

    pub fn negated_class(set: CharSet) -> Node {
        Node::CharClass { set, negated: true }
    }

    pub fn repeat(body: Node, min: usize, max: Option<usize>) -> Node {
        Node::Repeat {
            min,
            max,
            body: Box::new(body),
            greedy: true,
        }
    }

    pub fn lazy_repeat(body: Node, min: usize, max: Option<usize>) -> Node {
        Node::Repeat {
            min,
            max,
            body: Box::new(body),
            greedy: false,
        }
    }

    pub fn optional(body: Node) -> Node {
        Node::repeat(body, 0, Some(1))
    }

    pub fn group(id: usize, body: Vec<Node>) -> Node {
        Node::Group { id, body }
    }

    /// Literal nodes for every char of `text`.
    pub fn literals(text: &str) -> Vec<Node> {
        text.chars().map(Node::Literal).collect()
    }
}

/// Shorthand character class kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShorthandKind {
    /// `\d`: digits.
    Digit,
    /// `\D`: non-digits.
    NonDigit,
    /// `\w`: word characters.
    Word,
    /// `\W`: non-word characters.
    NonWord,
    /// `\s`: whitespace.
    Space,
    /// `\S`: non-whitespace.
    NonSpace,
}

impl ShorthandKind {
    pub fn from_escape(c: char) -> Option<ShorthandKind> {
        let kind = match c {
            'd' => ShorthandKind::Digit,
            'D' => ShorthandKind::NonDigit,
            'w' => ShorthandKind::Word,
            'W' => ShorthandKind::NonWord,
            's' => ShorthandKind::Space,
            'S' => ShorthandKind::NonSpace,
            _ => return None,
        };
        Some(kind)
    }

    /// The explicit set this shorthand stands for.
    pub fn expand(self) -> CharSet {
        match self {
            ShorthandKind::Digit => CharSet::digit(),
            ShorthandKind::NonDigit => CharSet::digit().complement(),
            ShorthandKind::Word => CharSet::word(),
            ShorthandKind::NonWord => CharSet::word().complement(),
            ShorthandKind::Space => CharSet::space(),
            ShorthandKind::NonSpace => CharSet::space().complement(),
        }
    }
}

/// Output of the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    pub nodes: Vec<Node>,
    pub group_count: usize,
    /// Name per group id; index 0 is the whole match and always `None`.
    pub group_names: Vec<Option<String>>,
}

impl Ast {
    /// An AST with unnamed groups.
    pub fn new(nodes: Vec<Node>, group_count: usize) -> Ast {
        Ast {
            nodes,
            group_count,
            group_names: vec![None; group_count + 1],
        }
    }

    pub fn with_names(mut self, names: &[(usize, &str)]) -> Ast {
        for &(id, name) in names {
            if let Some(slot) = self.group_names.get_mut(id) {
                *slot = Some(name.to_string());
            }
        }
        self
    }
}
