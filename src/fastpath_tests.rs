#![allow(clippy::unwrap_used, clippy::expect_used)]

use yare::parameterized;

use super::*;
use crate::ast::{Ast, Node};
use crate::charset::CharSet;
use crate::compiler::{CaseMode, Program, compile};
use crate::haystack::Haystack;
use crate::parser::parse;
use crate::vm;

fn parsed(pattern: &str) -> Ast {
    parse(pattern, Flags::empty()).unwrap().0
}

fn general(ast: &Ast, case: CaseMode) -> Program {
    compile(ast, case, 1 << 16).unwrap()
}

/// Compare the fast path with the general engine on every start offset,
/// for each anchoring, over the full subject and over a window ending
/// one unit early.
fn assert_equivalent<H: Haystack + ?Sized>(fast: FastPath, program: &Program, corpus: &[&H]) {
    for text in corpus {
        let decoded = text.decode();
        let len = decoded.len();
        let mut windows = vec![len];
        if len > 0 {
            windows.push(len - 1);
        }
        for end in windows {
            for start in 0..=end {
                for anchor in [Anchor::Start, Anchor::Both, Anchor::Unanchored] {
                    let expected = vm::run(program, &decoded, start, end, anchor, 1 << 24).unwrap();
                    let actual = fast.run(&decoded.units, start, end, anchor, false);
                    assert_eq!(
                        actual,
                        expected,
                        "{fast:?} {anchor:?} window {start}..{end} on {:?}",
                        text.to_pattern_text()
                    );
                }
            }
        }
    }
}

fn signs() -> Node {
    Node::class(CharSet::from_chars(['-', '+']))
}

fn digits(min: usize) -> Node {
    Node::repeat(Node::class(CharSet::digit()), min, None)
}

/// The decimal grammar with its lookahead spelled out as two branches
/// sharing group ids: digits first, or a point followed by a digit.
fn decimal_ast() -> Ast {
    let exponent = || {
        Node::optional(Node::group(
            6,
            vec![
                Node::Literal('E'),
                Node::group(7, vec![Node::optional(signs()), digits(1)]),
            ],
        ))
    };
    let leading_digits = vec![
        Node::group(3, vec![digits(1)]),
        Node::optional(Node::group(
            4,
            vec![Node::Literal('.'), Node::group(5, vec![digits(0)])],
        )),
        exponent(),
    ];
    let leading_point = vec![
        Node::group(3, vec![]),
        Node::group(4, vec![Node::Literal('.'), Node::group(5, vec![digits(1)])]),
        exponent(),
    ];
    let mut infinity = Node::literals("Inf");
    infinity.push(Node::optional(Node::group(8, Node::literals("inity"))));
    let mut nan = vec![Node::optional(Node::group(9, vec![Node::Literal('s')]))];
    nan.extend(Node::literals("NaN"));
    nan.push(Node::group(10, vec![digits(0)]));

    Ast::new(
        vec![
            Node::optional(Node::group(1, vec![signs()])),
            Node::group(
                2,
                vec![Node::Alternation(vec![
                    leading_digits,
                    leading_point,
                    infinity,
                    nan,
                ])],
            ),
            Node::AnchorEnd,
        ],
        10,
    )
    .with_names(FastPath::DecimalNumber.group_names())
}

/// The format-spec grammar with `(?!0)\d+` written as `[1-9]\d*`.
const FORMAT_SPEC_EQUIVALENT: &str = concat!(
    r"\A(?:(?P<fill>.)?(?P<align>[<>=^]))?",
    r"(?P<sign>[-+ ])?",
    r"(?P<no_neg_0>z)?",
    r"(?P<alt>\#)?",
    r"(?P<zeropad>0)?",
    r"(?P<minimumwidth>[1-9]\d*)?",
    r"(?P<thousands_sep>[,_])?",
    r"(?:\.(?P<precision>0|[1-9]\d*))?",
    r"(?P<type>[eEfFgGn%])?",
    r"\Z",
);

#[parameterized(
    whitespace = { FastPath::WhitespaceRun, r"\s+", &["", "a", " ", "a \t\nb", "  x  ", "\u{a0}x \u{b}"] },
    zeros = { FastPath::AllZeros, "0*$", &["", "0", "000", "100", "1000x", "0a0", "x00"] },
    half = { FastPath::ExactHalf, "50*$", &["", "5", "50", "500", "5500", "505", "x50", "0"] },
    blank_lines = { FastPath::BlankLines, r"\n\n\n+", &["\n\n", "\n\n\n", "a\n\n\n\nb", "\n\na\n\n\n", ""] },
    hex = { FastPath::HexRun(4), "[0-9a-fA-F]{4}", &["beef", "bee", "xbeef1", "BEEFCAFE", "12g45678", ""] },
    string_chunk = {
        FastPath::StringChunk,
        r#"(.*?)(["\\\x00-\x1f])"#,
        &["abc\"", "abc", "a\\b\"c", "\u{1}", "\"\"", "\"x", "", "é\"ü\n"]
    },
)]
fn str_fast_paths_match_general_engine(fast: FastPath, pattern: &str, corpus: &[&str]) {
    assert_eq!(fast.group_count(), parsed(pattern).group_count);
    assert_equivalent(fast, &general(&parsed(pattern), CaseMode::Sensitive), corpus);
}

#[test]
fn decimal_matches_general_engine() {
    let corpus = [
        "1", "-1.5e+10", ".5", "5.", "+.e1", "1e", "1E-", "Inf", "-infinity", "INFINITYx", "NaN",
        "snan123", "s", "sNaNx", "", "-", "1_000", "0.000001E-7", " 1", "12.34.5", "+Infinit",
    ];
    let program = general(&decimal_ast(), CaseMode::Insensitive);
    assert_equivalent(FastPath::DecimalNumber, &program, &corpus);
}

#[test]
fn format_spec_matches_general_engine() {
    let corpus = [
        "", ">10", "*^30,.2f", "x<", "<", "+#010,.3e", "0=+8", ".0%", ".05f", "00", "z", " 5",
        "_", ",.1", "10.", "q", "<<", "\n>z#0_.12G", "=<5",
    ];
    let ast = parsed(FORMAT_SPEC_EQUIVALENT);
    assert_eq!(ast.group_count, FastPath::FormatSpec.group_count());
    assert_equivalent(
        FastPath::FormatSpec,
        &general(&ast, CaseMode::Sensitive),
        &corpus,
    );
}

#[test]
fn bytes_fast_paths_match_general_engine() {
    let whitespace: [&[u8]; 4] = [b"", b" \xa0 ", b"a\r\n", b"\x85\x0c"];
    assert_equivalent(
        FastPath::WhitespaceRun,
        &general(&parsed(r"\s+"), CaseMode::Sensitive),
        &whitespace,
    );
    let hex: [&[u8]; 4] = [b"ff", b"\xff0a", b"g", b"0a1"];
    assert_equivalent(
        FastPath::HexRun(2),
        &general(&parsed("[0-9a-fA-F]{2}"), CaseMode::Sensitive),
        &hex,
    );
}

#[test]
fn group_names_follow_the_grammar() {
    let format = parsed(FORMAT_SPEC_EQUIVALENT);
    for &(id, name) in FastPath::FormatSpec.group_names() {
        assert_eq!(format.group_names[id].as_deref(), Some(name));
    }
    assert_eq!(FastPath::DecimalNumber.group_names().len(), 6);
    assert!(FastPath::WhitespaceRun.group_names().is_empty());
}

fn lookup_str(pattern: &str, flags: Flags) -> Option<FastPath> {
    lookup(&fingerprint(pattern, flags, TextKind::Str))
}

#[test]
fn lookup_by_exact_text() {
    assert_eq!(lookup_str(r"\s+", Flags::empty()), Some(FastPath::WhitespaceRun));
    assert_eq!(lookup_str(r"\s*", Flags::empty()), None);
    assert_eq!(lookup_str(r"\s+", Flags::IGNORECASE), None);
    assert_eq!(
        lookup_str("[0-9a-fA-F]{4}", Flags::empty()),
        Some(FastPath::HexRun(4))
    );
    assert_eq!(lookup_str("[0-9a-fA-F]{2}", Flags::empty()), None);
    assert_eq!(
        lookup(&fingerprint("[0-9a-fA-F]{2}", Flags::empty(), TextKind::Bytes)),
        Some(FastPath::HexRun(2))
    );
}

#[test]
fn lookup_normalizes_inline_and_verbose_forms() {
    assert_eq!(
        lookup_str("(?x) \\s +   # a run of blanks\n", Flags::empty()),
        Some(FastPath::WhitespaceRun)
    );
    let decimal = r"
        (?P<sign>[-+])?           # an optional sign, followed by either...
        (
            (?=\d|\.\d)           # ...a number (with at least one digit)
            (?P<int>\d*)          # having a (possibly empty) integer part
            (\.(?P<frac>\d*))?    # followed by an optional fractional part
            (E(?P<exp>[-+]?\d+))? # followed by an optional exponent, or...
        |
            Inf(inity)?           # ...an infinity, or...
        |
            (?P<signal>s)?        # ...an (optionally signaling)
            NaN                   # NaN
            (?P<diag>\d*)         # with (possibly empty) diagnostic info.
        )
    #    \s*
        \Z
    ";
    assert_eq!(
        lookup_str(decimal, Flags::VERBOSE | Flags::IGNORECASE),
        Some(FastPath::DecimalNumber)
    );
    assert_eq!(lookup_str(decimal, Flags::VERBOSE), None);

    let fingerprint = fingerprint("(?i)(?s)\\s+", Flags::empty(), TextKind::Str);
    assert_eq!(fingerprint.text, r"\s+");
    assert_eq!(fingerprint.flags, Flags::IGNORECASE | Flags::DOTALL);
}

#[test]
fn verbose_stripping_keeps_class_contents() {
    let fingerprint = fingerprint("[# ] x # tail\n[]# ]", Flags::VERBOSE, TextKind::Str);
    assert_eq!(fingerprint.text, "[# ]x[]# ]");
}

#[test]
fn verbose_stripping_keeps_negated_leading_bracket() {
    let fingerprint = fingerprint("[^]x ] # c\n a", Flags::VERBOSE, TextKind::Str);
    assert_eq!(fingerprint.text, "[^]x ]a");
}

#[test]
fn line_anchored_entries_refuse_multiline() {
    assert_eq!(lookup_str("0*$", Flags::MULTILINE), None);
    assert_eq!(lookup_str("(?m)50*$", Flags::empty()), None);
    assert_eq!(lookup_str(USAGE_WORD_PATTERN, Flags::MULTILINE), None);
    assert_eq!(
        lookup_str(r"\s+", Flags::MULTILINE),
        Some(FastPath::WhitespaceRun)
    );
    assert_eq!(
        lookup_str(FORMAT_SPEC_PATTERN, Flags::MULTILINE),
        Some(FastPath::FormatSpec)
    );
}

fn usage_spans(text: &str, anchor: Anchor) -> Option<(usize, usize)> {
    let decoded = text.decode();
    FastPath::UsageWord
        .run(&decoded.units, 0, decoded.len(), anchor, false)
        .map(|slots| (slots[0].unwrap(), slots[1].unwrap()))
}

#[parameterized(
    plain_word = { "prog --x", Some((0, 4)), None },
    optional = { "[-h] x", Some((0, 4)), None },
    group_with_blanks = { "(--a | --b) x", Some((0, 11)), None },
    closer_run = { "[[x]]] y", Some((0, 6)), None },
    closer_at_end = { "[x y]", Some((0, 5)), Some((0, 5)) },
    closer_glued_to_word = { "[a]b c", Some((0, 4)), None },
    later_closer = { "(a)b (c) d", Some((0, 8)), None },
    unclosed = { "(a b", Some((0, 2)), None },
    only_word = { "word", Some((0, 4)), Some((0, 4)) },
    leading_blank = { " x", None, None },
    empty = { "", None, None },
)]
fn usage_words(text: &str, prefix: Option<(usize, usize)>, full: Option<(usize, usize)>) {
    assert_eq!(usage_spans(text, Anchor::Start), prefix);
    assert_eq!(usage_spans(text, Anchor::Both), full);
}

#[test]
fn usage_words_without_brackets_match_non_blank_runs() {
    let corpus = ["", "a", "ab cd", "  x\ty  ", "-h --help", "a)b] c"];
    assert_equivalent(
        FastPath::UsageWord,
        &general(&parsed(r"\S+"), CaseMode::Sensitive),
        &corpus,
    );
}

#[test]
fn group_templates_are_keyed_on_both_texts() {
    assert_eq!(group_template(r"([\[(]) ", TextKind::Str, r"\1"), Some(1));
    assert_eq!(group_template(r" ([\])])", TextKind::Str, r"\1"), Some(1));
    assert_eq!(group_template(r" ([\])])", TextKind::Str, r"\g<1>"), None);
    assert_eq!(group_template(r"([\[(]) ", TextKind::Bytes, r"\1"), None);
    assert_eq!(group_template(r"(a)", TextKind::Str, r"\1"), None);
}
