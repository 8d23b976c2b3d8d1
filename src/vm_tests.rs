#![allow(clippy::unwrap_used, clippy::expect_used)]

use yare::parameterized;

use super::*;
use crate::ast::{Ast, Node};
use crate::compiler::compile;
use crate::flags::Flags;
use crate::haystack::Haystack;
use crate::parser::parse;

const STEPS: u64 = 1_000_000;

fn program(pattern: &str, case: CaseMode) -> Program {
    let (ast, _) = parse(pattern, Flags::empty()).unwrap();
    compile(&ast, case, 1 << 16).unwrap()
}

fn exec(pattern: &str, text: &str, anchor: Anchor) -> Option<Slots> {
    let decoded = text.decode();
    run(
        &program(pattern, CaseMode::Sensitive),
        &decoded,
        0,
        decoded.len(),
        anchor,
        STEPS,
    )
    .unwrap()
}

fn span(pattern: &str, text: &str, anchor: Anchor) -> Option<(usize, usize)> {
    exec(pattern, text, anchor).map(|s| (s[0].unwrap(), s[1].unwrap()))
}

fn group(slots: &Slots, id: usize) -> Option<(usize, usize)> {
    slots[id * 2].zip(slots[id * 2 + 1])
}

#[parameterized(
    greedy_star = { "a*", "aaa", Some((0, 3)) },
    lazy_star = { "a*?", "aaa", Some((0, 0)) },
    lazy_plus = { "a+?", "aaa", Some((0, 1)) },
    bounded_upper = { "a{2,3}", "aaaa", Some((0, 3)) },
    bounded_lazy = { "a{2,3}?", "aaaa", Some((0, 2)) },
    bounded_short = { "a{2,3}", "a", None },
    negated_class = { "[^a-c]+", "xyza", Some((0, 3)) },
    negated_miss = { "[^a-c]", "b", None },
    dot_newline = { ".", "\n", Some((0, 1)) },
    alternation_first = { "a|ab", "ab", Some((0, 1)) },
    backtrack_into_group = { "(a+)ab", "aaab", Some((0, 4)) },
)]
fn anchored_spans(pattern: &str, text: &str, expected: Option<(usize, usize)>) {
    assert_eq!(span(pattern, text, Anchor::Start), expected);
}

#[test]
fn alternation_captures_leftmost_branch() {
    let slots = exec("(a|ab)(c|bcd)", "abcd", Anchor::Start).unwrap();
    assert_eq!(group(&slots, 0), Some((0, 4)));
    assert_eq!(group(&slots, 1), Some((0, 1)));
    assert_eq!(group(&slots, 2), Some((1, 4)));
}

#[test]
fn fullmatch_backtracks_to_reach_the_end() {
    assert_eq!(span("a*?", "aaa", Anchor::Both), Some((0, 3)));
    assert_eq!(span("a|ab", "ab", Anchor::Both), Some((0, 2)));
    assert_eq!(span("a+", "aab", Anchor::Both), None);
}

#[test]
fn search_finds_leftmost() {
    assert_eq!(span("b+", "aabbb", Anchor::Unanchored), Some((2, 5)));
    assert_eq!(span("x", "aab", Anchor::Unanchored), None);
    assert_eq!(span("", "ab", Anchor::Unanchored), Some((0, 0)));
}

#[test]
fn anchors_bind_to_the_subject() {
    assert_eq!(span("^b", "ab", Anchor::Unanchored), None);
    assert_eq!(span("b$", "abb", Anchor::Unanchored), Some((2, 3)));
    assert_eq!(span("^$", "", Anchor::Unanchored), Some((0, 0)));
}

#[test]
fn window_end_is_the_end_anchor() {
    let text = "abcd".decode();
    let prog = program("c$", CaseMode::Sensitive);
    let slots = run(&prog, &text, 0, 3, Anchor::Unanchored, STEPS).unwrap().unwrap();
    assert_eq!((slots[0], slots[1]), (Some(2), Some(3)));

    // `^` stays at absolute zero even when the window starts later.
    let prog = program("^b", CaseMode::Sensitive);
    assert_eq!(run(&prog, &text, 1, 4, Anchor::Unanchored, STEPS).unwrap(), None);
}

#[test]
fn unmatched_groups_report_none() {
    let slots = exec("(a)|(b)", "b", Anchor::Start).unwrap();
    assert_eq!(group(&slots, 1), None);
    assert_eq!(group(&slots, 2), Some((0, 1)));
}

#[test]
fn last_iteration_wins_capture() {
    let slots = exec("(?:(a)|(b))+", "ab", Anchor::Start).unwrap();
    assert_eq!(group(&slots, 0), Some((0, 2)));
    assert_eq!(group(&slots, 1), Some((0, 1)));
    assert_eq!(group(&slots, 2), Some((1, 2)));
}

#[parameterized(
    nested_star = { "(a*)*", "b", Some((0, 0)), None },
    optional_body = { "(x?)*y", "y", Some((0, 1)), None },
    after_progress = { "(a|)+b", "aab", Some((0, 3)), Some((1, 2)) },
    mandatory_copy_kept = { "(a|)+b", "b", Some((0, 1)), Some((0, 0)) },
    bounded_above = { "(x?){2,}y", "xy", Some((0, 2)), Some((1, 1)) },
)]
fn empty_iterations_are_dropped(
    pattern: &str,
    text: &str,
    whole: Option<(usize, usize)>,
    first: Option<(usize, usize)>,
) {
    let slots = exec(pattern, text, Anchor::Start).unwrap();
    assert_eq!(group(&slots, 0), whole);
    assert_eq!(group(&slots, 1), first);
}

#[test]
fn case_folding_modes() {
    let text = "ÉcOLE".decode();
    let unicode = program("école", CaseMode::Insensitive);
    assert!(run(&unicode, &text, 0, 5, Anchor::Both, STEPS).unwrap().is_some());

    let ascii = program("école", CaseMode::AsciiInsensitive);
    assert!(run(&ascii, &text, 0, 5, Anchor::Both, STEPS).unwrap().is_none());

    let class = program("[a-c]+", CaseMode::AsciiInsensitive);
    let slots = run(&class, &"ABCd".decode(), 0, 4, Anchor::Start, STEPS)
        .unwrap()
        .unwrap();
    assert_eq!(slots[1], Some(3));
}

#[test]
fn bytes_subjects_match_latin1_units() {
    let text: &[u8] = b"\x00\xffab";
    let decoded = text.decode();
    let prog = program(r"\xff(a)", CaseMode::Sensitive);
    let slots = run(&prog, &decoded, 0, 4, Anchor::Unanchored, STEPS)
        .unwrap()
        .unwrap();
    assert_eq!(group(&slots, 1), Some((2, 3)));
}

#[test]
fn catastrophic_pattern_exhausts_budget() {
    let text = format!("{}c", "a".repeat(40));
    let decoded = text.as_str().decode();
    let prog = program("(a*)*b", CaseMode::Sensitive);
    let err = run(&prog, &decoded, 0, decoded.len(), Anchor::Unanchored, 50_000).unwrap_err();
    assert_eq!(err, Error::BudgetExceeded { limit: 50_000 });
}

#[test]
fn deep_inputs_do_not_recurse() {
    let text = "a".repeat(200_000);
    let decoded = text.as_str().decode();
    let prog = program("(?:a|b)*$", CaseMode::Sensitive);
    let slots = run(&prog, &decoded, 0, decoded.len(), Anchor::Start, u64::MAX)
        .unwrap()
        .unwrap();
    assert_eq!(slots[1], Some(200_000));
}

#[test]
fn hand_built_programs_run() {
    let ast = Ast::new(
        vec![Node::group(
            1,
            vec![Node::lazy_repeat(Node::AnyChar, 0, None)],
        ), Node::Literal('"')],
        1,
    );
    let prog = compile(&ast, CaseMode::Sensitive, 1 << 10).unwrap();
    let decoded = r#"ab"cd""#.decode();
    let slots = run(&prog, &decoded, 0, decoded.len(), Anchor::Start, STEPS)
        .unwrap()
        .unwrap();
    assert_eq!(group(&slots, 1), Some((0, 2)));
}
