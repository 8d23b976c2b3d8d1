#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::error::Error;

#[derive(Debug, PartialEq)]
enum Token {
    Number(i64),
    Op(char),
    Ident(String),
}

fn arithmetic() -> Scanner<Token> {
    Scanner::new()
        .token(r"\d+", |s| Token::Number(s.parse().unwrap()))
        .unwrap()
        .token(r"[-+*/]", |s| Token::Op(s.chars().next().unwrap()))
        .unwrap()
        .token(r"[a-z_]\w*", |s| Token::Ident(s.to_string()))
        .unwrap()
        .skip(r"\s+")
        .unwrap()
}

#[test]
fn scans_whole_input() {
    let (tokens, rest) = arithmetic().scan("x + 42*y_1").unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::Ident("x".into()),
            Token::Op('+'),
            Token::Number(42),
            Token::Op('*'),
            Token::Ident("y_1".into()),
        ]
    );
    assert_eq!(rest, "");
}

#[test]
fn stops_where_nothing_matches() {
    let (tokens, rest) = arithmetic().scan("1 + ü2").unwrap();
    assert_eq!(tokens, vec![Token::Number(1), Token::Op('+')]);
    assert_eq!(rest, "ü2");
}

#[test]
fn first_rule_wins() {
    let scanner = Scanner::new()
        .token("ab", |_| 1)
        .unwrap()
        .token("abc", |_| 2)
        .unwrap()
        .token("c", |_| 3)
        .unwrap();
    assert_eq!(scanner.scan("abcab").unwrap(), (vec![1, 3, 1], ""));
}

#[test]
fn stops_on_empty_match() {
    let scanner = Scanner::new()
        .token("a", |s| s.len())
        .unwrap()
        .token("b*", |s| s.len())
        .unwrap();
    assert_eq!(scanner.scan("aabbxa").unwrap(), (vec![1, 1, 2], "xa"));
}

#[test]
fn flags_apply_to_rules() {
    let scanner = Scanner::new()
        .with_flags(Flags::IGNORECASE)
        .token("select|from", |s| s.to_lowercase())
        .unwrap()
        .skip(" ")
        .unwrap();
    let (tokens, rest) = scanner.scan("SELECT From x").unwrap();
    assert_eq!(tokens, vec!["select", "from"]);
    assert_eq!(rest, "x");
}

#[test]
fn bad_rules_fail_at_construction() {
    let err = Scanner::<()>::new().skip("(").unwrap_err();
    assert!(matches!(err, Error::Syntax { .. }));
}

#[test]
fn empty_lexicon_scans_nothing() {
    let scanner: Scanner<()> = Scanner::default();
    assert_eq!(scanner.scan("abc").unwrap(), (vec![], "abc"));
}
