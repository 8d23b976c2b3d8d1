/// Compiler: converts AST into bytecode instructions for the VM.
use crate::ast::*;
use crate::charset::CharSet;
use crate::error::{Error, Result};

/// VM instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    /// Match a specific character.
    Char(char),
    /// Match any character.
    Any,
    /// Match a character class.
    Class { set: CharSet, negated: bool },
    /// Successful match.
    Match,
    /// Jump to target instruction.
    Jump(usize),
    /// Try first path, fall back to second.
    Split(usize, usize),
    /// Save position into capture slot.
    Save(usize),
    /// Assert start of subject.
    AssertStart,
    /// Assert end of subject window.
    AssertEnd,
    /// Remember the position at the start of a loop iteration.
    RepeatMark(usize),
    /// Fail the thread if the iteration begun at the matching mark consumed
    /// nothing, so the loop exit is taken without that iteration.
    RepeatCheck(usize),
}

/// How characters compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    #[default]
    Sensitive,
    /// Simple case folding over all of Unicode.
    Insensitive,
    /// Case folding restricted to ASCII letters.
    AsciiInsensitive,
}

/// Compiled program.
#[derive(Debug, Clone)]
pub struct Program {
    pub insts: Vec<Inst>,
    pub n_groups: usize,
    /// Number of loop registers used by `RepeatMark`/`RepeatCheck`.
    pub n_registers: usize,
    pub case: CaseMode,
    /// If the pattern must start with a specific literal character, store it here.
    /// Used by the VM to skip starting positions that can't possibly match.
    pub first_char: Option<char>,
    /// Whether the pattern is anchored at the start (^).
    pub anchored_start: bool,
}

/// Compile an AST into a bytecode program holding at most `size_limit` instructions.
pub fn compile(ast: &Ast, case: CaseMode, size_limit: usize) -> Result<Program> {
    let mut compiler = Compiler {
        insts: Vec::new(),
        n_registers: 0,
        size_limit,
    };
    compiler.emit_seq(&ast.nodes)?;
    compiler.push(Inst::Match)?;
    let insts = compiler.insts;
    let first_char = match case {
        CaseMode::Sensitive => extract_first_char(&insts),
        _ => None,
    };
    let anchored_start = matches!(first_meaningful(&insts), Some(Inst::AssertStart));
    Ok(Program {
        insts,
        n_groups: ast.group_count,
        n_registers: compiler.n_registers,
        case,
        first_char,
        anchored_start,
    })
}

/// First instruction that is not a capture save.
fn first_meaningful(insts: &[Inst]) -> Option<&Inst> {
    insts.iter().find(|inst| !matches!(inst, Inst::Save(_)))
}

/// Extract the first required literal character from the instruction stream, if any.
fn extract_first_char(insts: &[Inst]) -> Option<char> {
    let mut rest = insts.iter().filter(|inst| !matches!(inst, Inst::Save(_)));
    match rest.next()? {
        Inst::Char(ch) => Some(*ch),
        // If the first instruction is AssertStart, check the next one
        Inst::AssertStart => match rest.next()? {
            Inst::Char(ch) => Some(*ch),
            _ => None,
        },
        _ => None,
    }
}

struct Compiler {
    insts: Vec<Inst>,
    n_registers: usize,
    size_limit: usize,
}

impl Compiler {
    fn push(&mut self, inst: Inst) -> Result<usize> {
        if self.insts.len() >= self.size_limit {
            return Err(Error::TooLarge {
                limit: self.size_limit,
            });
        }
        self.insts.push(inst);
        Ok(self.insts.len() - 1)
    }

    /// Reserve a slot to be patched once its targets are known.
    fn placeholder(&mut self) -> Result<usize> {
        self.push(Inst::Jump(usize::MAX))
    }

    fn emit_seq(&mut self, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            self.emit(node)?;
        }
        Ok(())
    }

    fn emit(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::Literal(ch) => {
                self.push(Inst::Char(*ch))?;
            }
            Node::AnyChar => {
                self.push(Inst::Any)?;
            }
            Node::CharClass { set, negated } => {
                self.push(Inst::Class {
                    set: set.clone(),
                    negated: *negated,
                })?;
            }
            Node::AnchorStart => {
                self.push(Inst::AssertStart)?;
            }
            Node::AnchorEnd => {
                self.push(Inst::AssertEnd)?;
            }
            Node::Group { id, body } => {
                // The body is inlined between two saves so that choices inside
                // it stay open to backtracking from whatever follows the group.
                self.push(Inst::Save(id * 2))?;
                self.emit_seq(body)?;
                self.push(Inst::Save(id * 2 + 1))?;
            }
            Node::NonCapturingGroup(body) => {
                self.emit_seq(body)?;
            }
            Node::Alternation(branches) => self.emit_alternation(branches)?,
            Node::Repeat {
                min,
                max,
                body,
                greedy,
            } => self.emit_repeat(body, *min, *max, *greedy)?,
        }
        Ok(())
    }

    fn emit_alternation(&mut self, branches: &[Vec<Node>]) -> Result<()> {
        // a|b|c compiles to:
        //   split L1, L2
        //   L1: <a> jump END
        //   L2: split L3, L4
        //   L3: <b> jump END
        //   L4: <c>
        //   END:
        let Some((last, init)) = branches.split_last() else {
            return Ok(());
        };
        let mut fixup_jumps = Vec::with_capacity(init.len());
        for branch in init {
            let split_pc = self.placeholder()?;
            let branch_start = self.insts.len();
            self.emit_seq(branch)?;
            fixup_jumps.push(self.placeholder()?);
            let next_branch = self.insts.len();
            self.insts[split_pc] = Inst::Split(branch_start, next_branch);
        }
        self.emit_seq(last)?;
        let end = self.insts.len();
        for jpc in fixup_jumps {
            self.insts[jpc] = Inst::Jump(end);
        }
        Ok(())
    }

    fn emit_repeat(
        &mut self,
        body: &Node,
        min: usize,
        max: Option<usize>,
        greedy: bool,
    ) -> Result<()> {
        // Mandatory copies first.
        for _ in 0..min {
            self.emit(body)?;
        }
        match max {
            None => self.emit_star(body, greedy),
            Some(max) => self.emit_optional_chain(body, max.saturating_sub(min), greedy),
        }
    }

    /// Unbounded loop whose iterations must each consume something:
    ///   L1: split L2, L3  (greedy: prefer L2)
    ///   L2: mark r; <body>; check r; jump L1
    ///   L3:
    fn emit_star(&mut self, body: &Node, greedy: bool) -> Result<()> {
        let register = self.n_registers;
        self.n_registers += 1;
        let l1 = self.placeholder()?;
        let l2 = self.push(Inst::RepeatMark(register))?;
        self.emit(body)?;
        self.push(Inst::RepeatCheck(register))?;
        self.push(Inst::Jump(l1))?;
        let l3 = self.insts.len();
        self.insts[l1] = if greedy {
            Inst::Split(l2, l3)
        } else {
            Inst::Split(l3, l2)
        };
        Ok(())
    }

    /// `count` nested optional copies, `(x(x(x)?)?)?`. Declining any copy
    /// skips every later one.
    fn emit_optional_chain(&mut self, body: &Node, count: usize, greedy: bool) -> Result<()> {
        let mut splits = Vec::with_capacity(count);
        for _ in 0..count {
            splits.push(self.placeholder()?);
            self.emit(body)?;
        }
        let end = self.insts.len();
        for split_pc in splits {
            self.insts[split_pc] = if greedy {
                Inst::Split(split_pc + 1, end)
            } else {
                Inst::Split(end, split_pc + 1)
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::flags::Flags;
    use crate::parser::parse;

    fn program(pattern: &str) -> Program {
        let (ast, _) = parse(pattern, Flags::empty()).unwrap();
        compile(&ast, CaseMode::Sensitive, 1 << 16).unwrap()
    }

    #[test]
    fn groups_are_inlined_saves() {
        let prog = program("(a)b");
        assert_eq!(
            prog.insts,
            vec![
                Inst::Save(2),
                Inst::Char('a'),
                Inst::Save(3),
                Inst::Char('b'),
                Inst::Match,
            ]
        );
        assert_eq!(prog.first_char, Some('a'));
    }

    #[test]
    fn star_carries_progress_guard() {
        let prog = program("a*");
        assert_eq!(
            prog.insts,
            vec![
                Inst::Split(1, 5),
                Inst::RepeatMark(0),
                Inst::Char('a'),
                Inst::RepeatCheck(0),
                Inst::Jump(0),
                Inst::Match,
            ]
        );
        assert_eq!(prog.n_registers, 1);
        assert_eq!(prog.first_char, None);
    }

    #[test]
    fn bounded_repeat_nests_optional_copies() {
        let prog = program("a{1,3}?");
        assert_eq!(
            prog.insts,
            vec![
                Inst::Char('a'),
                Inst::Split(5, 2),
                Inst::Char('a'),
                Inst::Split(5, 4),
                Inst::Char('a'),
                Inst::Match,
            ]
        );
    }

    #[test]
    fn anchored_programs_are_flagged() {
        assert!(program("^ab").anchored_start);
        assert_eq!(program("^ab").first_char, Some('a'));
        assert!(!program("a^").anchored_start);
    }

    #[test]
    fn expansion_respects_size_limit() {
        let (ast, _) = parse("(?:a{1000}){1000}", Flags::empty()).unwrap();
        let err = compile(&ast, CaseMode::Sensitive, 10_000).unwrap_err();
        assert_eq!(err, Error::TooLarge { limit: 10_000 });
    }
}
