/// VM executor: runs compiled bytecode against a decoded subject.
///
/// Backtracking is iterative. Choice points and the undo entries for
/// capture slots and loop registers share one explicit stack, so deep
/// inputs never grow the native call stack. Every executed instruction
/// costs one step from a per-call budget.
use crate::charset::eq_folded;
use crate::compiler::{CaseMode, Inst, Program};
use crate::error::{Error, Result};
use crate::haystack::Decoded;

/// Capture slots: `2*i` is the start and `2*i+1` the end of group `i`.
/// Group 0 is the whole match.
pub type Slots = Vec<Option<usize>>;

/// Where a match has to begin and end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Exactly at the start of the window (`match`).
    Start,
    /// At the start and running to the end of the window (`fullmatch`).
    Both,
    /// Anywhere, leftmost first (`search`).
    Unanchored,
}

/// An entry on the backtrack stack.
enum Frame {
    /// Resume at `pc` with the subject at `pos`.
    Retry { pc: usize, pos: usize },
    /// Put a capture slot back.
    RestoreSlot { slot: usize, old: Option<usize> },
    /// Put a loop register back.
    RestoreRegister { register: usize, old: usize },
}

/// Run `program` over `text.units[start..end]`.
pub fn run(
    program: &Program,
    text: &Decoded<'_>,
    start: usize,
    end: usize,
    anchor: Anchor,
    step_limit: u64,
) -> Result<Option<Slots>> {
    let mut vm = Vm::new(program, &text.units, end, anchor == Anchor::Both, step_limit);
    if anchor != Anchor::Unanchored {
        return vm.attempt(start);
    }

    // If anchored at start, only position 0 can match.
    if program.anchored_start {
        return if start == 0 { vm.attempt(0) } else { Ok(None) };
    }

    let mut at = start;
    while at <= end {
        // First-char optimization: skip positions where the first required char doesn't match
        if let Some(fc) = program.first_char {
            match text.find_unit(fc, at, end) {
                Some(Some(found)) => at = found,
                Some(None) => return Ok(None),
                None => {
                    if at >= end {
                        return Ok(None);
                    }
                    if text.units[at] != fc {
                        at += 1;
                        continue;
                    }
                }
            }
            tracing::trace!(at, "candidate start");
        }
        if let Some(slots) = vm.attempt(at)? {
            return Ok(Some(slots));
        }
        at += 1;
    }
    Ok(None)
}

struct Vm<'a> {
    program: &'a Program,
    units: &'a [char],
    end: usize,
    must_reach_end: bool,
    slots: Slots,
    registers: Vec<usize>,
    stack: Vec<Frame>,
    steps: u64,
    step_limit: u64,
}

impl<'a> Vm<'a> {
    fn new(
        program: &'a Program,
        units: &'a [char],
        end: usize,
        must_reach_end: bool,
        step_limit: u64,
    ) -> Self {
        Vm {
            program,
            units,
            end,
            must_reach_end,
            slots: vec![None; (program.n_groups + 1) * 2],
            registers: vec![0; program.n_registers],
            stack: Vec::new(),
            steps: 0,
            step_limit,
        }
    }

    /// Try to match starting exactly at `start`.
    fn attempt(&mut self, start: usize) -> Result<Option<Slots>> {
        self.slots.fill(None);
        self.stack.clear();
        self.stack.push(Frame::Retry { pc: 0, pos: start });

        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::RestoreSlot { slot, old } => self.slots[slot] = old,
                Frame::RestoreRegister { register, old } => self.registers[register] = old,
                Frame::Retry { pc, pos } => {
                    if let Some(end) = self.exec(pc, pos)? {
                        let mut slots = self.slots.clone();
                        slots[0] = Some(start);
                        slots[1] = Some(end);
                        return Ok(Some(slots));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Run one thread until it matches (returning the end position) or fails.
    fn exec(&mut self, mut pc: usize, mut pos: usize) -> Result<Option<usize>> {
        loop {
            self.steps += 1;
            if self.steps > self.step_limit {
                tracing::warn!(limit = self.step_limit, "match budget exhausted");
                return Err(Error::BudgetExceeded {
                    limit: self.step_limit,
                });
            }
            match &self.program.insts[pc] {
                Inst::Match => {
                    if self.must_reach_end && pos != self.end {
                        return Ok(None);
                    }
                    return Ok(Some(pos));
                }
                Inst::Char(expected) => {
                    if pos < self.end && self.char_eq(self.units[pos], *expected) {
                        pos += 1;
                        pc += 1;
                    } else {
                        return Ok(None);
                    }
                }
                Inst::Any => {
                    if pos < self.end {
                        pos += 1;
                        pc += 1;
                    } else {
                        return Ok(None);
                    }
                }
                Inst::Class { set, negated } => {
                    if pos >= self.end {
                        return Ok(None);
                    }
                    let ch = self.units[pos];
                    let hit = match self.program.case {
                        CaseMode::Sensitive => set.contains(ch),
                        CaseMode::Insensitive => set.contains_folded(ch, false),
                        CaseMode::AsciiInsensitive => set.contains_folded(ch, true),
                    };
                    if hit != *negated {
                        pos += 1;
                        pc += 1;
                    } else {
                        return Ok(None);
                    }
                }
                Inst::Jump(target) => {
                    pc = *target;
                }
                Inst::Split(first, second) => {
                    self.stack.push(Frame::Retry { pc: *second, pos });
                    pc = *first;
                }
                Inst::Save(slot) => {
                    let slot = *slot;
                    self.stack.push(Frame::RestoreSlot {
                        slot,
                        old: self.slots[slot],
                    });
                    self.slots[slot] = Some(pos);
                    pc += 1;
                }
                Inst::AssertStart => {
                    if pos == 0 {
                        pc += 1;
                    } else {
                        return Ok(None);
                    }
                }
                Inst::AssertEnd => {
                    if pos == self.end {
                        pc += 1;
                    } else {
                        return Ok(None);
                    }
                }
                Inst::RepeatMark(register) => {
                    let register = *register;
                    self.stack.push(Frame::RestoreRegister {
                        register,
                        old: self.registers[register],
                    });
                    self.registers[register] = pos;
                    pc += 1;
                }
                Inst::RepeatCheck(register) => {
                    // An iteration that consumed nothing is discarded along
                    // with its captures; the loop exit is still on the stack.
                    if self.registers[*register] == pos {
                        return Ok(None);
                    }
                    pc += 1;
                }
            }
        }
    }

    fn char_eq(&self, ch: char, expected: char) -> bool {
        match self.program.case {
            CaseMode::Sensitive => ch == expected,
            CaseMode::Insensitive => eq_folded(ch, expected, false),
            CaseMode::AsciiInsensitive => eq_folded(ch, expected, true),
        }
    }
}

#[cfg(test)]
#[path = "vm_tests.rs"]
mod tests;
