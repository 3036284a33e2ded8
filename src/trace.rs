// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Recording of executed instructions, for debugging Intcode programs
use std::fmt::{self, Display};

use super::Engine;
use super::decode::{Instruction, OpCode, ParamMode};

#[derive(Clone, Debug, PartialEq)]
/// What an executed instruction was, where it ran, and what its parameters resolved to.
///
/// Converted into a human-readable line by its [Display] impl.
pub struct TracedInstr {
    instr: Instruction,
    instr_ptr: i64,
    rel_base: i64,
    params: [(i64, i64); 3],
}

impl TracedInstr {
    pub(crate) fn new(
        instr: Instruction,
        instr_ptr: i64,
        rel_base: i64,
        resolved: &[(i64, i64)],
    ) -> Self {
        debug_assert_eq!(resolved.len(), instr.opcode.param_count());
        let mut params = [(0, 0); 3];
        params[..resolved.len()].copy_from_slice(resolved);
        Self {
            instr,
            instr_ptr,
            rel_base,
            params,
        }
    }

    /// Return the relative base at the time the traced instruction was executed
    pub fn rel_base(&self) -> i64 {
        self.rel_base
    }

    /// Return the instruction pointer's position when the traced instruction was executed
    pub fn instr_ptr(&self) -> i64 {
        self.instr_ptr
    }

    /// Return the actual integer of the traced instruction
    pub fn op_int(&self) -> i64 {
        self.instr.word
    }

    /// Return the opcode of the traced instruction
    pub fn op_code(&self) -> OpCode {
        self.instr.opcode
    }

    /// Return an array of the parameter modes of the traced instruction
    pub fn param_modes(&self) -> [ParamMode; 3] {
        self.instr.modes
    }

    /// Each parameter as it appeared in memory, paired with the value it resolved to. For the
    /// destination of a write, the resolved value is the value that was stored.
    pub fn params(&self) -> &[(i64, i64)] {
        &self.params[..self.instr.opcode.param_count()]
    }

    /// If the instruction stored a value, return that value
    pub fn stored_val(&self) -> Option<i64> {
        self.instr.opcode.write_param().map(|i| self.params[i].1)
    }
}

impl Display for TracedInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ran instruction at {:0>4}: op int {: <5} | ",
            self.instr_ptr, self.instr.word
        )?;
        let [m0, m1, m2] = self.instr.modes;
        let opcode = self.instr.opcode;

        match (opcode, self.params) {
            (
                OpCode::Add | OpCode::Mul | OpCode::Lt | OpCode::Eq,
                [(pa, va), (pb, vb), (dest, stored)],
            ) => write!(
                f,
                "[{opcode} {m0}{pa} (resolves to {va}), {m1}{pb} (resolves to {vb}), {m2}{dest} (stored {stored})]"
            ),
            (OpCode::Jnz | OpCode::Jz, [(p_cond, v_cond), (p_dest, v_dest), _]) => {
                let jumped = (v_cond != 0) == (opcode == OpCode::Jnz);
                write!(
                    f,
                    "[{opcode} {m0}{p_cond} (resolves to {v_cond}), {m1}{p_dest} ({} to {v_dest})]",
                    if jumped { "jumped" } else { "didn't jump" }
                )
            }
            (OpCode::In, [(p, v), ..]) => write!(f, "[{opcode} {m0}{p} (stored {v})]"),
            (OpCode::Out, [(p, v), ..]) => write!(f, "[{opcode} {m0}{p} (resolves to {v})]"),
            (OpCode::Rbo, [(p, v), ..]) => write!(
                f,
                "[{opcode} {m0}{p} (resolved to {v}) (went from {} to {})]",
                self.rel_base,
                self.rel_base.saturating_add(v),
            ),
            (OpCode::Halt, _) => write!(f, "[{opcode}]"),
        }
    }
}

impl Engine {
    /// Begin a [Trace] of executed instructions. If a trace is already running, this replaces that
    /// trace and returns it in a [`Some`], otherwise, it returns [`None`].
    ///
    /// # Example
    /// ```
    /// use intcode_vm::prelude::*;
    /// let mut engine = Engine::new([1101, 90, 9, 4, 0]);
    /// engine.start_trace();
    /// engine.run().unwrap();
    /// let trace = engine.end_trace().unwrap();
    /// assert_eq!(trace.0.len(), 2);
    /// assert_eq!(trace.0[0].stored_val(), Some(99));
    /// ```
    pub fn start_trace(&mut self) -> Option<Trace> {
        self.trace.replace(Trace::default())
    }

    /// Stop tracing executed instructions into a [Trace]. If no trace was active, returns [`None`]
    ///
    /// see [Engine::start_trace]
    pub fn end_trace(&mut self) -> Option<Trace> {
        self.trace.take()
    }

    /// Get a view of the current trace
    pub fn show_trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
/// A log of instructions that an [Engine] has executed since a call to [Engine::start_trace]
pub struct Trace(pub Vec<TracedInstr>);

impl Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|instr| writeln!(f, "{instr}"))
    }
}
