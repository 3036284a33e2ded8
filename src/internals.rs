// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use log::{Level, log_enabled, trace, warn};

use super::*;

impl Engine {
    /// Fetch, decode and execute the instruction at the instruction pointer.
    ///
    /// Every handler resolves all of its operands before it touches memory or the registers, so an
    /// error leaves the engine exactly as it was before the instruction started.
    pub(crate) fn exec_instruction(&mut self) -> Result<State, VmError> {
        let word = self.memory.load(self.ip)?;
        let instr = Instruction::decode(word, self.ip)?;

        match instr.opcode {
            OpCode::Add => self.op3(instr, i64::checked_add),
            OpCode::Mul => self.op3(instr, i64::checked_mul),
            OpCode::Lt => self.op3(instr, |a, b| Some(i64::from(a < b))),
            OpCode::Eq => self.op3(instr, |a, b| Some(i64::from(a == b))),
            OpCode::Jnz => self.jump(instr, |cond| cond != 0),
            OpCode::Jz => self.jump(instr, |cond| cond == 0),
            OpCode::In => {
                let (raw, dest) = self.resolve_dest(instr, 1)?;
                let value = self.input.receive()?;
                self.record(instr, &[(raw, value)]);
                self.memory.store(dest, value)?;
                self.advance(2)
            }
            OpCode::Out => {
                let (raw, value) = self.resolve_param(instr, 1)?;
                self.output.send(value)?;
                self.record(instr, &[(raw, value)]);
                self.advance(2)
            }
            OpCode::Rbo => {
                let (raw, offset) = self.resolve_param(instr, 1)?;
                let rel_base = self.offset(self.rel_base, offset)?;
                self.record(instr, &[(raw, offset)]);
                self.rel_base = rel_base;
                self.advance(2)
            }
            OpCode::Halt => {
                self.record(instr, &[]);
                self.halted = true;
                if let Err(err) = self.output.close() {
                    warn!("{} could not close its output: {err}", self.name);
                }
                Ok(State::Halted)
            }
        }
    }

    /// `base + offset`, faulting on overflow rather than wrapping
    fn offset(&self, base: i64, offset: i64) -> Result<i64, VmError> {
        base.checked_add(offset).ok_or(VmError::Overflow { ip: self.ip })
    }

    fn advance(&mut self, arity: i64) -> Result<State, VmError> {
        self.ip = self.offset(self.ip, arity)?;
        Ok(State::Running)
    }

    /// Fetch the `n`th parameter of the current instruction, and resolve it into a value according
    /// to its mode. Returns the raw parameter along with its value.
    pub(crate) fn resolve_param(
        &mut self,
        instr: Instruction,
        n: usize,
    ) -> Result<(i64, i64), VmError> {
        let param_addr = self.offset(self.ip, n as i64)?;
        let raw = self.memory.load(param_addr)?;
        let value = match instr.modes[n - 1] {
            ParamMode::Positional => self.memory.load(raw)?,
            ParamMode::Immediate => raw,
            ParamMode::Relative => {
                let address = self.offset(raw, self.rel_base)?;
                self.memory.load(address)?
            }
        };
        Ok((raw, value))
    }

    /// Fetch the `n`th parameter of the current instruction, and resolve it into the address it
    /// points to. Returns the raw parameter along with the address.
    pub(crate) fn resolve_dest(
        &mut self,
        instr: Instruction,
        n: usize,
    ) -> Result<(i64, i64), VmError> {
        let param_addr = self.offset(self.ip, n as i64)?;
        let raw = self.memory.load(param_addr)?;
        let address = match instr.modes[n - 1] {
            ParamMode::Positional => raw,
            ParamMode::Immediate => {
                return Err(VmError::IllegalImmediateWrite {
                    operand: raw,
                    ip: self.ip,
                });
            }
            ParamMode::Relative => self.offset(raw, self.rel_base)?,
        };
        if address < 0 {
            return Err(VmError::AddressFault { address });
        }
        Ok((raw, address))
    }

    /// common logic of all 4 instructions that take 3 parameters
    fn op3(
        &mut self,
        instr: Instruction,
        operation: impl Fn(i64, i64) -> Option<i64>,
    ) -> Result<State, VmError> {
        let (pa, a) = self.resolve_param(instr, 1)?;
        let (pb, b) = self.resolve_param(instr, 2)?;
        let (pc, dest) = self.resolve_dest(instr, 3)?;
        let val = operation(a, b).ok_or(VmError::Overflow { ip: self.ip })?;
        self.record(instr, &[(pa, a), (pb, b), (pc, val)]);
        self.memory.store(dest, val)?;
        self.advance(4)
    }

    fn jump(&mut self, instr: Instruction, func: impl Fn(i64) -> bool) -> Result<State, VmError> {
        let (pc, cond) = self.resolve_param(instr, 1)?;
        let (pd, dest) = self.resolve_param(instr, 2)?;
        self.record(instr, &[(pc, cond), (pd, dest)]);
        if func(cond) {
            // a negative destination faults on the next fetch
            self.ip = dest;
            Ok(State::Running)
        } else {
            self.advance(3)
        }
    }

    /// Log the instruction about to complete, and add it to the active [Trace] if there is one
    fn record(&mut self, instr: Instruction, resolved: &[(i64, i64)]) {
        if self.trace.is_none() && !log_enabled!(Level::Trace) {
            return;
        }
        let traced = TracedInstr::new(instr, self.ip, self.rel_base, resolved);
        trace!(target: "intcode_vm::exec", "{} | rbo: {:>5} | {traced}", self.name, self.rel_base);
        if let Some(trace) = self.trace.as_mut() {
            trace.0.push(traced);
        }
    }
}
