// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Instruction decoding: opcodes, parameter modes, and their arities

use std::fmt::{self, Display};

use crate::error::VmError;

/// Parameter mode for Intcode instruction
///
/// Intcode instruction parameters each have a mode:  [positional], [immediate], or [relative].
///
/// When executing an intcode instruction, the instruction's parameters are interpreted in
/// accordance with their associated modes.
///
/// [positional]: ParamMode::Positional
/// [immediate]: ParamMode::Immediate
/// [relative]: ParamMode::Relative
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum ParamMode {
    /// Positional Mode
    ///
    /// A parameter in positional mode evaluates to the value at the address specified by the
    /// parameter.
    #[default]
    Positional = 0,
    /// Immediate Mode
    ///
    /// A parameter in immediate mode evaluates directly to the value specified. Instructions which
    /// write to memory may not use immediate mode for their destinations.
    #[doc(alias = "#")]
    Immediate = 1,
    /// Relative Mode
    ///
    /// A parameter in relative mode evaluates to the value at the address specified by the
    /// parameter, added to the relative base, which starts out as `0` but can be modified with
    /// [`OpCode::Rbo`].
    #[doc(alias = "@")]
    Relative = 2,
}

impl Display for ParamMode {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamMode::Positional => Ok(()),
            ParamMode::Immediate => write!(fmt, "#"),
            ParamMode::Relative => write!(fmt, "@"),
        }
    }
}

/// An Intcode opcode
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[allow(missing_docs, reason = "see `OpCode::mnemonic`")]
pub enum OpCode {
    Add = 1,
    Mul = 2,
    In = 3,
    Out = 4,
    Jnz = 5,
    Jz = 6,
    Lt = 7,
    Eq = 8,
    Rbo = 9,
    Halt = 99,
}

impl OpCode {
    /// Length of the instruction in words, including the opcode itself
    pub const fn arity(self) -> usize {
        match self {
            Self::Add | Self::Mul | Self::Lt | Self::Eq => 4,
            Self::Jnz | Self::Jz => 3,
            Self::In | Self::Out | Self::Rbo => 2,
            Self::Halt => 1,
        }
    }

    /// Number of parameters the instruction takes
    pub const fn param_count(self) -> usize {
        self.arity() - 1
    }

    /// Index of the parameter that is written to, if there is one
    pub const fn write_param(self) -> Option<usize> {
        match self {
            Self::Add | Self::Mul | Self::Lt | Self::Eq => Some(2),
            Self::In => Some(0),
            Self::Out | Self::Jnz | Self::Jz | Self::Rbo | Self::Halt => None,
        }
    }

    /// Upper-case assembly mnemonic
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Mul => "MUL",
            Self::In => "IN",
            Self::Out => "OUT",
            Self::Jnz => "JNZ",
            Self::Jz => "JZ",
            Self::Lt => "LT",
            Self::Eq => "EQ",
            Self::Rbo => "RBO",
            Self::Halt => "HALT",
        }
    }
}

impl Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl TryFrom<i64> for OpCode {
    type Error = i64;
    fn try_from(i: i64) -> Result<Self, Self::Error> {
        match i {
            1 => Ok(Self::Add),
            2 => Ok(Self::Mul),
            3 => Ok(Self::In),
            4 => Ok(Self::Out),
            5 => Ok(Self::Jnz),
            6 => Ok(Self::Jz),
            7 => Ok(Self::Lt),
            8 => Ok(Self::Eq),
            9 => Ok(Self::Rbo),
            99 => Ok(Self::Halt),
            _ => Err(i),
        }
    }
}

/// A decoded instruction word
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Instruction {
    /// The raw word the instruction was decoded from
    pub word: i64,
    /// The opcode
    pub opcode: OpCode,
    /// Modes for the 1st, 2nd and 3rd parameter. Modes past the opcode's parameter count are
    /// always [`ParamMode::Positional`].
    pub modes: [ParamMode; 3],
}

impl Instruction {
    /// Decode `word`, found at `ip`
    ///
    /// Given a 5 digit number, digits ABCDE are used as follows:
    /// DE is the two-digit opcode, C is the 1st parameter's mode, B is the 2nd parameter's mode,
    /// and A is the 3rd parameter's mode. So `21202` is a multiply with its 1st parameter in
    /// relative mode, its 2nd in immediate mode, and its 3rd in relative mode.
    ///
    /// Mode digits beyond the opcode's parameters are ignored, so `21299` is still a `HALT`.
    pub fn decode(word: i64, ip: i64) -> Result<Self, VmError> {
        let opcode = match word {
            ..0 => None,
            _ => OpCode::try_from(word % 100).ok(),
        }
        .ok_or(VmError::IllegalOpcode { opcode: word, ip })?;

        let mut modes = [ParamMode::Positional; 3];
        let mut digits = word / 100;
        for mode in modes.iter_mut().take(opcode.param_count()) {
            *mode = match digits % 10 {
                0 => ParamMode::Positional,
                1 => ParamMode::Immediate,
                2 => ParamMode::Relative,
                n => return Err(VmError::IllegalMode { mode: n, ip }),
            };
            digits /= 10;
        }

        Ok(Self {
            word,
            opcode,
            modes,
        })
    }
}
