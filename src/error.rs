// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Error types for the engine, its channels, program parsing and the harness

use std::error::Error;
use std::fmt::{self, Display};
use std::io;
use std::num::ParseIntError;

#[derive(Debug)]
/// An error raised while executing Intcode
///
/// Everything except [`VmError::Channel`] is a fault: the engine is poisoned and will not execute
/// further instructions. Channel errors leave the instruction pointer on the `IN` or `OUT` that
/// raised them, so execution can resume once the channel is usable again.
pub enum VmError {
    /// Memory was accessed at a negative address
    AddressFault {
        /// the offending address
        address: i64,
    },
    /// The instruction word did not decode to a known opcode
    IllegalOpcode {
        /// the full instruction word
        opcode: i64,
        /// where it was found
        ip: i64,
    },
    /// A parameter mode digit other than 0, 1 or 2 was used
    IllegalMode {
        /// the mode digit
        mode: i64,
        /// the instruction pointer
        ip: i64,
    },
    /// An instruction tried to write to an immediate-mode destination
    IllegalImmediateWrite {
        /// the raw destination operand
        operand: i64,
        /// the instruction pointer
        ip: i64,
    },
    /// 64-bit arithmetic overflowed
    Overflow {
        /// the instruction pointer
        ip: i64,
    },
    /// The engine already faulted, and refuses to run any more instructions
    Poisoned,
    /// The input or output channel failed
    Channel(ChannelError),
}

impl VmError {
    /// Whether this is a fatal engine fault, as opposed to a channel condition
    pub fn is_fault(&self) -> bool {
        !matches!(self, Self::Channel(_))
    }

    /// Whether this is a peer closing its end of a pipe, the normal way for a pipeline to wind down
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::Channel(ChannelError::EndOfStream))
    }
}

impl PartialEq for VmError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::AddressFault { address: l }, Self::AddressFault { address: r }) => l == r,
            (
                Self::IllegalOpcode { opcode: lo, ip: li },
                Self::IllegalOpcode { opcode: ro, ip: ri },
            ) => lo == ro && li == ri,
            (Self::IllegalMode { mode: lm, ip: li }, Self::IllegalMode { mode: rm, ip: ri }) => {
                lm == rm && li == ri
            }
            (
                Self::IllegalImmediateWrite { operand: lo, ip: li },
                Self::IllegalImmediateWrite { operand: ro, ip: ri },
            ) => lo == ro && li == ri,
            (Self::Overflow { ip: l }, Self::Overflow { ip: r }) => l == r,
            (Self::Poisoned, Self::Poisoned) => true,
            (Self::Channel(l), Self::Channel(r)) => l == r,
            _ => false,
        }
    }
}

impl Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressFault { address } => {
                write!(f, "attempted to access negative address {address}")
            }
            Self::IllegalOpcode { opcode, ip } => {
                write!(f, "encountered unrecognized opcode {opcode} at {ip}")
            }
            Self::IllegalMode { mode, ip } => {
                write!(f, "encountered unknown parameter mode {mode} at {ip}")
            }
            Self::IllegalImmediateWrite { operand, ip } => {
                write!(f, "instruction at {ip} attempted to write to immediate {operand}")
            }
            Self::Overflow { ip } => write!(f, "integer overflow in instruction at {ip}"),
            Self::Poisoned => write!(f, "engine previously faulted"),
            Self::Channel(e) => Display::fmt(e, f),
        }
    }
}

impl Error for VmError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Channel(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ChannelError> for VmError {
    fn from(err: ChannelError) -> Self {
        Self::Channel(err)
    }
}

#[derive(Debug)]
/// An error raised by an [`InputChannel`] or [`OutputChannel`]
///
/// [`InputChannel`]: crate::channel::InputChannel
/// [`OutputChannel`]: crate::channel::OutputChannel
pub enum ChannelError {
    /// The peer has terminated and no value is pending
    EndOfStream,
    /// `IN` executed against an empty queue
    InputExhausted,
    /// Tried to dequeue from an empty output queue
    OutputExhausted,
    /// A queue operation was used on a channel that is not a queue
    WrongKind {
        /// the kind of channel the operation needs
        expected: &'static str,
    },
    /// A line read from a stream was not a decimal integer
    InvalidInput(String),
    /// The underlying stream failed
    Io(io::Error),
}

impl PartialEq for ChannelError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::EndOfStream, Self::EndOfStream)
            | (Self::InputExhausted, Self::InputExhausted)
            | (Self::OutputExhausted, Self::OutputExhausted) => true,
            (Self::WrongKind { expected: l }, Self::WrongKind { expected: r }) => l == r,
            (Self::InvalidInput(l), Self::InvalidInput(r)) => l == r,
            (Self::Io(l), Self::Io(r)) => l.kind() == r.kind(),
            _ => false,
        }
    }
}

impl Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfStream => write!(f, "channel closed by its peer"),
            Self::InputExhausted => write!(f, "input queue is empty"),
            Self::OutputExhausted => write!(f, "output queue is empty"),
            Self::WrongKind { expected } => write!(f, "channel is not a {expected}"),
            Self::InvalidInput(line) => write!(f, "{line:?} is not a decimal integer"),
            Self::Io(e) => write!(f, "an I/O error occured: {e}"),
        }
    }
}

impl Error for ChannelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ChannelError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

#[derive(Debug, PartialEq)]
/// An error parsing a textual program image
pub enum ProgramError {
    /// The program contained no integers at all
    Empty,
    /// A comma-separated entry was not an integer
    InvalidInt {
        /// zero-based position of the entry
        index: usize,
        /// the entry, trimmed
        token: String,
        /// why it failed to parse
        source: ParseIntError,
    },
}

impl Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "program is empty"),
            Self::InvalidInt {
                index,
                token,
                source,
            } => write!(f, "entry {index} ({token:?}) is not an integer: {source}"),
        }
    }
}

impl Error for ProgramError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Empty => None,
            Self::InvalidInt { source, .. } => Some(source),
        }
    }
}

#[derive(Debug)]
/// An error reported when joining a [`Harness`](crate::harness::Harness)
pub enum HarnessError {
    /// The engine stopped with an error rather than halting
    Fault {
        /// name of the engine
        name: String,
        /// the error it stopped with
        error: VmError,
    },
    /// The engine's thread panicked
    Panicked {
        /// name of the engine
        name: String,
    },
}

impl HarnessError {
    /// Whether the engine merely saw its input close, which pipelines treat as a normal shutdown
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::Fault { error, .. } if error.is_end_of_stream())
    }
}

impl Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fault { name, error } => write!(f, "engine {name:?} stopped: {error}"),
            Self::Panicked { name } => write!(f, "engine {name:?} panicked"),
        }
    }
}

impl Error for HarnessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fault { error, .. } => Some(error),
            Self::Panicked { .. } => None,
        }
    }
}

#[derive(Debug)]
/// An error running an [amplifier](crate::amplifier) pipeline
pub enum PipelineError {
    /// An engine run on the calling thread failed
    Vm(VmError),
    /// A harnessed engine failed
    Harness(HarnessError),
    /// A harness thread could not be started
    Spawn(io::Error),
    /// The pipeline finished without producing a signal
    NoSignal,
    /// Every amplifier is waiting for input, and none has any to pass on
    Stalled,
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vm(e) => Display::fmt(e, f),
            Self::Harness(e) => Display::fmt(e, f),
            Self::Spawn(e) => write!(f, "failed to start amplifier thread: {e}"),
            Self::NoSignal => write!(f, "amplifiers produced no signal"),
            Self::Stalled => write!(f, "amplifiers are all waiting for input"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Vm(e) => Some(e),
            Self::Harness(e) => Some(e),
            Self::Spawn(e) => Some(e),
            Self::NoSignal | Self::Stalled => None,
        }
    }
}

impl From<VmError> for PipelineError {
    fn from(err: VmError) -> Self {
        Self::Vm(err)
    }
}

impl From<ChannelError> for PipelineError {
    fn from(err: ChannelError) -> Self {
        Self::Vm(VmError::Channel(err))
    }
}

impl From<HarnessError> for PipelineError {
    fn from(err: HarnessError) -> Self {
        Self::Harness(err)
    }
}

impl From<io::Error> for PipelineError {
    fn from(err: io::Error) -> Self {
        Self::Spawn(err)
    }
}
