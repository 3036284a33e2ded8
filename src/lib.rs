// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD
#![warn(missing_docs)]

//! An Intcode virtual machine, with pluggable I/O channels and threaded pipelines
//!
//! The [Engine] implements all of the [Opcodes] and [Parameter Modes] defined in the completed
//! Intcode computer for [Day 9], on top of a sparse, growable [Memory](mmu::Memory).
//!
//! # Example
//!
//! ```rust
//! use intcode_vm::prelude::*;
//! let mut engine = Engine::new(vec![104, 1024, 99]);
//!
//! assert_eq!(
//!     engine.run_through_inputs(empty()).unwrap(),
//!     (vec![1024], State::Halted)
//! );
//! ```
//!
//! `IN` and `OUT` go through the engine's [channels](channel). By default both are queues, but
//! either side can instead be a text stream or one end of a [`pipe`](channel::pipe). Engines
//! joined by pipes can each be run on their own thread with a [Harness](harness::Harness):
//!
//! ```rust
//! use intcode_vm::prelude::*;
//!
//! // each engine reads one value, doubles it, and passes it on
//! let (to_first, first_in) = pipe();
//! let (first_out, second_in) = pipe();
//! let (second_out, results) = pipe();
//!
//! let first = Engine::new([3, 0, 1002, 0, 2, 0, 4, 0, 99])
//!     .with_input(InputChannel::Pipe(first_in))
//!     .with_output(OutputChannel::pipe(first_out));
//! let second = Engine::new([3, 0, 1002, 0, 2, 0, 4, 0, 99])
//!     .with_input(InputChannel::Pipe(second_in))
//!     .with_output(OutputChannel::pipe(second_out));
//!
//! let harnesses = [Harness::spawn(first).unwrap(), Harness::spawn(second).unwrap()];
//! to_first.send(5).unwrap();
//! assert_eq!(results.recv().unwrap(), 20);
//! for harness in harnesses {
//!     harness.join().unwrap();
//! }
//! // both engines halted, so the pipe is closed
//! assert!(results.recv().is_err());
//! ```
//!
//! [Opcodes]: https://esolangs.org/wiki/Intcode#Opcodes
//! [Parameter Modes]: https://esolangs.org/wiki/Intcode#Parameter_Modes
//! [Day 9]: https://adventofcode.com/2019/day/9

/// A module providing a sort of logical memory management unit, using a hashmap to split memory
/// into pages, which are each contiguous in memory.
pub mod mmu;

pub mod amplifier;
pub mod channel;
pub mod decode;
pub mod error;
pub mod harness;
mod internals;
pub mod program;
pub mod trace;

use std::fmt;

use log::{debug, warn};

use channel::{InputChannel, OutputChannel};
pub use decode::{Instruction, OpCode, ParamMode};
pub use error::{ChannelError, VmError};
use mmu::Memory;
use trace::{Trace, TracedInstr};

/// A small module that re-exports items needed when working with the Intcode engine
pub mod prelude {
    pub use crate::channel::{InputChannel, OutputChannel, pipe};
    pub use crate::error::{ChannelError, VmError};
    pub use crate::harness::Harness;
    pub use crate::program::Program;
    pub use crate::{Engine, State};
    pub use std::iter::empty;
}

/// The state of an engine after it stops executing instructions
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
    /// There are more instructions to execute
    Running,
    /// The next instruction is an `IN`, but the input queue is empty. Supplying more input and
    /// running again resumes from that instruction.
    Awaiting,
    /// A `HALT` instruction has been executed. Once it's been returned, no more instructions will
    /// be executed.
    Halted,
}

/// An Intcode engine
///
/// Owns its memory, instruction pointer, relative base and its two channels. The channels are
/// chosen when the engine is built, and can't be swapped once it exists.
pub struct Engine {
    name: String,
    ip: i64,
    rel_base: i64,
    halted: bool,
    poisoned: bool,
    memory: Memory,
    input: InputChannel,
    output: OutputChannel,
    trace: Option<Trace>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Engine")
            .field("name", &self.name)
            .field("ip", &self.ip)
            .field("rbo", &self.rel_base)
            .field("halted", &self.halted)
            .field("poisoned", &self.poisoned)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("memory", &self.memory)
            .finish()
    }
}

impl Engine {
    /// Create a new engine, with queues for both input and output. Collects `code` into the
    /// starting memory state.
    pub fn new(code: impl IntoIterator<Item = i64>) -> Self {
        Self {
            name: String::from("intcode"),
            ip: 0,
            rel_base: 0,
            halted: false,
            poisoned: false,
            memory: code.into_iter().collect(),
            input: InputChannel::default(),
            output: OutputChannel::default(),
            trace: None,
        }
    }

    /// Name the engine, for logs and error reports
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Read input from `input`
    #[must_use]
    pub fn with_input(mut self, input: InputChannel) -> Self {
        self.input = input;
        self
    }

    /// Write output to `output`
    #[must_use]
    pub fn with_output(mut self, output: OutputChannel) -> Self {
        self.output = output;
        self
    }

    /// The engine's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address of the next instruction to execute
    pub fn instruction_pointer(&self) -> i64 {
        self.ip
    }

    /// Current value of the relative base register
    pub fn relative_base(&self) -> i64 {
        self.rel_base
    }

    /// Whether a `HALT` instruction has been executed
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Whether the engine has faulted
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// The engine's memory
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Get the memory at `address`
    #[doc(alias = "peek")]
    pub fn mem_get(&self, address: i64) -> Result<i64, VmError> {
        self.memory.peek(address)
    }

    /// Manually set a memory location
    #[doc(alias("poke", "write"))]
    pub fn mem_override(&mut self, address: i64, value: i64) -> Result<(), VmError> {
        self.memory.store(address, value)
    }

    /// Add `value` to the back of the input queue
    pub fn enqueue_input(&mut self, value: i64) -> Result<(), ChannelError> {
        match &mut self.input {
            InputChannel::Queue(queue) => {
                queue.push_back(value);
                Ok(())
            }
            _ => Err(ChannelError::WrongKind { expected: "queue" }),
        }
    }

    /// Take the oldest value from the output queue
    pub fn dequeue_output(&mut self) -> Result<i64, ChannelError> {
        match &mut self.output {
            OutputChannel::Queue(queue) => queue.pop_front().ok_or(ChannelError::OutputExhausted),
            _ => Err(ChannelError::WrongKind { expected: "queue" }),
        }
    }

    /// Take everything in the output queue, oldest first
    pub fn take_outputs(&mut self) -> Result<Vec<i64>, ChannelError> {
        match &mut self.output {
            OutputChannel::Queue(queue) => Ok(queue.drain(..).collect()),
            _ => Err(ChannelError::WrongKind { expected: "queue" }),
        }
    }

    /// Take every input value that's pending and can be received without blocking
    pub fn drain_input(&mut self) -> Vec<i64> {
        self.input.drain()
    }

    /// Release the output channel. A peer blocked reading the other end of an output pipe will see
    /// the end of the stream once it has read everything already sent.
    pub fn close_output(&mut self) -> Result<(), ChannelError> {
        self.output.close()
    }

    /// Execute exactly one instruction
    ///
    /// Returns [`State::Running`] if there is more to do, or [`State::Halted`] once the engine
    /// has halted. Any fault poisons the engine, after which this returns [`VmError::Poisoned`].
    pub fn step(&mut self) -> Result<State, VmError> {
        if self.poisoned {
            return Err(VmError::Poisoned);
        }
        if self.halted {
            return Ok(State::Halted);
        }
        let result = self.exec_instruction();
        match &result {
            Ok(State::Halted) => debug!("{} halted", self.name),
            Err(err) if err.is_fault() => {
                warn!("{} faulted at {}: {err}", self.name, self.ip);
                self.poisoned = true;
                // peers must not wait on an engine that will never send again
                if let Err(close_err) = self.output.close() {
                    warn!("{} could not close its output: {close_err}", self.name);
                }
            }
            _ => (),
        }
        result
    }

    /// Execute until the engine halts, or an error occurs
    ///
    /// An `IN` from an empty input queue is an error here
    /// ([`ChannelError::InputExhausted`]); see [`Engine::run_until_blocked`] to treat it as a
    /// pause instead.
    pub fn run(&mut self) -> Result<(), VmError> {
        debug!(
            "{} running with {} input and {} output",
            self.name,
            self.input.kind(),
            self.output.kind()
        );
        while self.step()? != State::Halted {}
        Ok(())
    }

    /// Execute until either the program halts, or it tries to read from an empty input queue.
    pub fn run_until_blocked(&mut self) -> Result<State, VmError> {
        match self.run() {
            Ok(()) => Ok(State::Halted),
            Err(VmError::Channel(ChannelError::InputExhausted)) => Ok(State::Awaiting),
            Err(e) => Err(e),
        }
    }

    /// Queue up `inputs`, then execute until either the program halts, or it tries to read
    /// nonexistent input.
    ///
    /// Returns `Ok((v, s))`, where `v` is a [`Vec<i64>`] containing all outputs that are in the
    /// output queue, and `s` is the [`State`] at the time it stopped.
    pub fn run_through_inputs(
        &mut self,
        inputs: impl IntoIterator<Item = i64>,
    ) -> Result<(Vec<i64>, State), VmError> {
        for input in inputs {
            self.enqueue_input(input)?;
        }
        let state = self.run_until_blocked()?;
        Ok((self.take_outputs()?, state))
    }
}
