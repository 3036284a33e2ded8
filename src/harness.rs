// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Running engines on their own threads
//!
//! A [Harness] moves an [Engine] onto a new thread and runs it to completion there. Engines
//! talk to each other through [pipes](crate::channel::pipe), so any number of harnesses can be
//! wired into a pipeline or a ring before they're started.
//!
//! When a harnessed engine stops for any reason, its output channel is closed, so that the engine
//! downstream of it sees [`ChannelError::EndOfStream`](crate::ChannelError::EndOfStream) instead
//! of waiting forever.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{info, warn};
use parking_lot::Mutex;

use crate::Engine;
use crate::error::{HarnessError, VmError};

/// What a harnessed engine is doing
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Status {
    /// Still executing, or blocked on a channel
    Running,
    /// Executed a `HALT`
    Halted,
    /// Stopped because a peer closed its end of a pipe
    Disconnected,
    /// Stopped with a fault, or its thread panicked
    Faulted,
}

impl Status {
    fn of(result: &Result<(), VmError>) -> Self {
        match result {
            Ok(()) => Self::Halted,
            Err(err) if err.is_end_of_stream() => Self::Disconnected,
            Err(_) => Self::Faulted,
        }
    }
}

/// An [Engine] running on its own thread
#[derive(Debug)]
pub struct Harness {
    name: String,
    status: Arc<Mutex<Status>>,
    handle: JoinHandle<(Engine, Result<(), VmError>)>,
}

impl Harness {
    /// Start running `engine` on a new thread, named after the engine
    pub fn spawn(mut engine: Engine) -> io::Result<Self> {
        let name = engine.name().to_owned();
        let status = Arc::new(Mutex::new(Status::Running));
        let shared = Arc::clone(&status);

        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            let result = engine.run();
            if let Err(err) = engine.close_output() {
                warn!("{} could not close its output: {err}", engine.name());
            }
            *shared.lock() = Status::of(&result);
            (engine, result)
        })?;
        info!("spawned {name}");

        Ok(Self {
            name,
            status,
            handle,
        })
    }

    /// The name of the harnessed engine
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The engine's current [Status]
    pub fn status(&self) -> Status {
        *self.status.lock()
    }

    /// Whether the engine's thread has finished
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the engine stops, then hand it back along with how it stopped.
    ///
    /// Only fails if the engine's thread panicked.
    pub fn wait(self) -> Result<(Engine, Result<(), VmError>), HarnessError> {
        match self.handle.join() {
            Ok(finished) => {
                info!("joined {}: {:?}", self.name, Status::of(&finished.1));
                Ok(finished)
            }
            Err(_) => {
                *self.status.lock() = Status::Faulted;
                Err(HarnessError::Panicked { name: self.name })
            }
        }
    }

    /// Block until the engine stops, and hand it back if it halted
    pub fn join(self) -> Result<Engine, HarnessError> {
        let name = self.name.clone();
        match self.wait()? {
            (engine, Ok(())) => Ok(engine),
            (_, Err(error)) => Err(HarnessError::Fault { name, error }),
        }
    }

    /// Stop waiting on the engine, leaving its thread to wind down on its own.
    ///
    /// The thread ends at the engine's next `IN` or `OUT` once the peers on the other ends of its
    /// pipes have been dropped.
    pub fn abandon(self) {
        if !self.handle.is_finished() {
            warn!("abandoning {} while it's still running", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{InputChannel, OutputChannel, pipe};
    use crate::ChannelError;

    #[test]
    fn halted_engine_is_returned() {
        let (tx, rx) = pipe();
        let engine = Engine::new([1101, 20, 22, 7, 4, 7, 99, 0])
            .with_name("adder")
            .with_output(OutputChannel::pipe(tx));
        let harness = Harness::spawn(engine).unwrap();
        assert_eq!(harness.name(), "adder");
        assert_eq!(rx.recv(), Ok(42));
        let engine = harness.join().unwrap();
        assert!(engine.is_halted());
        assert_eq!(engine.mem_get(7), Ok(42));
        assert!(rx.recv().is_err());
    }

    #[test]
    fn status_follows_the_engine() {
        let (tx, rx) = pipe();
        let harness = Harness::spawn(Engine::new([3, 0, 99]).with_input(InputChannel::Pipe(rx)))
            .unwrap();
        assert_eq!(harness.status(), Status::Running);
        tx.send(1).unwrap();
        let (engine, result) = harness.wait().unwrap();
        assert_eq!(result, Ok(()));
        assert_eq!(engine.mem_get(0), Ok(1));
    }

    #[test]
    fn fault_is_reported_with_the_engine_name() {
        let harness = Harness::spawn(Engine::new([42]).with_name("broken")).unwrap();
        while !harness.is_finished() {
            thread::yield_now();
        }
        assert_eq!(harness.status(), Status::Faulted);
        let Err(HarnessError::Fault { name, error }) = harness.join() else {
            panic!("fault was not reported");
        };
        assert_eq!(name, "broken");
        assert_eq!(error, VmError::IllegalOpcode { opcode: 42, ip: 0 });
    }

    #[test]
    fn closed_input_disconnects() {
        let (tx, rx) = pipe();
        let harness = Harness::spawn(Engine::new([3, 0, 99]).with_input(InputChannel::Pipe(rx)))
            .unwrap();
        drop(tx);
        let err = harness.join().unwrap_err();
        assert!(err.is_end_of_stream());
        assert!(matches!(
            err,
            HarnessError::Fault {
                error: VmError::Channel(ChannelError::EndOfStream),
                ..
            }
        ));
    }
}
