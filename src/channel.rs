// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! The channels that `IN` and `OUT` instructions move data through
//!
//! Each engine has exactly one [`InputChannel`] and one [`OutputChannel`], chosen when it's
//! constructed. Both come in three kinds:
//!
//! * a **queue**, an in-process FIFO that the owner of the engine fills or drains directly
//! * a **stream**, a text endpoint holding one decimal integer per line (usually stdin/stdout)
//! * a **pipe**, one end of a [`pipe()`] shared with another engine running on another thread

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvError, Sender, TryRecvError};

use log::debug;

use crate::error::ChannelError;

/// Create a connected pair of pipe endpoints
///
/// Values sent on the [`Sender`] arrive at the [`Receiver`] in the order they were sent. Once the
/// sender is dropped, the receiver still yields every pending value, and then reports
/// [`ChannelError::EndOfStream`].
pub fn pipe() -> (Sender<i64>, Receiver<i64>) {
    mpsc::channel()
}

/// Where an engine's `IN` instructions read from
pub enum InputChannel {
    /// Values supplied up front, or with [`Engine::enqueue_input`](crate::Engine::enqueue_input)
    Queue(VecDeque<i64>),
    /// One decimal integer per line
    Stream(Box<dyn BufRead + Send>),
    /// The receiving end of a [`pipe()`]
    Pipe(Receiver<i64>),
}

/// Where an engine's `OUT` instructions write to
pub enum OutputChannel {
    /// Values held until taken with [`Engine::dequeue_output`](crate::Engine::dequeue_output)
    Queue(VecDeque<i64>),
    /// One decimal integer per line
    Stream(Box<dyn Write + Send>),
    /// The sending end of a [`pipe()`], or [`None`] once closed
    Pipe(Option<Sender<i64>>),
}

impl InputChannel {
    /// A queue holding `values`, to be read front to back
    pub fn queue(values: impl IntoIterator<Item = i64>) -> Self {
        Self::Queue(values.into_iter().collect())
    }

    /// Read lines from the process's standard input
    pub fn stdin() -> Self {
        Self::Stream(Box::new(io::BufReader::new(io::stdin())))
    }

    /// Read lines from `reader`
    pub fn stream(reader: impl BufRead + Send + 'static) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// Receive the next value, blocking on a pipe until one is available
    pub fn receive(&mut self) -> Result<i64, ChannelError> {
        match self {
            Self::Queue(queue) => queue.pop_front().ok_or(ChannelError::InputExhausted),
            Self::Stream(reader) => {
                let mut line = String::new();
                if reader.read_line(&mut line)? == 0 {
                    return Err(ChannelError::EndOfStream);
                }
                let line = line.trim();
                line.parse()
                    .map_err(|_| ChannelError::InvalidInput(line.to_owned()))
            }
            Self::Pipe(receiver) => receiver.recv().map_err(|RecvError| {
                debug!("pipe closed by its sender");
                ChannelError::EndOfStream
            }),
        }
    }

    /// Take every value that can be received without blocking
    pub fn drain(&mut self) -> Vec<i64> {
        match self {
            Self::Queue(queue) => queue.drain(..).collect(),
            Self::Stream(_) => Vec::new(),
            Self::Pipe(receiver) => {
                let mut pending = Vec::new();
                loop {
                    match receiver.try_recv() {
                        Ok(value) => pending.push(value),
                        Err(TryRecvError::Empty | TryRecvError::Disconnected) => break pending,
                    }
                }
            }
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Queue(_) => "queue",
            Self::Stream(_) => "stream",
            Self::Pipe(_) => "pipe",
        }
    }
}

impl OutputChannel {
    /// An empty queue
    pub fn queue() -> Self {
        Self::Queue(VecDeque::new())
    }

    /// Write lines to the process's standard output
    pub fn stdout() -> Self {
        Self::Stream(Box::new(io::stdout()))
    }

    /// Write lines to `writer`
    pub fn stream(writer: impl Write + Send + 'static) -> Self {
        Self::Stream(Box::new(writer))
    }

    /// Wrap the sending end of a [`pipe()`]
    pub fn pipe(sender: Sender<i64>) -> Self {
        Self::Pipe(Some(sender))
    }

    /// Send `value`
    ///
    /// A pipe whose receiver is gone, or that has been [closed](Self::close), reports
    /// [`ChannelError::EndOfStream`].
    pub fn send(&mut self, value: i64) -> Result<(), ChannelError> {
        match self {
            Self::Queue(queue) => {
                queue.push_back(value);
                Ok(())
            }
            Self::Stream(writer) => {
                writeln!(writer, "{value}")?;
                writer.flush()?;
                Ok(())
            }
            Self::Pipe(Some(sender)) => sender.send(value).map_err(|_| {
                debug!("pipe closed by its receiver");
                ChannelError::EndOfStream
            }),
            Self::Pipe(None) => Err(ChannelError::EndOfStream),
        }
    }

    /// Release the channel, so that a peer blocked on the other end of a pipe wakes up
    pub fn close(&mut self) -> Result<(), ChannelError> {
        match self {
            Self::Queue(_) => Ok(()),
            Self::Stream(writer) => Ok(writer.flush()?),
            Self::Pipe(sender) => {
                if sender.take().is_some() {
                    debug!("closed pipe");
                }
                Ok(())
            }
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Queue(_) => "queue",
            Self::Stream(_) => "stream",
            Self::Pipe(_) => "pipe",
        }
    }
}

impl Default for InputChannel {
    fn default() -> Self {
        Self::Queue(VecDeque::new())
    }
}

impl Default for OutputChannel {
    fn default() -> Self {
        Self::queue()
    }
}

impl fmt::Debug for InputChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queue(queue) => f.debug_tuple("Queue").field(queue).finish(),
            Self::Stream(_) => f.write_str("Stream"),
            Self::Pipe(_) => f.write_str("Pipe"),
        }
    }
}

impl fmt::Debug for OutputChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queue(queue) => f.debug_tuple("Queue").field(queue).finish(),
            Self::Stream(_) => f.write_str("Stream"),
            Self::Pipe(sender) => f
                .debug_tuple("Pipe")
                .field(&if sender.is_some() { "open" } else { "closed" })
                .finish(),
        }
    }
}
