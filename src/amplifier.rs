// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Amplifier pipelines, as described in [Day 7]
//!
//! Each amplifier is an engine running the same firmware. It first reads its phase setting, then
//! an input signal, and outputs an amplified signal for the next amplifier. In a [chain], the
//! last amplifier's output is the result. In a [feedback loop], the last amplifier feeds the first
//! one, and signals go around until every amplifier halts.
//!
//! [Day 7]: https://adventofcode.com/2019/day/7
//! [chain]: run_chain
//! [feedback loop]: run_feedback_loop

use std::mem;
use std::ops::RangeInclusive;

use itertools::Itertools;
use log::{debug, info};

use crate::Engine;
use crate::channel::{InputChannel, OutputChannel, pipe};
use crate::error::{HarnessError, PipelineError};
use crate::harness::Harness;
use crate::program::Program;

/// Number of amplifiers in the standard setup
pub const AMPLIFIERS: usize = 5;

/// How the amplifiers are connected
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mode {
    /// Each amplifier feeds the next, and the last one's output is the result
    Chain,
    /// The last amplifier feeds back into the first, and each amplifier runs on its own thread
    Feedback,
}

impl Mode {
    /// The phase settings the amplifiers accept in this mode
    pub fn phase_settings(self) -> RangeInclusive<i64> {
        match self {
            Self::Chain => 0..=4,
            Self::Feedback => 5..=9,
        }
    }

    /// Run the amplifiers with the given `phases`, returning the final signal
    pub fn run(self, program: &Program, phases: &[i64]) -> Result<i64, PipelineError> {
        match self {
            Self::Chain => run_chain(program, phases),
            Self::Feedback => run_feedback_loop(program, phases),
        }
    }
}

fn amplifier(program: &Program, index: usize) -> Engine {
    program.load().with_name(format!("amplifier {index}"))
}

/// Run one amplifier per phase setting in series, starting from a signal of `0`
pub fn run_chain(program: &Program, phases: &[i64]) -> Result<i64, PipelineError> {
    let mut signal = 0;
    for (index, &phase) in phases.iter().enumerate() {
        let (outputs, _) = amplifier(program, index).run_through_inputs([phase, signal])?;
        signal = *outputs.last().ok_or(PipelineError::NoSignal)?;
        debug!("amplifier {index} (phase {phase}) output {signal}");
    }
    Ok(signal)
}

/// Run one amplifier per phase setting, each on its own thread, wired into a ring.
///
/// Every pipe is primed with its amplifier's phase setting before anything starts, and the first
/// amplifier also gets the initial signal of `0`. Once every amplifier has halted, the result is
/// the last signal the final amplifier sent back around to the first.
///
/// If any amplifier faults, that fault is reported rather than the closed pipes it leaves behind
/// for the others.
pub fn run_feedback_loop(program: &Program, phases: &[i64]) -> Result<i64, PipelineError> {
    let (senders, receivers): (Vec<_>, Vec<_>) = phases.iter().map(|_| pipe()).unzip();
    let mut outputs: Vec<OutputChannel> = senders.into_iter().map(OutputChannel::pipe).collect();

    for (output, &phase) in outputs.iter_mut().zip(phases) {
        output.send(phase)?;
    }
    outputs.first_mut().ok_or(PipelineError::NoSignal)?.send(0)?;
    // amplifier i reads pipe i and writes pipe i + 1
    outputs.rotate_left(1);

    let harnesses = receivers
        .into_iter()
        .zip(outputs)
        .enumerate()
        .map(|(index, (input, output))| {
            Harness::spawn(
                amplifier(program, index)
                    .with_input(InputChannel::Pipe(input))
                    .with_output(output),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    // join everything before reporting, so no thread outlives the call. A fault anywhere in the
    // ring closes it, and every other amplifier then stops at its next IN with EndOfStream, so
    // those are only reported when nothing else went wrong.
    let mut first = None;
    let mut failure = None;
    let mut disconnected = None;
    for (index, harness) in harnesses.into_iter().enumerate() {
        let name = harness.name().to_owned();
        match harness.wait() {
            Ok((engine, result)) => {
                if let Err(error) = result {
                    let err = HarnessError::Fault { name, error };
                    if err.is_end_of_stream() {
                        debug!("{err}");
                        disconnected.get_or_insert(err);
                    } else {
                        failure.get_or_insert(err);
                    }
                }
                if index == 0 {
                    first = Some(engine);
                }
            }
            Err(err) => {
                failure.get_or_insert(err);
            }
        }
    }
    if let Some(err) = failure {
        return Err(err.into());
    }

    let signal = match first.and_then(|mut engine| engine.drain_input().last().copied()) {
        Some(signal) => signal,
        None => return Err(disconnected.map_or(PipelineError::NoSignal, PipelineError::from)),
    };
    info!("feedback loop with phases {phases:?} produced {signal}");
    Ok(signal)
}

/// The same ring as [run_feedback_loop], but run round-robin on the calling thread
pub fn run_feedback_loop_sequential(
    program: &Program,
    phases: &[i64],
) -> Result<i64, PipelineError> {
    let mut amplifiers = phases
        .iter()
        .enumerate()
        .map(|(index, &phase)| {
            let mut amp = amplifier(program, index);
            amp.enqueue_input(phase).map(|()| amp)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut signals = vec![0];
    let mut latest = None;
    loop {
        for amp in &mut amplifiers {
            let (outputs, _) = amp.run_through_inputs(mem::take(&mut signals))?;
            signals = outputs;
        }
        if let Some(&signal) = signals.last() {
            latest = Some(signal);
        }
        if amplifiers.iter().all(Engine::is_halted) {
            return latest.ok_or(PipelineError::NoSignal);
        }
        if signals.is_empty() {
            return Err(PipelineError::Stalled);
        }
    }
}

/// Try every permutation of the phase settings for `mode`, returning the highest signal along
/// with the phases that produced it
pub fn best_signal(program: &Program, mode: Mode) -> Result<(i64, Vec<i64>), PipelineError> {
    let best = itertools::process_results(
        mode.phase_settings()
            .permutations(AMPLIFIERS)
            .map(|phases| mode.run(program, &phases).map(|signal| (signal, phases))),
        |results| results.max_by_key(|&(signal, _)| signal),
    )?;
    best.ok_or(PipelineError::NoSignal)
}
