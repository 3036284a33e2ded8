//! Test engines wired together through pipes, each on its own thread.
// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use std::io::Cursor;

use intcode_vm::amplifier::{self, Mode};
use intcode_vm::error::{HarnessError, PipelineError};
use intcode_vm::harness::Status;
use intcode_vm::prelude::*;
use itertools::Itertools;

const FEEDBACK_EXAMPLES: [(&str, [i64; 5], i64); 2] = [
    (
        "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5",
        [9, 8, 7, 6, 5],
        139629729,
    ),
    (
        "3,52,1001,52,-5,52,3,53,1,52,56,54,1007,54,5,55,1005,55,26,1001,54,-5,54,1105,1,12,1,53,\
         54,53,1008,54,0,55,1001,55,1,55,2,53,55,53,4,53,1001,56,-1,56,1005,56,6,99,0,0,0,0,10",
        [9, 7, 8, 5, 6],
        18216,
    ),
];

/// Reads two values and echoes each one back
const ECHO_TWICE: [i64; 9] = [3, 0, 4, 0, 3, 0, 4, 0, 99];

#[test]
fn consumer_sees_producer_halt() {
    let (producer_out, consumer_in) = pipe();
    let (consumer_out, results) = pipe();

    let producer = Engine::new([104, 7, 99])
        .with_name("producer")
        .with_output(OutputChannel::pipe(producer_out));
    let consumer = Engine::new(ECHO_TWICE)
        .with_name("consumer")
        .with_input(InputChannel::Pipe(consumer_in))
        .with_output(OutputChannel::pipe(consumer_out));

    let consumer = Harness::spawn(consumer).unwrap();
    let producer = Harness::spawn(producer).unwrap();

    assert!(producer.join().unwrap().is_halted());
    let (engine, result) = consumer.wait().unwrap();
    assert_eq!(result, Err(VmError::Channel(ChannelError::EndOfStream)));
    assert!(!engine.is_poisoned());
    // stopped on the second IN, with nothing lost
    assert_eq!(engine.instruction_pointer(), 4);
    assert_eq!(results.iter().collect_vec(), vec![7]);
}

#[test]
fn consumer_sees_producer_fault() {
    let (producer_out, consumer_in) = pipe();
    let producer = Engine::new([104, 1, 104, 2, 42])
        .with_name("faulty")
        .with_output(OutputChannel::pipe(producer_out));
    let consumer = Engine::new(ECHO_TWICE)
        .with_name("consumer")
        .with_input(InputChannel::Pipe(consumer_in));

    let producer = Harness::spawn(producer).unwrap();
    let consumer = Harness::spawn(consumer).unwrap();

    // the consumer reads both values, then halts normally
    let mut consumer = consumer.join().unwrap();
    assert_eq!(consumer.take_outputs(), Ok(vec![1, 2]));

    let Err(HarnessError::Fault { name, error }) = producer.join() else {
        panic!("fault was not reported");
    };
    assert_eq!(name, "faulty");
    assert!(error.is_fault());
}

#[test]
fn consumer_blocked_on_faulted_producer_wakes() {
    let (producer_out, consumer_in) = pipe();
    let producer = Engine::new([104, 1, 4, -1])
        .with_name("faulty")
        .with_output(OutputChannel::pipe(producer_out));
    let consumer = Engine::new(ECHO_TWICE)
        .with_name("consumer")
        .with_input(InputChannel::Pipe(consumer_in));

    let consumer = Harness::spawn(consumer).unwrap();
    let producer = Harness::spawn(producer).unwrap();

    let producer_err = producer.join().unwrap_err();
    assert!(!producer_err.is_end_of_stream());
    let consumer_err = consumer.join().unwrap_err();
    assert!(consumer_err.is_end_of_stream());
}

#[test]
fn feedback_matches_sequential() {
    for (code, phases, expected) in FEEDBACK_EXAMPLES {
        let program = Program::parse(code).unwrap();
        let threaded = amplifier::run_feedback_loop(&program, &phases).unwrap();
        let sequential = amplifier::run_feedback_loop_sequential(&program, &phases).unwrap();
        assert_eq!(threaded, expected);
        assert_eq!(sequential, expected);
    }

    // and for every other ordering of the phase settings
    let program = Program::parse(FEEDBACK_EXAMPLES[1].0).unwrap();
    for phases in (5..=9).permutations(5).step_by(7) {
        assert_eq!(
            amplifier::run_feedback_loop(&program, &phases).unwrap(),
            amplifier::run_feedback_loop_sequential(&program, &phases).unwrap(),
            "phases {phases:?}"
        );
    }
}

#[test]
fn best_feedback_signal() {
    let (code, phases, expected) = FEEDBACK_EXAMPLES[0];
    let program = Program::parse(code).unwrap();
    let (best, best_phases) = amplifier::best_signal(&program, Mode::Feedback).unwrap();
    assert_eq!(best, expected);
    assert_eq!(amplifier::run_feedback_loop(&program, &best_phases).unwrap(), best);
    assert_eq!(amplifier::run_feedback_loop(&program, &phases).unwrap(), best);
}

#[test]
fn chain_examples() {
    let examples = [
        (
            "3,23,3,24,1002,24,10,24,1002,23,-1,23,101,5,23,23,1,24,23,23,4,23,99,0,0",
            [0, 1, 2, 3, 4],
            54321,
        ),
        (
            "3,31,3,32,1002,32,10,32,1001,31,-2,31,1007,31,0,33,1002,33,7,33,1,33,31,31,1,32,31,31,\
             4,31,99,0,0,0",
            [1, 0, 4, 3, 2],
            65210,
        ),
    ];
    for (code, phases, expected) in examples {
        let program = Program::parse(code).unwrap();
        assert_eq!(amplifier::run_chain(&program, &phases).unwrap(), expected);
        assert_eq!(amplifier::best_signal(&program, Mode::Chain).unwrap().0, expected);
    }
}

#[test]
fn ring_fault_is_reported() {
    let program = Program::parse("3,0,104,1,4,-1").unwrap();
    let Err(PipelineError::Harness(HarnessError::Fault { error, .. })) =
        amplifier::run_feedback_loop(&program, &[5, 6, 7, 8, 9])
    else {
        panic!("fault was not reported");
    };
    assert_eq!(error, VmError::AddressFault { address: -1 });
}

#[test]
fn single_faulty_amplifier_is_reported() {
    // phase 7 jumps to an illegal opcode at 20, every other phase echoes signals forever
    const FIRMWARE: &str = "3,100,1008,100,7,101,1005,101,20,3,102,4,102,1105,1,9,99,0,0,0,42";
    let program = Program::parse(FIRMWARE).unwrap();
    let Err(PipelineError::Harness(HarnessError::Fault { name, error })) =
        amplifier::run_feedback_loop(&program, &[5, 6, 7, 8, 9])
    else {
        panic!("fault was not reported");
    };
    assert_eq!(name, "amplifier 2");
    assert_eq!(error, VmError::IllegalOpcode { opcode: 42, ip: 20 });
}

/// An external driver, standing in for a robot or arcade cabinet, talking to a harnessed engine
#[test]
fn external_driver() {
    // reads a value, outputs it doubled and then tripled, until the input closes
    let program = Program::parse("3,20,1002,20,2,21,4,21,1002,20,3,21,4,21,1105,1,0").unwrap();
    let (to_engine, engine_in) = pipe();
    let (engine_out, from_engine) = pipe();
    let harness = Harness::spawn(
        program
            .load()
            .with_name("controller")
            .with_input(InputChannel::Pipe(engine_in))
            .with_output(OutputChannel::pipe(engine_out)),
    )
    .unwrap();

    for sensor in [1, -4, 1 << 40] {
        to_engine.send(sensor).unwrap();
        assert_eq!(from_engine.recv(), Ok(sensor * 2));
        assert_eq!(from_engine.recv(), Ok(sensor * 3));
    }
    assert_eq!(harness.status(), Status::Running);

    drop(to_engine);
    let (engine, result) = harness.wait().unwrap();
    assert!(result.unwrap_err().is_end_of_stream());
    assert_eq!(engine.instruction_pointer(), 0);
    assert!(from_engine.recv().is_err());
}

#[test]
fn abandoned_harness_stops_once_released() {
    let (to_engine, engine_in) = pipe();
    let harness = Harness::spawn(
        Engine::new([3, 0, 1105, 1, 0]).with_input(InputChannel::Pipe(engine_in)),
    )
    .unwrap();
    to_engine.send(1).unwrap();
    harness.abandon();
    // the thread exits on its next IN once this is gone
    drop(to_engine);
}

#[test]
fn stream_channels() {
    let input = Cursor::new("8\n7\n");
    let engine = Engine::new([3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8])
        .with_input(InputChannel::stream(input))
        .with_output(OutputChannel::queue());
    let mut engine = Harness::spawn(engine).unwrap().join().unwrap();
    assert_eq!(engine.dequeue_output(), Ok(1));
    assert_eq!(engine.dequeue_output(), Err(ChannelError::OutputExhausted));
    // the second line was never read
    assert!(engine.drain_input().is_empty());
}
