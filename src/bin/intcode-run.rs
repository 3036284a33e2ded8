// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Run an Intcode program, either interactively on stdin/stdout, with queued inputs, or as
//! amplifier firmware

use std::error::Error;
use std::fs::read_to_string;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use intcode_vm::amplifier::{self, Mode};
use intcode_vm::prelude::*;
use log::info;

const VERSION: &str = concat!(env!("CARGO_CRATE_NAME"), '-', env!("CARGO_PKG_VERSION"));
const INPUT_HELP: &str = "Comma-separated values to queue up as input\n\
    Outputs are printed as a list once the program stops. \
    Without this, input is read from stdin one integer per line, \
    and each output is printed as soon as it's produced.";

#[derive(PartialEq, Clone, Copy, ValueEnum)]
enum AmplifierMode {
    /// amplifiers in series, with phase settings 0 through 4
    Chain,
    /// amplifiers in a feedback loop, with phase settings 5 through 9
    Feedback,
}

impl From<AmplifierMode> for Mode {
    fn from(mode: AmplifierMode) -> Self {
        match mode {
            AmplifierMode::Chain => Mode::Chain,
            AmplifierMode::Feedback => Mode::Feedback,
        }
    }
}

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = VERSION)]
#[command(about = "Intcode runner", long_about = None)]
struct Args {
    #[arg(help = "File containing the comma-separated intcode")]
    source: PathBuf,
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    #[arg(help = INPUT_HELP.split_once('\n').unwrap().0)]
    #[arg(long_help = INPUT_HELP)]
    input: Option<Vec<i64>>,
    #[arg(short, long, conflicts_with = "input")]
    #[arg(help = "Treat the program as amplifier firmware, and find the best signal")]
    amplify: Option<AmplifierMode>,
    #[arg(short, long)]
    #[arg(help = "Print each executed instruction to stderr once the program stops")]
    trace: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let program = Program::parse(&read_to_string(&args.source)?)?;
    info!("loaded {} ints from {}", program.len(), args.source.display());

    if let Some(mode) = args.amplify {
        let (signal, phases) = amplifier::best_signal(&program, mode.into())?;
        println!("best signal: {signal} (phases {phases:?})");
        return Ok(());
    }

    let mut engine = program.load().with_name(args.source.display().to_string());
    if args.input.is_none() {
        engine = engine
            .with_input(InputChannel::stdin())
            .with_output(OutputChannel::stdout());
    }
    if args.trace {
        engine.start_trace();
    }

    let result = match args.input {
        Some(inputs) => engine.run_through_inputs(inputs).map(|(outputs, state)| {
            println!("{outputs:?}");
            if state == State::Awaiting {
                eprintln!("program is still waiting for input");
            }
        }),
        None => engine.run(),
    };

    if let Some(trace) = engine.end_trace() {
        eprint!("{trace}");
    }
    Ok(result?)
}
