use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use intcode::bytecode::disassemble;
use intcode::drivers::{encode, Transcript};
use intcode::{parse_program, Config, Fault, InputPolicy, Machine, Status, Word};

/// Number of executed instructions shown when a program is malformed.
const HISTORY_TAIL: usize = 16;

#[derive(Parser, Debug)]
#[command(name = "intcode", version, about = "Runs an Intcode program")]
struct Args {
  /// File holding the comma-separated program
  program: PathBuf,

  /// Input values, comma-separated or repeated
  #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
  input: Vec<Word>,

  /// A line of text to send as character codes, after any numeric input. May be repeated
  #[arg(short, long)]
  ascii: Vec<String>,

  /// Stop at the first read past the end of the input and print the last output value
  #[arg(long)]
  latch: bool,

  /// Print the machine state when the program stops
  #[arg(long)]
  dump: bool,

  /// Print the program as assembly instead of running it
  #[arg(long)]
  disassemble: bool,

  /// Do not record the instruction history
  #[arg(long)]
  no_history: bool,
}

fn main() -> Result<()> {
  env_logger::init();
  let args = Args::parse();

  let source  = fs::read_to_string(&args.program)
                  .with_context(|| format!("cannot read {}", args.program.display()))?;
  let program = parse_program(&source)
                  .with_context(|| format!("cannot parse {}", args.program.display()))?;
  info!("loaded {} words from {}", program.len(), args.program.display());

  if args.disassemble {
    for line in disassemble(&program) {
      println!("{}", line);
    }
    return Ok(());
  }

  let config = Config {
    policy         : if args.latch { InputPolicy::Latch } else { InputPolicy::Block },
    record_history : !args.no_history,
  };

  let mut input = args.input.clone();
  for command in &args.ascii {
    input.extend(encode(command));
  }

  let mut machine = Machine::with_config(program, input, config);
  let result      = machine.run();

  if args.dump {
    eprintln!("{}", machine);
  }

  match result {

    Ok(Status::Halted)  => {
      let output = machine.drain_output();
      match args.ascii.is_empty() {
        true  => output.iter().for_each(|value| println!("{}", value)),
        false => print!("{}", Transcript::decode(Status::Halted, &output)),
      }
      if args.latch {
        match machine.recovered() {
          Some(value) => println!("{}", value),
          None        => eprintln!("the program halted without reading past its input"),
        }
      }
      Ok(())
    }

    Ok(Status::Blocked) => {
      Err::<(), Fault>(Fault::InputExhausted{ pc: machine.pc() })
        .context("the program wants more input than was given")
    }

    Err(fault)          => {
      if let Some(error) = fault.decode_error() {
        eprintln!("{}", error.history.tail_table(HISTORY_TAIL));
      }
      Err(fault.into())
    }

  }
}
