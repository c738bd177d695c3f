use std::fs;
use std::io::{self, Read};
use std::process;

use clap::Parser;

/// Compile a small Pascal-like language to x86-64 AT&T assembly.
///
/// The generated assembly goes to standard output and diagnostics to
/// standard error; the exit code is 0 on success and 1 on any error.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
  /// Source file to compile; reads standard input when omitted.
  file: Option<String>,
}

fn read_source(args: &Args) -> io::Result<String> {
  match &args.file {
    Some(path) => fs::read_to_string(path),
    None => {
      let mut buffer = String::new();
      io::stdin().read_to_string(&mut buffer)?;
      Ok(buffer)
    }
  }
}

fn main() {
  let args = Args::parse();

  let source = match read_source(&args) {
    Ok(source) => source,
    Err(err) => {
      eprintln!("error: cannot read source: {err}");
      process::exit(1);
    }
  };

  match minipas::compile(&source) {
    Ok(asm) => print!("{asm}"),
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  }
}
