//! Command-line driver for the bulan compiler.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use bulan::{compile, Diagnostics, Target};
use clap::Parser;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "blnc", version, about = "Compile Bulan source to IR, fasm or HTML")]
struct Cli {
    /// Target platform: ir, fasm_x86-64_win32 or html-js. `list` prints them.
    #[arg(short = 't', value_name = "TARGET")]
    target: Option<String>,

    /// Output file. Defaults to a.s or a.html; the ir target prints to stdout.
    #[arg(short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Source file to compile.
    input: Option<PathBuf>,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("please provide a valid target. You gave {0}")]
    UnknownTarget(String),

    #[error("no input file is provided")]
    MissingInput,

    #[error("could not read input file {}: {source}", .path.display())]
    ReadInput { path: PathBuf, source: io::Error },

    #[error("could not write output {}: {source}", .path.display())]
    WriteOutput { path: PathBuf, source: io::Error },

    #[error("compilation failure")]
    Compilation,
}

fn print_targets() {
    println!("Available targets:");
    for target in Target::ALL {
        println!("    {target}");
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let target = match cli.target.as_deref() {
        None => Target::default(),
        Some("list") => {
            print_targets();
            return Ok(());
        }
        Some(name) => Target::from_name(name).ok_or_else(|| CliError::UnknownTarget(name.to_string()))?,
    };

    let input = cli.input.ok_or(CliError::MissingInput)?;
    let source = fs::read(&input).map_err(|source| CliError::ReadInput {
        path: input.clone(),
        source,
    })?;

    let path = input.display().to_string();
    let compiled = compile(&path, &source, target);
    if let Err(err) = &compiled.result {
        Diagnostics::stderr().report(err);
    }

    // Partial output is written even when compilation failed.
    let output = cli.output.or_else(|| target.default_output().map(PathBuf::from));
    match output {
        Some(path) => {
            fs::write(&path, &compiled.output).map_err(|source| CliError::WriteOutput { path, source })?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(compiled.output.as_bytes())
                .map_err(|source| CliError::WriteOutput {
                    path: PathBuf::from("<stdout>"),
                    source,
                })?;
        }
    }

    compiled.result.map(|_| ()).map_err(|_| CliError::Compilation)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err}");
            ExitCode::FAILURE
        }
    }
}
