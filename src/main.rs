use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, NamedSource, Result, WrapErr};

use solar16::clock::{Pacer, DEFAULT_CLOCK_HZ};
use solar16::isa::INSTRUCTION_SIZE;
use solar16::output::Output;
use solar16::{Air, ConsolePort, RunState};

/// solar16 is an assembler and emulator for the SOLAR-16 instruction set.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble a `.asm` file into a raw binary instruction stream
    Assemble {
        /// `.asm` file to assemble
        name: PathBuf,
        /// Destination of the binary, defaults to the source name with a `.bin` extension
        dest: Option<PathBuf>,
    },
    /// Run a binary file on the emulator, or a `.asm` file directly
    Emulate {
        /// `.bin` or `.asm` file to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Print every register after the machine halts
        #[arg(short, long)]
        registers: bool,
        /// Target clock frequency in Hz, 0 to run unpaced
        #[arg(short, long)]
        clock: Option<u64>,
    },
    /// Check a `.asm` file without writing a binary
    Check {
        /// File to check
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    solar16::env::init()?;

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(solar16::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    let Some(command) = args.command else {
        println!("\n~ solar16 v{VERSION} ~");
        println!("{SHORT_INFO}");
        std::process::exit(0);
    };

    match command {
        Command::Assemble { name, dest } => {
            file_message(Green, "Assembling", &name);
            let air = assemble_file(&name)?;
            for stmt in &air {
                println!("{}", stmt.instr);
            }

            let dest = dest.unwrap_or_else(|| name.with_extension("bin"));
            fs::write(&dest, air.to_bytes())
                .into_diagnostic()
                .wrap_err_with(|| format!("Could not write `{}`", dest.display()))?;

            message(Green, "Finished", "emit binary");
            file_message(Green, "Saved", &dest);
            Ok(())
        }
        Command::Emulate {
            name,
            minimal,
            registers,
            clock,
        } => emulate(&name, minimal, registers, clock),
        Command::Check { name } => {
            file_message(Green, "Checking", &name);
            let _ = assemble_file(&name)?;
            message(Green, "Success", "no errors found!");
            Ok(())
        }
    }
}

enum MsgColor {
    Green,
    Cyan,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    if Output::is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
    };
    println!("{left:>12} {right}");
}

fn emulate(name: &Path, minimal: bool, registers: bool, clock: Option<u64>) -> Result<()> {
    Output::set_minimal(minimal);

    let code = if name.extension().is_some_and(|ext| ext == "asm") {
        file_message(MsgColor::Green, "Assembling", name);
        assemble_file(name)?.to_bytes()
    } else {
        let code = fs::read(name)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not read `{}`", name.display()))?;
        if code.len() % INSTRUCTION_SIZE != 0 {
            bail!(
                "File is not aligned to {} byte instructions ({} bytes)",
                INSTRUCTION_SIZE,
                code.len()
            )
        }
        code
    };

    if !minimal {
        println!("SOLAR-16 Emulator v{VERSION}");
        println!("\nInstruction memory:");
        println!("{}\n", hex(&code));
    }

    let hz = clock
        .or_else(solar16::env::clock_hz)
        .unwrap_or(DEFAULT_CLOCK_HZ);
    let mut state = RunState::new(code, ConsolePort);
    state.set_trace(solar16::env::is_trace_enabled());

    message(MsgColor::Green, "Running", "emitted binary");
    let result = state.run(&mut Pacer::new(hz));
    Output::Normal.start_new_line();
    result.into_diagnostic()?;

    message(MsgColor::Cyan, "Halted", "");
    if registers {
        Output::Normal.print_registers(&state);
    }
    Ok(())
}

/// Assemble a source file, rendering any error against its source.
fn assemble_file(name: &Path) -> Result<Air> {
    let src = fs::read_to_string(name)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not read `{}`", name.display()))?;
    let air = solar16::assemble(&src);
    air.map_err(|e| e.into_report(NamedSource::new(name.display().to_string(), src)))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

const SHORT_INFO: &str = r"
An all-in-one toolchain for the SOLAR-16 instruction set.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
