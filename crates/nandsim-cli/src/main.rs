//! CLI entry point for the cpu3bit binary.

use std::env;
use std::ffi::OsString;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use nandsim_cli::driver::{drive, DriveConfig, DriveMode, FrameFormat, DEFAULT_INTERVAL};
use nandsim_cli::errors::CliError;
use nandsim_cli::image::load_image;
use nandsim_cli::render::INSTRUCTION_TABLE;
use nandsim_core::{disassemble_image, Computer, MemoryImage};
#[cfg(test)]
use rstest as _;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE_TEXT: &str = "\
Usage: cpu3bit <command> [options]

Commands:
  run [image]     Build the CPU from an image and drive its clock
  disasm [image]  List the image with disassembly
  isa             Print the instruction set table

Options:
  --ticks <n>          Stop after n ticks (run only)
  --interval-ms <ms>   Automatic tick interval (default: 1000)
  -m, --manual         Tick on `t` from stdin instead of a timer; `q` quits
  --json               Print one JSON snapshot per frame
  -v, --verbose        Log at debug level (RUST_LOG overrides)
  -h, --help           Show this help message

Without an image path the built-in sample program is used.

Examples:
  cpu3bit run
  cpu3bit run program.txt --manual
  cpu3bit run program.txt --ticks 11 --interval-ms 0 --json
  cpu3bit disasm program.txt
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run(RunArgs),
    Disasm(DisasmArgs),
    Isa,
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    image: Option<PathBuf>,
    ticks: Option<u64>,
    interval: Duration,
    manual: bool,
    json: bool,
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct DisasmArgs {
    image: Option<PathBuf>,
    verbose: bool,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "run" => parse_run_args(args)
            .map(Command::Run)
            .map(ParseResult::Command),
        "disasm" => parse_disasm_args(args)
            .map(Command::Disasm)
            .map(ParseResult::Command),
        "isa" => Ok(ParseResult::Command(Command::Isa)),
        other => Err(format!("unknown command: {other}")),
    }
}

fn parse_number<T: std::str::FromStr>(
    flag: &str,
    value: Option<OsString>,
) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("missing value for {flag}"))?;
    value
        .to_string_lossy()
        .parse()
        .map_err(|_| format!("invalid value for {flag}: {}", value.to_string_lossy()))
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut image: Option<PathBuf> = None;
    let mut ticks: Option<u64> = None;
    let mut interval = DEFAULT_INTERVAL;
    let mut manual = false;
    let mut json = false;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--manual" || arg == "-m" {
            manual = true;
            continue;
        }

        if arg == "--json" {
            json = true;
            continue;
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg == "--ticks" {
            ticks = Some(parse_number("--ticks", args.next())?);
            continue;
        }

        if arg == "--interval-ms" {
            interval = Duration::from_millis(parse_number("--interval-ms", args.next())?);
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if image.is_some() {
            return Err("multiple image paths provided".to_string());
        }
        image = Some(PathBuf::from(arg));
    }

    Ok(RunArgs {
        image,
        ticks,
        interval,
        manual,
        json,
        verbose,
    })
}

fn parse_disasm_args(args: impl Iterator<Item = OsString>) -> Result<DisasmArgs, String> {
    let mut image: Option<PathBuf> = None;
    let mut verbose = false;

    for arg in args {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if image.is_some() {
            return Err("multiple image paths provided".to_string());
        }
        image = Some(PathBuf::from(arg));
    }

    Ok(DisasmArgs { image, verbose })
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_image(path: Option<&Path>) -> Result<MemoryImage, CliError> {
    match path {
        Some(path) => {
            let image = load_image(path)?;
            info!(path = %path.display(), "image loaded");
            Ok(image)
        }
        None => Ok(MemoryImage::sample()),
    }
}

fn run_drive(args: &RunArgs) -> Result<(), CliError> {
    let image = read_image(args.image.as_deref())?;
    let mut cpu = Computer::new(&image)?;

    let config = DriveConfig {
        mode: if args.manual {
            DriveMode::Manual
        } else {
            DriveMode::Auto {
                interval: args.interval,
            }
        },
        max_ticks: args.ticks,
        format: if args.json {
            FrameFormat::Json
        } else {
            FrameFormat::Panel
        },
    };

    let input = BufReader::new(io::stdin());
    let mut output = io::stdout().lock();
    let outcome = drive(&mut cpu, &config, input, &mut output)?;
    info!(ticks = outcome.ticks, reason = ?outcome.reason, "run finished");
    Ok(())
}

fn run_disasm(args: &DisasmArgs) -> Result<(), CliError> {
    let image = read_image(args.image.as_deref())?;
    for row in disassemble_image(&image) {
        println!("{}: {}  {:02X}  {}", row.address, row.bits, row.word, row.text);
    }
    Ok(())
}

fn report(error: &CliError, image: Option<&Path>) -> i32 {
    match (error, image) {
        (CliError::Load(_), Some(path)) => eprintln!("{}: error: {error}", path.display()),
        _ => eprintln!("error: {error}"),
    }
    error.exit_code()
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(Command::Run(args))) => {
            init_logging(args.verbose);
            match run_drive(&args) {
                Ok(()) => 0,
                Err(error) => report(&error, args.image.as_deref()),
            }
        }
        Ok(ParseResult::Command(Command::Disasm(args))) => {
            init_logging(args.verbose);
            match run_disasm(&args) {
                Ok(()) => 0,
                Err(error) => report(&error, args.image.as_deref()),
            }
        }
        Ok(ParseResult::Command(Command::Isa)) => {
            print!("{INSTRUCTION_TABLE}");
            0
        }
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn os(args: &[&str]) -> impl Iterator<Item = OsString> {
        args.iter().map(OsString::from).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_run_command() {
        let result = parse_run_args(os(&[
            "prog.txt",
            "--ticks",
            "11",
            "--interval-ms",
            "0",
            "--json",
            "-v",
        ]))
        .expect("valid run args should parse");

        assert_eq!(
            result,
            RunArgs {
                image: Some(PathBuf::from("prog.txt")),
                ticks: Some(11),
                interval: Duration::ZERO,
                manual: false,
                json: true,
                verbose: true,
            }
        );
    }

    #[test]
    fn run_defaults_to_sample_and_one_second_interval() {
        let result = parse_run_args(std::iter::empty()).expect("no args is valid");
        assert_eq!(result.image, None);
        assert_eq!(result.interval, DEFAULT_INTERVAL);
        assert!(!result.manual);
    }

    #[test]
    fn parses_manual_flag() {
        let result = parse_run_args(os(&["-m"])).expect("manual parses");
        assert!(result.manual);
    }

    #[test]
    fn parses_disasm_command() {
        let result = parse_args(os(&["disasm", "prog.txt"])).expect("disasm parses");
        assert!(matches!(
            result,
            ParseResult::Command(Command::Disasm(DisasmArgs { image: Some(_), verbose: false }))
        ));
    }

    #[test]
    fn parses_help_flag() {
        let result = parse_args(os(&["--help"])).expect("help should parse without error");
        assert!(matches!(result, ParseResult::Help));
    }

    #[test]
    fn rejects_unknown_command() {
        let error = parse_args(os(&["unknown"])).expect_err("unknown command should fail parse");
        assert!(error.contains("unknown command"));
    }

    #[test]
    fn rejects_bad_tick_count() {
        let error = parse_run_args(os(&["--ticks", "many"])).expect_err("not a number");
        assert!(error.contains("invalid value for --ticks"));
    }

    #[test]
    fn rejects_missing_interval_value() {
        let error = parse_run_args(os(&["--interval-ms"])).expect_err("missing value");
        assert!(error.contains("missing value for --interval-ms"));
    }

    #[test]
    fn rejects_second_image() {
        let error = parse_disasm_args(os(&["a.txt", "b.txt"])).expect_err("two images");
        assert!(error.contains("multiple image paths"));
    }
}
