//! CLI tool to run, check, and inspect Lin programs.
//!
//! Set `LIN_LOG` (e.g. `LIN_LOG=lin_rs=debug`) to see diagnostics on
//! stderr.

use std::fs;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lin_rs::{
    DEFAULT_MAX_CALL_DEPTH, Interpreter, RuntimeConfig, parse_str, print, run_with,
    standard_environment, tokenize,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lin")]
#[command(about = "Run and inspect Lin programs", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Maximum nesting of command calls before a run is aborted
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_depth: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Execute program(s)
    Run { files: Vec<String> },
    /// Check program(s) for syntax errors without running them
    Check { files: Vec<String> },
    /// Print the syntax tree of program(s)
    Ast { files: Vec<String> },
    /// Print the token stream of program(s)
    Tokens { files: Vec<String> },
}

impl Command {
    fn files(&self) -> &[String] {
        match self {
            Self::Run { files }
            | Self::Check { files }
            | Self::Ast { files }
            | Self::Tokens { files } => files,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let files = cli.command.files();
    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let config = RuntimeConfig {
        max_call_depth: cli.max_depth,
    };
    let mut had_error = false;

    for path in files {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{path}: {e}");
                had_error = true;
                continue;
            }
        };

        let result = match &cli.command {
            Command::Run { .. } => {
                let mut interpreter = Interpreter::new(standard_environment()).with_config(config);
                run_with(&mut interpreter, &content)
            }
            Command::Check { .. } => parse_str(&content).map(|program| {
                eprintln!("{path}: valid ({} statement(s))", program.len());
            }),
            Command::Ast { .. } => parse_str(&content).map(|program| {
                print!("{}", print(&program));
            }),
            Command::Tokens { .. } => tokenize(&content).map_err(lin_rs::Error::from).map(|tokens| {
                for token in tokens {
                    println!("{token}");
                }
            }),
        };

        if let Err(e) = result {
            report(path, &e);
            had_error = true;
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Print every line of a (possibly multi-error) report prefixed by the file.
fn report(path: &str, error: &lin_rs::Error) {
    for line in error.to_string().lines() {
        eprintln!("{path}: {line}");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LIN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
