//! prereq CLI - Command-line interface
//!
//! Commands:
//!   validate - Check a curriculum for authoring problems
//!   status   - Show subject availability for a completion set
//!   retract  - Preview the cascade caused by unmarking a subject
//!   report   - Export a progress report
//!   schema   - Print JSON schema for an input format

mod cli;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(name = "prereq", version, about = "Curriculum prerequisite tracker", long_about = None)]
struct Opts {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[clap(subcommand)]
    command: cli::Command,
}

fn main() -> ExitCode {
    let opts = Opts::parse();
    install_tracing(opts.verbose);
    tracing::debug!(?opts);

    match opts.command.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
/// `PREREQ_LOG` takes precedence over `-v`.
fn install_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("PREREQ_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
