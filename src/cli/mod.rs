//! CLI command implementations
//!
//! One module per subcommand:
//! - `validate`: authoring checks over a curriculum file
//! - `status`: availability of every subject for a completion set
//! - `retract`: cascade preview for unmarking one subject
//! - `report`: progress report export
//! - `schema`: JSON schema for the input formats
//! - `util`: loading and output helpers shared by the commands

mod report;
mod retract;
mod schema;
mod status;
mod util;
mod validate;

use clap::Subcommand;
use prereq::Result;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a curriculum for authoring problems
    Validate(validate::Validate),
    /// Show subject availability for a completion set
    Status(status::Status),
    /// Preview the cascade caused by unmarking a subject
    Retract(retract::Retract),
    /// Export a progress report
    Report(report::ReportCmd),
    /// Print JSON schema for an input format
    Schema(schema::Schema),
}

impl Command {
    pub fn run(self) -> Result<()> {
        match self {
            Command::Validate(cmd) => cmd.run(),
            Command::Status(cmd) => cmd.run(),
            Command::Retract(cmd) => cmd.run(),
            Command::Report(cmd) => cmd.run(),
            Command::Schema(cmd) => cmd.run(),
        }
    }
}
