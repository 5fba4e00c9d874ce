//! Report export CLI command

use super::util::{session_with, write_output, CurriculumArgs};
use prereq::{Report, Result};
use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
pub struct ReportCmd {
    #[clap(flatten)]
    input: CurriculumArgs,
    /// Completed subject (repeatable)
    #[clap(long = "done", value_name = "NAME")]
    done: Vec<String>,
    #[clap(long)]
    json: bool,
    /// Output file (default: stdout)
    #[clap(short, long)]
    output: Option<PathBuf>,
}

impl ReportCmd {
    pub fn run(self) -> Result<()> {
        let curriculum = self.input.load()?;
        let (session, _) = session_with(curriculum, &self.done);
        let report = Report::build(&session);

        let content = if self.json {
            report.to_json()?
        } else {
            report.to_text()
        };
        write_output(&self.output, &content)
    }
}
