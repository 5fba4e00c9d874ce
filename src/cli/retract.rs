//! Retraction preview CLI command

use super::util::{session_with, CurriculumArgs};
use prereq::{Result, UnmarkOutcome};

#[derive(clap::Parser, Debug)]
pub struct Retract {
    #[clap(flatten)]
    input: CurriculumArgs,
    /// Completed subject (repeatable)
    #[clap(long = "done", value_name = "NAME")]
    done: Vec<String>,
    /// Subject to unmark
    #[clap(long)]
    subject: String,
    #[clap(long)]
    json: bool,
}

impl Retract {
    pub fn run(self) -> Result<()> {
        let curriculum = self.input.load()?;
        let (mut session, _) = session_with(curriculum, &self.done);

        let retraction = match session.mark_incomplete(&self.subject) {
            UnmarkOutcome::Unmarked(retraction) => retraction,
            UnmarkOutcome::NotCompleted => {
                return Err(format!("'{}' is not completed", self.subject).into())
            }
            UnmarkOutcome::NotFound => {
                return Err(format!("Unknown subject: {}", self.subject).into())
            }
        };

        if self.json {
            let output = serde_json::json!({
                "unmarked": self.subject,
                "removed": retraction.removed,
                "rounds": retraction.rounds,
                "remaining": session.completed().names(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("Unmarked: {}", self.subject);
        if retraction.is_empty() {
            println!("No other subject was affected.");
        } else {
            println!("Also removed ({} round(s)):", retraction.rounds);
            for removal in &retraction.removed {
                println!("  - {} [{}, round {}]", removal.name, removal.rule, removal.round);
            }
        }
        println!("Still completed: {}", session.completed().len());
        Ok(())
    }
}
