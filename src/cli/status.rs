//! Status CLI command

use super::util::{session_with, CurriculumArgs};
use prereq::{Result, SubjectState, SubjectStatus};

#[derive(clap::Parser, Debug)]
pub struct Status {
    #[clap(flatten)]
    input: CurriculumArgs,
    /// Completed subject (repeatable)
    #[clap(long = "done", value_name = "NAME")]
    done: Vec<String>,
    /// Only show this semester
    #[clap(long)]
    semester: Option<u32>,
    #[clap(long)]
    json: bool,
}

impl Status {
    pub fn run(self) -> Result<()> {
        let curriculum = self.input.load()?;
        let (session, rejected) = session_with(curriculum.clone(), &self.done);

        let semesters: Vec<u32> = match self.semester {
            Some(n) => vec![n],
            None => curriculum.semesters().collect(),
        };
        let mut listing: Vec<(u32, Vec<SubjectState>)> = Vec::new();
        for number in semesters {
            let states = session
                .semester_states(number)
                .ok_or_else(|| format!("Unknown semester: {}", number))?;
            listing.push((number, states));
        }

        let progress = session.progress();
        if self.json {
            let semesters: Vec<_> = listing
                .iter()
                .map(|(number, states)| {
                    serde_json::json!({
                        "number": number,
                        "label": curriculum.semester_label(*number),
                        "subjects": states,
                    })
                })
                .collect();
            let output = serde_json::json!({
                "progress": progress,
                "rejected": rejected,
                "semesters": semesters,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        for (number, states) in &listing {
            match curriculum.semester_label(*number) {
                Some(label) => println!("Semester {} ({})", number, label),
                None => println!("Semester {}", number),
            }
            for state in states {
                let mark = match state.status {
                    SubjectStatus::Completed => "✓",
                    SubjectStatus::Available => "○",
                    SubjectStatus::Locked => "✗",
                };
                match &state.blocker {
                    Some(blocker) => println!("  {} {}  ({})", mark, state.name, blocker),
                    None => println!("  {} {}", mark, state.name),
                }
            }
            println!();
        }

        for name in &rejected {
            println!("⚠ Not marked: {}", name);
        }
        println!(
            "Progress: {}/{} ({}%)",
            progress.completed,
            progress.total,
            progress.rounded_percentage()
        );
        Ok(())
    }
}
