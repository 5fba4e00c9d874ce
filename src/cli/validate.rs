//! Validation CLI command

use super::util::CurriculumArgs;
use prereq::{validate, Result, Severity};

#[derive(clap::Parser, Debug)]
pub struct Validate {
    #[clap(flatten)]
    input: CurriculumArgs,
    /// Treat warnings as errors
    #[clap(long)]
    strict: bool,
    #[clap(long)]
    json: bool,
}

impl Validate {
    pub fn run(self) -> Result<()> {
        let (document, config) = self.input.document()?;
        let report = validate(document, &config)?;

        if self.json {
            let issues: Vec<_> = report
                .issues
                .iter()
                .map(|i| {
                    serde_json::json!({
                        "severity": i.severity,
                        "code": i.code,
                        "message": i.message,
                        "subject": i.subject,
                    })
                })
                .collect();
            let output = serde_json::json!({
                "valid": !report.has_errors(),
                "subjects": report.subjects_checked,
                "errors": report.error_count(),
                "warnings": report.warning_count(),
                "issues": issues,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print!("{}", report.to_report());
        }

        let failed = report.has_errors()
            || (self.strict && report.issues.iter().any(|i| i.severity == Severity::Warning));
        if failed {
            Err("Validation failed".into())
        } else {
            Ok(())
        }
    }
}
