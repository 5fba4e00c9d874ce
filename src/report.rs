//! Progress report export
//!
//! A read-only projection of a session: overall progress, a per-semester
//! summary, and every completed subject with its prerequisites and current
//! eligibility.

use crate::normalize::names_equal;
use crate::session::CurriculumSession;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Snapshot of a learner's progress
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curriculum: Option<String>,
    pub fingerprint: String,
    pub total: usize,
    pub completed: usize,
    /// Whole percent, rounded
    pub percentage: u32,
    pub semesters: Vec<SemesterSummary>,
    pub subjects: Vec<ReportEntry>,
}

/// Completion count for one semester
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemesterSummary {
    pub number: u32,
    pub completed: usize,
    pub total: usize,
}

/// One completed subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub name: String,
    pub semester: u32,
    pub prerequisites: Vec<String>,
    pub available: bool,
}

impl Report {
    pub fn build(session: &CurriculumSession) -> Self {
        let curriculum = session.curriculum();
        let progress = session.progress();

        let semesters = curriculum
            .semesters()
            .map(|number| {
                let (completed, total) = curriculum
                    .semester(number)
                    .map(|subjects| {
                        subjects.fold((0, 0), |(done, all), s| {
                            let done = done + usize::from(session.completed().contains(&s.name));
                            (done, all + 1)
                        })
                    })
                    .unwrap_or_default();
                SemesterSummary {
                    number,
                    completed,
                    total,
                }
            })
            .collect();

        // Catalog order; duplicate entries of one name are reported once.
        let mut subjects: Vec<ReportEntry> = Vec::new();
        for subject in curriculum.subjects() {
            if !session.completed().contains(&subject.name)
                || subjects.iter().any(|e| names_equal(&e.name, &subject.name))
            {
                continue;
            }
            subjects.push(ReportEntry {
                name: subject.name.clone(),
                semester: subject.semester,
                prerequisites: subject.descriptors().into_iter().map(str::to_string).collect(),
                available: session.is_available(&subject.name).unwrap_or(false),
            });
        }

        Self {
            generated_at: Utc::now(),
            curriculum: curriculum.name().map(str::to_string),
            fingerprint: curriculum.fingerprint().to_string(),
            total: progress.total,
            completed: progress.completed,
            percentage: progress.rounded_percentage(),
            semesters,
            subjects,
        }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let title = self.curriculum.as_deref().unwrap_or("Curriculum progress");
        out.push_str(&format!("{}\n", title));
        out.push_str(&format!(
            "Generated {} (catalog {})\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC"),
            self.fingerprint
        ));

        out.push_str("Summary:\n");
        out.push_str(&format!("  Total subjects: {}\n", self.total));
        out.push_str(&format!("  Completed: {}\n", self.completed));
        out.push_str(&format!("  Percentage: {}%\n\n", self.percentage));

        out.push_str("Semesters:\n");
        for semester in &self.semesters {
            out.push_str(&format!(
                "  {:>2}: {}/{}\n",
                semester.number, semester.completed, semester.total
            ));
        }

        out.push_str("\nCompleted subjects:\n");
        if self.subjects.is_empty() {
            out.push_str("  (none)\n");
        }
        for (i, entry) in self.subjects.iter().enumerate() {
            let prerequisites = if entry.prerequisites.is_empty() {
                "none".to_string()
            } else {
                entry.prerequisites.join(", ")
            };
            out.push_str(&format!(
                "  {}. {} | Prerequisites: {} | Available: {}\n",
                i + 1,
                entry.name,
                prerequisites,
                if entry.available { "yes" } else { "no" }
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::curriculum::{Curriculum, CurriculumDocument};
    use std::sync::Arc;

    fn session() -> CurriculumSession {
        let doc = CurriculumDocument {
            name: Some("Toy plan".into()),
            ..CurriculumDocument::new()
                .subject(1, "A", &[])
                .subject(2, "B", &["A"])
                .subject(2, "B2", &[])
                .subject(3, "C", &["B"])
        };
        let curriculum = Curriculum::new(doc, &EngineConfig::default()).unwrap();
        CurriculumSession::new(Arc::new(curriculum))
    }

    #[test]
    fn test_report_counts() {
        let mut s = session();
        s.mark_completed("A");
        s.mark_completed("B");
        let report = Report::build(&s);
        assert_eq!(report.total, 4);
        assert_eq!(report.completed, 2);
        assert_eq!(report.percentage, 50);
        assert_eq!(
            report.semesters,
            vec![
                SemesterSummary { number: 1, completed: 1, total: 1 },
                SemesterSummary { number: 2, completed: 1, total: 2 },
                SemesterSummary { number: 3, completed: 0, total: 1 },
            ]
        );
        assert_eq!(
            report.subjects.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );
        assert!(report.subjects.iter().all(|e| e.available));
        assert_eq!(report.subjects[1].prerequisites, vec!["A"]);
    }

    #[test]
    fn test_text_report() {
        let mut s = session();
        s.mark_completed("A");
        let text = Report::build(&s).to_text();
        assert!(text.starts_with("Toy plan\n"));
        assert!(text.contains("Completed: 1"));
        assert!(text.contains("Percentage: 25%"));
        assert!(text.contains("1. A | Prerequisites: none | Available: yes"));
    }

    #[test]
    fn test_empty_report() {
        let text = Report::build(&session()).to_text();
        assert!(text.contains("(none)"));
    }

    #[test]
    fn test_json_report() {
        let mut s = session();
        s.mark_completed("A");
        let json: serde_json::Value =
            serde_json::from_str(&Report::build(&s).to_json().unwrap()).unwrap();
        assert_eq!(json["completed"], 1);
        assert_eq!(json["curriculum"], "Toy plan");
        assert_eq!(json["subjects"][0]["name"], "A");
    }
}
