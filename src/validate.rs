//! Load-time curriculum checks
//!
//! The catalog is hand-authored, so loading looks for the mistakes that
//! would otherwise surface as subjects that can never unlock. Errors reject
//! the load; warnings are kept on the [`Curriculum`] and logged.
//!
//! | Code | Severity | Meaning |
//! |------|----------|---------|
//! | E001 | error | prerequisite matches several distinct subjects |
//! | E002 | error | record semester disagrees with its semester key |
//! | E003 | error | empty subject name |
//! | E004 | error | patch targets an unknown subject |
//! | W001 | warning | prerequisite matches no subject |
//! | W002 | warning | subject name listed more than once |
//! | W003 | warning | subject sits on a prerequisite cycle |
//! | W004 | warning | cohort-gated subject inside the cohort semesters |
//! | W005 | warning | prerequisite offered in the same or a later semester |

use crate::config::EngineConfig;
use crate::curriculum::{Curriculum, CurriculumDocument, Subject};
use crate::error::Result;
use crate::normalize::{normalize, NameMatcher};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Severity level for validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A problem found in a curriculum
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl Issue {
    pub fn error(code: &str, message: &str, subject: Option<&str>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            message: message.to_string(),
            subject: subject.map(str::to_string),
        }
    }

    pub fn warning(code: &str, message: &str, subject: Option<&str>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            message: message.to_string(),
            subject: subject.map(str::to_string),
        }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Result of validating a curriculum document
#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
    pub subjects_checked: usize,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn to_report(&self) -> String {
        let mut out = String::new();
        if self.issues.is_empty() {
            out.push_str(&format!(
                "✓ Curriculum is valid ({} subjects)\n",
                self.subjects_checked
            ));
            return out;
        }

        for issue in &self.issues {
            let prefix = match issue.severity {
                Severity::Error => "✗",
                Severity::Warning => "⚠",
            };
            out.push_str(&format!("{} {}\n", prefix, issue));
        }
        out.push_str(&format!(
            "\n{} error(s), {} warning(s) in {} subjects\n",
            self.error_count(),
            self.warning_count(),
            self.subjects_checked
        ));
        out
    }
}

/// Check `document` under `config` without rejecting it
pub fn validate(document: CurriculumDocument, config: &EngineConfig) -> Result<ValidationReport> {
    let (curriculum, issues) = Curriculum::assemble(document, config)?;
    Ok(ValidationReport {
        issues,
        subjects_checked: curriculum.len(),
    })
}

/// Checks that need the parsed subjects
pub(crate) fn check_subjects(
    subjects: &[Subject],
    matcher: &NameMatcher,
    cohort_through: u32,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for subject in subjects {
        if subject.name.trim().is_empty() {
            issues.push(Issue::error(
                "E003",
                &format!("Empty subject name in semester {}", subject.semester),
                None,
            ));
            continue;
        }
        *counts.entry(normalize(&subject.name)).or_default() += 1;
    }
    let mut reported = BTreeSet::new();
    for subject in subjects {
        let key = normalize(&subject.name);
        if counts.get(&key).copied().unwrap_or(0) > 1 && reported.insert(key) {
            issues.push(Issue::warning(
                "W002",
                &format!(
                    "\"{}\" is listed more than once; completing it completes every entry",
                    subject.name
                ),
                Some(&subject.name),
            ));
        }
    }

    for subject in subjects {
        if subject.is_cohort_gated() && subject.semester <= cohort_through {
            issues.push(Issue::warning(
                "W004",
                &format!(
                    "\"{}\" is cohort-gated but belongs to semester {}, inside the cohort it waits for",
                    subject.name, subject.semester
                ),
                Some(&subject.name),
            ));
        }

        for descriptor in subject.named_prerequisites() {
            let targets: Vec<&Subject> = subjects
                .iter()
                .filter(|t| matcher.matches(descriptor, &t.name))
                .collect();
            let distinct: BTreeSet<String> = targets.iter().map(|t| normalize(&t.name)).collect();

            match distinct.len() {
                0 => issues.push(Issue::warning(
                    "W001",
                    &format!(
                        "Prerequisite \"{}\" of \"{}\" matches no subject",
                        descriptor, subject.name
                    ),
                    Some(&subject.name),
                )),
                1 => {
                    let earlier = targets
                        .iter()
                        .any(|t| t.id != subject.id && t.semester < subject.semester);
                    let only_self = targets.iter().all(|t| t.id == subject.id);
                    if !earlier && !only_self {
                        issues.push(Issue::warning(
                            "W005",
                            &format!(
                                "Prerequisite \"{}\" of \"{}\" is not offered before semester {}",
                                descriptor, subject.name, subject.semester
                            ),
                            Some(&subject.name),
                        ));
                    }
                }
                _ => issues.push(Issue::error(
                    "E001",
                    &format!(
                        "Prerequisite \"{}\" of \"{}\" is ambiguous: matches {}",
                        descriptor,
                        subject.name,
                        distinct.into_iter().collect::<Vec<_>>().join(", ")
                    ),
                    Some(&subject.name),
                )),
            }
        }
    }

    for subject in subjects {
        if on_cycle(subject, subjects, matcher) {
            issues.push(Issue::warning(
                "W003",
                &format!(
                    "\"{}\" depends on itself through its prerequisites and can never unlock",
                    subject.name
                ),
                Some(&subject.name),
            ));
        }
    }

    issues
}

/// Is `start` reachable from its own named prerequisites?
fn on_cycle(start: &Subject, subjects: &[Subject], matcher: &NameMatcher) -> bool {
    let mut visited = vec![false; subjects.len()];
    let mut stack = vec![start];
    while let Some(current) = stack.pop() {
        for descriptor in current.named_prerequisites() {
            for target in subjects.iter().filter(|t| matcher.matches(descriptor, &t.name)) {
                if target.id == start.id {
                    return true;
                }
                if !visited[target.id.index()] {
                    visited[target.id.index()] = true;
                    stack.push(target);
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::SubjectRecord;

    fn codes(report: &ValidationReport) -> Vec<&str> {
        report.issues.iter().map(|i| i.code.as_str()).collect()
    }

    #[test]
    fn test_clean_curriculum() {
        let doc = CurriculumDocument::new()
            .subject(1, "A", &[])
            .subject(2, "B", &["A"]);
        let report = validate(doc, &EngineConfig::default()).unwrap();
        assert!(report.issues.is_empty(), "{:?}", report.issues);
        assert_eq!(report.subjects_checked, 2);
        assert!(report.to_report().contains("valid"));
    }

    #[test]
    fn test_unresolved_prerequisite_is_a_warning() {
        let doc = CurriculumDocument::new()
            .subject(6, "Práctica Pre Profesional", &["créditos mínimos aprobados"]);
        let report = validate(doc, &EngineConfig::default()).unwrap();
        assert_eq!(codes(&report), vec!["W001"]);
        assert!(!report.has_errors());
        assert!(report.has_warnings());
    }

    #[test]
    fn test_cycle_is_reported_for_each_member() {
        let doc = CurriculumDocument::new()
            .subject(1, "A", &["B"])
            .subject(2, "B", &["A"])
            .subject(3, "C", &["B"]);
        let report = validate(doc, &EngineConfig::default()).unwrap();
        let cycles: Vec<_> = report
            .issues
            .iter()
            .filter(|i| i.code == "W003")
            .filter_map(|i| i.subject.as_deref())
            .collect();
        assert_eq!(cycles, vec!["A", "B"]);
    }

    #[test]
    fn test_same_semester_prerequisite() {
        let doc = CurriculumDocument::new()
            .subject(4, "Sistemas Operativos", &[])
            .subject(4, "Redes de Computadores", &["Sistemas Operativos"]);
        let report = validate(doc, &EngineConfig::default()).unwrap();
        assert_eq!(codes(&report), vec!["W005"]);
    }

    #[test]
    fn test_self_locking_gated_subject() {
        let doc = CurriculumDocument::new().subject(2, "Emprendimiento", &[]);
        let report = validate(doc, &EngineConfig::default()).unwrap();
        assert_eq!(codes(&report), vec!["W004"]);
    }

    #[test]
    fn test_errors_are_collected_not_raised() {
        let doc = CurriculumDocument::new()
            .record(
                1,
                SubjectRecord {
                    semester: Some(2),
                    ..SubjectRecord::new("A", &[])
                },
            )
            .subject(1, " ", &[]);
        let report = validate(doc, &EngineConfig::default()).unwrap();
        assert_eq!(report.error_count(), 2);
        assert!(codes(&report).contains(&"E002"));
        assert!(codes(&report).contains(&"E003"));
    }
}
