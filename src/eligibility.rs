//! Eligibility evaluation
//!
//! Decides whether a subject can be taken given a completion set. Rules run
//! in a fixed order and stop at the first failure:
//!
//! 1. **Cohort gate**: [`Category::CohortGated`] subjects need every subject
//!    of semesters `1..=cohort_through` completed.
//! 2. **Meta-prerequisite**: a subject carrying the "all previous semesters"
//!    token needs every subject of every earlier semester completed.
//! 3. **Named prerequisites**: each remaining descriptor must match a
//!    completed subject under the curriculum's [`NameMatcher`].
//!
//! Granting and cascade retraction share this evaluator.
//!
//! [`Category::CohortGated`]: crate::curriculum::Category::CohortGated
//! [`NameMatcher`]: crate::normalize::NameMatcher

use crate::completion::CompletionSet;
use crate::curriculum::{Curriculum, Subject};
use crate::normalize::normalize;
use serde::Serialize;
use std::collections::BTreeSet;

/// Why a subject is locked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Blocker {
    /// Cohort gate: semesters `1..=through` are not all completed
    CohortIncomplete { through: u32, missing: Vec<String> },
    /// Meta-prerequisite: semesters before `before` are not all completed
    PreviousSemestersIncomplete { before: u32, missing: Vec<String> },
    /// Named prerequisites without a completed match
    MissingPrerequisites { missing: Vec<String> },
}

impl std::fmt::Display for Blocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Blocker::CohortIncomplete { through, missing } => write!(
                f,
                "requires semesters 1-{} completed (missing: {})",
                through,
                missing.join(", ")
            ),
            Blocker::PreviousSemestersIncomplete { before, missing } => write!(
                f,
                "requires every semester before {} completed (missing: {})",
                before,
                missing.join(", ")
            ),
            Blocker::MissingPrerequisites { missing } => {
                write!(f, "missing prerequisites: {}", missing.join(", "))
            }
        }
    }
}

/// Outcome of an eligibility check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Availability {
    Available,
    Locked { blocker: Blocker },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    pub fn blocker(&self) -> Option<&Blocker> {
        match self {
            Availability::Available => None,
            Availability::Locked { blocker } => Some(blocker),
        }
    }
}

/// Evaluates eligibility against one curriculum
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    curriculum: &'a Curriculum,
}

impl<'a> Evaluator<'a> {
    pub fn new(curriculum: &'a Curriculum) -> Self {
        Self { curriculum }
    }

    /// Can `subject` be taken given `completed`?
    pub fn is_available(&self, subject: &Subject, completed: &CompletionSet) -> bool {
        if subject.is_cohort_gated() && !self.cohort_complete(completed) {
            return false;
        }
        if subject.requires_all_previous() && !self.previous_complete(subject.semester, completed)
        {
            return false;
        }
        self.named_prerequisites_met(subject, completed)
    }

    /// Like [`is_available`](Self::is_available), reporting the failing rule
    pub fn check(&self, subject: &Subject, completed: &CompletionSet) -> Availability {
        let through = self.curriculum.cohort_through();
        if subject.is_cohort_gated() && !self.cohort_complete(completed) {
            let missing = missing_names(self.curriculum.subjects_through(through), completed);
            return Availability::Locked {
                blocker: Blocker::CohortIncomplete { through, missing },
            };
        }

        if subject.requires_all_previous() && !self.previous_complete(subject.semester, completed)
        {
            let missing =
                missing_names(self.curriculum.subjects_before(subject.semester), completed);
            return Availability::Locked {
                blocker: Blocker::PreviousSemestersIncomplete {
                    before: subject.semester,
                    missing,
                },
            };
        }

        let missing: Vec<String> = subject
            .named_prerequisites()
            .filter(|d| !self.prerequisite_met(d, completed))
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            Availability::Available
        } else {
            Availability::Locked {
                blocker: Blocker::MissingPrerequisites { missing },
            }
        }
    }

    /// Availability of the completion identity `name`.
    ///
    /// A name listed in several semesters is available only if every entry
    /// is. `None` if no subject carries the name.
    pub fn check_name(&self, name: &str, completed: &CompletionSet) -> Option<Availability> {
        let mut found = false;
        for subject in self.curriculum.entries(name) {
            found = true;
            let availability = self.check(subject, completed);
            if !availability.is_available() {
                return Some(availability);
            }
        }
        found.then_some(Availability::Available)
    }

    pub fn is_name_available(&self, name: &str, completed: &CompletionSet) -> Option<bool> {
        let mut entries = self.curriculum.entries(name).peekable();
        entries.peek()?;
        Some(entries.all(|s| self.is_available(s, completed)))
    }

    /// Is every subject of semesters `1..=cohort_through` completed?
    pub fn cohort_complete(&self, completed: &CompletionSet) -> bool {
        self.curriculum
            .subjects_through(self.curriculum.cohort_through())
            .all(|s| completed.contains(&s.name))
    }

    /// Is every subject offered before `semester` completed?
    pub fn previous_complete(&self, semester: u32, completed: &CompletionSet) -> bool {
        self.curriculum
            .subjects_before(semester)
            .all(|s| completed.contains(&s.name))
    }

    /// Does `descriptor` match some completed subject?
    pub fn prerequisite_met(&self, descriptor: &str, completed: &CompletionSet) -> bool {
        let matcher = self.curriculum.matcher();
        completed.iter().any(|done| matcher.matches(descriptor, done))
    }

    /// Are all non-meta prerequisites of `subject` met?
    pub fn named_prerequisites_met(&self, subject: &Subject, completed: &CompletionSet) -> bool {
        subject
            .named_prerequisites()
            .all(|d| self.prerequisite_met(d, completed))
    }
}

fn missing_names<'s>(
    subjects: impl Iterator<Item = &'s Subject>,
    completed: &CompletionSet,
) -> Vec<String> {
    let mut seen = BTreeSet::new();
    subjects
        .filter(|s| !completed.contains(&s.name))
        .filter(|s| seen.insert(normalize(&s.name)))
        .map(|s| s.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::curriculum::CurriculumDocument;
    use crate::normalize::MatchPolicy;

    fn toy() -> Curriculum {
        let doc = CurriculumDocument::new()
            .subject(1, "A", &[])
            .subject(2, "B", &["A"])
            .subject(3, "C", &["B"])
            .subject(4, "D", &["all previous semesters"])
            .subject(5, "Professional Elective E", &[]);
        Curriculum::new(doc, &EngineConfig::default()).unwrap()
    }

    fn set(names: &[&str]) -> CompletionSet {
        names.iter().copied().collect()
    }

    #[test]
    fn test_no_prerequisites_is_available() {
        let curriculum = toy();
        let eval = Evaluator::new(&curriculum);
        let a = curriculum.find("A").unwrap();
        assert!(eval.is_available(a, &CompletionSet::new()));
        assert_eq!(eval.check(a, &CompletionSet::new()), Availability::Available);
    }

    #[test]
    fn test_named_prerequisites() {
        let curriculum = toy();
        let eval = Evaluator::new(&curriculum);
        let b = curriculum.find("B").unwrap();
        let c = curriculum.find("C").unwrap();
        assert!(!eval.is_available(b, &set(&[])));
        assert!(eval.is_available(b, &set(&["a"])));
        assert!(!eval.is_available(c, &set(&["A"])));
        assert_eq!(
            eval.check(c, &set(&["A"])),
            Availability::Locked {
                blocker: Blocker::MissingPrerequisites {
                    missing: vec!["B".into()]
                }
            }
        );
    }

    #[test]
    fn test_cohort_gate() {
        let curriculum = toy();
        let eval = Evaluator::new(&curriculum);
        let e = curriculum.find("Professional Elective E").unwrap();
        assert!(e.is_cohort_gated());
        assert!(!eval.is_available(e, &set(&["A", "B"])));
        assert_eq!(
            eval.check(e, &set(&["A", "B"])).blocker(),
            Some(&Blocker::CohortIncomplete {
                through: 3,
                missing: vec!["C".into()]
            })
        );
        assert!(eval.is_available(e, &set(&["A", "B", "C"])));
    }

    #[test]
    fn test_meta_prerequisite() {
        let curriculum = toy();
        let eval = Evaluator::new(&curriculum);
        let d = curriculum.find("D").unwrap();
        assert!(d.requires_all_previous());
        assert_eq!(d.named_prerequisites().count(), 0);
        assert!(!eval.is_available(d, &set(&["A", "C"])));
        assert_eq!(
            eval.check(d, &set(&["A", "C"])).blocker(),
            Some(&Blocker::PreviousSemestersIncomplete {
                before: 4,
                missing: vec!["B".into()]
            })
        );
        assert!(eval.is_available(d, &set(&["A", "B", "C"])));
    }

    #[test]
    fn test_gate_short_circuits_before_prerequisites() {
        let doc = CurriculumDocument::new()
            .subject(1, "A", &[])
            .subject(4, "Emprendimiento", &["Z"]);
        let curriculum = Curriculum::new(doc, &EngineConfig::default()).unwrap();
        let eval = Evaluator::new(&curriculum);
        let e = curriculum.find("Emprendimiento").unwrap();
        assert!(matches!(
            eval.check(e, &set(&[])).blocker(),
            Some(Blocker::CohortIncomplete { .. })
        ));
        assert!(matches!(
            eval.check(e, &set(&["A"])).blocker(),
            Some(Blocker::MissingPrerequisites { .. })
        ));
    }

    #[test]
    fn test_tolerant_matching_applies_to_prerequisites() {
        let doc = CurriculumDocument::new()
            .subject(1, "Programación Avanzada", &[])
            .subject(2, "Estructura de Datos", &["Programacion avanzada."]);
        let config = EngineConfig {
            matching: MatchPolicy::Tolerant,
            ..EngineConfig::default()
        };
        let curriculum = Curriculum::new(doc, &config).unwrap();
        let eval = Evaluator::new(&curriculum);
        let ed = curriculum.find("Estructura de Datos").unwrap();
        assert!(eval.is_available(ed, &set(&["Programación Avanzada"])));
    }

    #[test]
    fn test_check_name_covers_duplicate_entries() {
        let doc = CurriculumDocument::new()
            .subject(1, "A", &[])
            .subject(1, "G", &[])
            .subject(2, "G", &["A"]);
        let curriculum = Curriculum::new(doc, &EngineConfig::default()).unwrap();
        let eval = Evaluator::new(&curriculum);
        assert_eq!(eval.is_name_available("G", &set(&[])), Some(false));
        assert!(!eval.check_name("G", &set(&[])).unwrap().is_available());
        assert_eq!(eval.is_name_available("G", &set(&["A"])), Some(true));
        assert_eq!(eval.is_name_available("missing", &set(&[])), None);
        assert_eq!(eval.check_name("missing", &set(&[])), None);
    }

    #[test]
    fn test_cycle_is_never_available() {
        let doc = CurriculumDocument::new()
            .subject(1, "X", &["Y"])
            .subject(1, "Y", &["X"]);
        let curriculum = Curriculum::new(doc, &EngineConfig::default()).unwrap();
        let eval = Evaluator::new(&curriculum);
        assert_eq!(eval.is_name_available("X", &set(&[])), Some(false));
        assert_eq!(eval.is_name_available("Y", &set(&[])), Some(false));
    }
}
