//! Learner session and completion set manager
//!
//! A [`CurriculumSession`] owns one learner's completion set over a shared,
//! read-only [`Curriculum`]. Granting checks eligibility first; revoking is
//! always allowed and runs the cascade so that every completed subject stays
//! eligible once the call returns.
//!
//! ```
//! use prereq::{Curriculum, CurriculumDocument, CurriculumSession, EngineConfig, MarkOutcome};
//! use std::sync::Arc;
//!
//! let doc = CurriculumDocument::new()
//!     .subject(1, "A", &[])
//!     .subject(2, "B", &["A"]);
//! let curriculum = Arc::new(Curriculum::new(doc, &EngineConfig::default()).unwrap());
//! let mut session = CurriculumSession::new(curriculum);
//!
//! assert!(matches!(session.mark_completed("B"), MarkOutcome::Locked(_)));
//! assert_eq!(session.mark_completed("A"), MarkOutcome::Marked);
//! assert_eq!(session.mark_completed("B"), MarkOutcome::Marked);
//! session.mark_incomplete("A");
//! assert!(session.completed().is_empty());
//! ```

use crate::cascade::{Retraction, Retractor};
use crate::completion::CompletionSet;
use crate::curriculum::Curriculum;
use crate::eligibility::{Availability, Blocker, Evaluator};
use crate::normalize::normalize;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Result of [`CurriculumSession::mark_completed`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    Marked,
    AlreadyCompleted,
    /// Rejected; the set is unchanged
    Locked(Blocker),
    NotFound,
}

impl MarkOutcome {
    /// Is the subject completed after the call?
    pub fn is_completed(&self) -> bool {
        matches!(self, MarkOutcome::Marked | MarkOutcome::AlreadyCompleted)
    }
}

/// Result of [`CurriculumSession::mark_incomplete`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmarkOutcome {
    Unmarked(Retraction),
    NotCompleted,
    NotFound,
}

/// Result of [`CurriculumSession::toggle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Completed,
    Uncompleted(Retraction),
    Locked(Blocker),
    NotFound,
}

/// Result of the per-semester bulk operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    Selected(Vec<String>),
    Deselected {
        names: Vec<String>,
        retraction: Retraction,
    },
    UnknownSemester(u32),
}

/// Display state of one subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectStatus {
    Completed,
    Available,
    Locked,
}

impl std::fmt::Display for SubjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubjectStatus::Completed => write!(f, "completed"),
            SubjectStatus::Available => write!(f, "available"),
            SubjectStatus::Locked => write!(f, "locked"),
        }
    }
}

/// Status of one subject entry, for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectState {
    pub name: String,
    pub semester: u32,
    pub status: SubjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocker: Option<Blocker>,
}

/// Completion progress over the whole plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
}

impl Progress {
    pub fn rounded_percentage(&self) -> u32 {
        self.percentage.round() as u32
    }
}

/// One learner's completion state over a curriculum
#[derive(Debug, Clone)]
pub struct CurriculumSession {
    curriculum: Arc<Curriculum>,
    completed: CompletionSet,
}

impl CurriculumSession {
    pub fn new(curriculum: Arc<Curriculum>) -> Self {
        Self {
            curriculum,
            completed: CompletionSet::new(),
        }
    }

    pub fn curriculum(&self) -> &Arc<Curriculum> {
        &self.curriculum
    }

    pub fn completed(&self) -> &CompletionSet {
        &self.completed
    }

    /// Mark `name` completed if it is available.
    ///
    /// Never marks anything else.
    pub fn mark_completed(&mut self, name: &str) -> MarkOutcome {
        let curriculum = &*self.curriculum;
        let Some(subject) = curriculum.find(name) else {
            tracing::debug!(subject = name, "mark ignored: unknown subject");
            return MarkOutcome::NotFound;
        };
        if self.completed.contains(name) {
            return MarkOutcome::AlreadyCompleted;
        }

        match Evaluator::new(curriculum).check_name(name, &self.completed) {
            Some(Availability::Available) => {
                self.completed.insert(&subject.name);
                tracing::debug!(subject = %subject.name, "marked completed");
                MarkOutcome::Marked
            }
            Some(Availability::Locked { blocker }) => {
                tracing::debug!(subject = %subject.name, %blocker, "mark rejected");
                MarkOutcome::Locked(blocker)
            }
            None => MarkOutcome::NotFound,
        }
    }

    /// Unmark `name` and retract everything that depended on it
    pub fn mark_incomplete(&mut self, name: &str) -> UnmarkOutcome {
        if self.curriculum.find(name).is_none() {
            tracing::debug!(subject = name, "unmark ignored: unknown subject");
            return UnmarkOutcome::NotFound;
        }
        let Some(stored) = self.completed.remove(name) else {
            return UnmarkOutcome::NotCompleted;
        };

        tracing::debug!(subject = %stored, "marked incomplete");
        let retraction = Retractor::new(&self.curriculum).retract([stored], &mut self.completed);
        UnmarkOutcome::Unmarked(retraction)
    }

    /// Flip the completion state of `name`
    pub fn toggle(&mut self, name: &str) -> ToggleOutcome {
        if self.completed.contains(name) {
            match self.mark_incomplete(name) {
                UnmarkOutcome::Unmarked(retraction) => ToggleOutcome::Uncompleted(retraction),
                UnmarkOutcome::NotCompleted | UnmarkOutcome::NotFound => ToggleOutcome::NotFound,
            }
        } else {
            match self.mark_completed(name) {
                MarkOutcome::Marked | MarkOutcome::AlreadyCompleted => ToggleOutcome::Completed,
                MarkOutcome::Locked(blocker) => ToggleOutcome::Locked(blocker),
                MarkOutcome::NotFound => ToggleOutcome::NotFound,
            }
        }
    }

    /// Mark every subject of `semester` that is available right now.
    ///
    /// Availability is judged against the set as it was before the batch, so
    /// subjects unlocked by other members of the batch stay unmarked.
    pub fn select_all_available(&mut self, semester: u32) -> BulkOutcome {
        let curriculum = &*self.curriculum;
        let Some(subjects) = curriculum.semester(semester) else {
            return BulkOutcome::UnknownSemester(semester);
        };

        let eval = Evaluator::new(curriculum);
        let mut seen = BTreeSet::new();
        let batch: Vec<String> = subjects
            .filter(|s| !self.completed.contains(&s.name))
            .filter(|s| seen.insert(normalize(&s.name)))
            .filter(|s| eval.is_name_available(&s.name, &self.completed) == Some(true))
            .map(|s| s.name.clone())
            .collect();

        for name in &batch {
            self.completed.insert(name);
        }
        tracing::debug!(semester, marked = batch.len(), "semester selected");
        BulkOutcome::Selected(batch)
    }

    /// Unmark every completed subject of `semester`, cascading once for all of them
    pub fn deselect_all(&mut self, semester: u32) -> BulkOutcome {
        let curriculum = &*self.curriculum;
        let Some(subjects) = curriculum.semester(semester) else {
            return BulkOutcome::UnknownSemester(semester);
        };

        let names: Vec<String> = subjects
            .filter_map(|s| self.completed.remove(&s.name))
            .collect();
        tracing::debug!(semester, unmarked = names.len(), "semester deselected");
        let retraction = Retractor::new(curriculum).retract(&names, &mut self.completed);
        BulkOutcome::Deselected { names, retraction }
    }

    /// Deselect the semester when all its available subjects are completed,
    /// select its available subjects otherwise
    pub fn toggle_semester(&mut self, semester: u32) -> BulkOutcome {
        let Some(subjects) = self.curriculum.semester(semester) else {
            return BulkOutcome::UnknownSemester(semester);
        };

        let eval = Evaluator::new(&self.curriculum);
        let available: Vec<&str> = subjects
            .filter(|s| eval.is_name_available(&s.name, &self.completed) == Some(true))
            .map(|s| s.name.as_str())
            .collect();
        let all_done = !available.is_empty() && available.iter().all(|n| self.completed.contains(n));

        if all_done {
            self.deselect_all(semester)
        } else {
            self.select_all_available(semester)
        }
    }

    /// `None` if no subject is called `name`
    pub fn is_available(&self, name: &str) -> Option<bool> {
        Evaluator::new(&self.curriculum).is_name_available(name, &self.completed)
    }

    pub fn check(&self, name: &str) -> Option<Availability> {
        Evaluator::new(&self.curriculum).check_name(name, &self.completed)
    }

    pub fn status(&self, name: &str) -> Option<SubjectStatus> {
        if self.curriculum.find(name).is_none() {
            return None;
        }
        if self.completed.contains(name) {
            return Some(SubjectStatus::Completed);
        }
        match self.is_available(name) {
            Some(true) => Some(SubjectStatus::Available),
            _ => Some(SubjectStatus::Locked),
        }
    }

    /// Status of every entry in `semester`, in authored order.
    ///
    /// A name listed in several semesters is judged by all of its entries,
    /// like [`mark_completed`](Self::mark_completed).
    pub fn semester_states(&self, semester: u32) -> Option<Vec<SubjectState>> {
        let eval = Evaluator::new(&self.curriculum);
        let subjects = self.curriculum.semester(semester)?;
        Some(
            subjects
                .map(|s| {
                    let (status, blocker) = if self.completed.contains(&s.name) {
                        (SubjectStatus::Completed, None)
                    } else {
                        match eval.check_name(&s.name, &self.completed) {
                            Some(Availability::Available) => (SubjectStatus::Available, None),
                            Some(Availability::Locked { blocker }) => {
                                (SubjectStatus::Locked, Some(blocker))
                            }
                            None => (SubjectStatus::Locked, None),
                        }
                    };
                    SubjectState {
                        name: s.name.clone(),
                        semester: s.semester,
                        status,
                        blocker,
                    }
                })
                .collect(),
        )
    }

    pub fn progress(&self) -> Progress {
        let total = self.curriculum.len();
        let completed = self.completed.len();
        let percentage = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        Progress {
            completed,
            total,
            percentage,
        }
    }

    /// Completed subjects that are not currently eligible.
    ///
    /// Empty after every public operation returns.
    pub fn ineligible_completed(&self) -> Vec<String> {
        let eval = Evaluator::new(&self.curriculum);
        self.completed
            .iter()
            .filter(|name| eval.is_name_available(name, &self.completed) != Some(true))
            .map(str::to_string)
            .collect()
    }

    /// Drop completed subjects that are no longer eligible
    pub fn repair(&mut self) -> Retraction {
        Retractor::new(&self.curriculum).retract(Vec::<String>::new(), &mut self.completed)
    }

    pub fn reset(&mut self) {
        self.completed.clear();
    }
}

/// A session shared between threads.
///
/// Every closure passed to [`transaction`](Self::transaction) runs with the
/// session locked, so a mark and its cascade are never interleaved with
/// another caller's.
#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<CurriculumSession>>,
}

impl SharedSession {
    pub fn new(session: CurriculumSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn transaction<R>(&self, f: impl FnOnce(&mut CurriculumSession) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("session lock poisoned; repairing completion set");
            let mut guard = PoisonError::into_inner(poisoned);
            guard.repair();
            guard
        });
        f(&mut guard)
    }

    pub fn toggle(&self, name: &str) -> ToggleOutcome {
        self.transaction(|s| s.toggle(name))
    }

    pub fn snapshot(&self) -> CompletionSet {
        self.transaction(|s| s.completed().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::curriculum::CurriculumDocument;
    use pretty_assertions::assert_eq;

    fn session() -> CurriculumSession {
        let doc = CurriculumDocument::new()
            .subject(1, "A", &[])
            .subject(1, "A2", &[])
            .subject(2, "B", &["A"])
            .subject(2, "B2", &[])
            .subject(3, "C", &["B"])
            .subject(3, "C2", &["B2"]);
        let curriculum = Curriculum::new(doc, &EngineConfig::default()).unwrap();
        CurriculumSession::new(Arc::new(curriculum))
    }

    #[test]
    fn test_mark_requires_availability() {
        let mut s = session();
        assert!(matches!(s.mark_completed("B"), MarkOutcome::Locked(_)));
        assert!(s.completed().is_empty());
        assert_eq!(s.mark_completed("a"), MarkOutcome::Marked);
        assert_eq!(s.mark_completed("B"), MarkOutcome::Marked);
        assert_eq!(s.completed().names(), vec!["A", "B"]);
    }

    #[test]
    fn test_mark_stores_catalog_spelling() {
        let mut s = session();
        s.mark_completed("  a2 ");
        assert_eq!(s.completed().names(), vec!["A2"]);
    }

    #[test]
    fn test_idempotence() {
        let mut s = session();
        s.mark_completed("A");
        let before = s.completed().clone();
        assert_eq!(s.mark_completed("A"), MarkOutcome::AlreadyCompleted);
        assert_eq!(s.completed(), &before);
        assert_eq!(s.mark_incomplete("B"), UnmarkOutcome::NotCompleted);
        assert_eq!(s.completed(), &before);
    }

    #[test]
    fn test_unknown_subject() {
        let mut s = session();
        assert_eq!(s.mark_completed("Z"), MarkOutcome::NotFound);
        assert_eq!(s.mark_incomplete("Z"), UnmarkOutcome::NotFound);
        assert_eq!(s.toggle("Z"), ToggleOutcome::NotFound);
        assert_eq!(s.status("Z"), None);
        assert_eq!(s.is_available("Z"), None);
        assert!(s.completed().is_empty());
    }

    #[test]
    fn test_unmark_cascades() {
        let mut s = session();
        for name in ["A", "B", "C", "B2"] {
            assert_eq!(s.mark_completed(name), MarkOutcome::Marked);
        }
        let UnmarkOutcome::Unmarked(retraction) = s.mark_incomplete("A") else {
            panic!("expected cascade");
        };
        assert_eq!(retraction.names(), vec!["B", "C"]);
        assert_eq!(s.completed().names(), vec!["B2"]);
    }

    #[test]
    fn test_toggle() {
        let mut s = session();
        assert_eq!(s.toggle("A"), ToggleOutcome::Completed);
        assert!(matches!(s.toggle("C"), ToggleOutcome::Locked(_)));
        assert!(matches!(s.toggle("A"), ToggleOutcome::Uncompleted(_)));
        assert!(s.completed().is_empty());
    }

    #[test]
    fn test_select_uses_pre_batch_set() {
        let mut s = session();
        s.mark_completed("A");
        assert_eq!(
            s.select_all_available(2),
            BulkOutcome::Selected(vec!["B".into(), "B2".into()])
        );

        let doc = CurriculumDocument::new()
            .subject(1, "X", &[])
            .subject(1, "Y", &["X"]);
        let curriculum = Curriculum::new(doc, &EngineConfig::default()).unwrap();
        let mut chained = CurriculumSession::new(Arc::new(curriculum));
        assert_eq!(
            chained.select_all_available(1),
            BulkOutcome::Selected(vec!["X".into()])
        );
        assert_eq!(
            chained.select_all_available(1),
            BulkOutcome::Selected(vec!["Y".into()])
        );
    }

    #[test]
    fn test_deselect_all_cascades_once() {
        let mut s = session();
        for name in ["A", "A2", "B", "B2", "C", "C2"] {
            s.mark_completed(name);
        }
        let BulkOutcome::Deselected { names, retraction } = s.deselect_all(2) else {
            panic!("expected deselection");
        };
        assert_eq!(names, vec!["B", "B2"]);
        let mut removed = retraction.names();
        removed.sort();
        assert_eq!(removed, vec!["C", "C2"]);
        assert_eq!(s.completed().names(), vec!["A", "A2"]);
    }

    #[test]
    fn test_toggle_semester() {
        let mut s = session();
        assert_eq!(
            s.toggle_semester(1),
            BulkOutcome::Selected(vec!["A".into(), "A2".into()])
        );
        assert!(matches!(s.toggle_semester(1), BulkOutcome::Deselected { .. }));
        assert!(s.completed().is_empty());
        assert_eq!(s.toggle_semester(7), BulkOutcome::UnknownSemester(7));
    }

    #[test]
    fn test_status_and_progress() {
        let mut s = session();
        s.mark_completed("A");
        assert_eq!(s.status("A"), Some(SubjectStatus::Completed));
        assert_eq!(s.status("B"), Some(SubjectStatus::Available));
        assert_eq!(s.status("C"), Some(SubjectStatus::Locked));

        let states = s.semester_states(3).unwrap();
        assert_eq!(states[0].status, SubjectStatus::Locked);
        assert!(states[0].blocker.is_some());

        let progress = s.progress();
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.total, 6);
        assert_eq!(progress.rounded_percentage(), 17);
    }

    #[test]
    fn test_semester_states_judge_duplicate_names_as_one() {
        let doc = CurriculumDocument::new()
            .subject(1, "A", &[])
            .subject(1, "G", &[])
            .subject(2, "G", &["A"]);
        let curriculum = Curriculum::new(doc, &EngineConfig::default()).unwrap();
        let mut s = CurriculumSession::new(Arc::new(curriculum));

        let states = s.semester_states(1).unwrap();
        let g = states.iter().find(|st| st.name == "G").unwrap();
        assert_eq!(g.status, SubjectStatus::Locked);
        assert_eq!(
            g.blocker,
            Some(Blocker::MissingPrerequisites {
                missing: vec!["A".into()]
            })
        );
        assert_eq!(s.status("G"), Some(SubjectStatus::Locked));
        assert_eq!(s.select_all_available(1), BulkOutcome::Selected(vec!["A".into()]));

        let states = s.semester_states(1).unwrap();
        assert!(states.iter().all(|st| st.status != SubjectStatus::Locked));
        assert_eq!(s.mark_completed("G"), MarkOutcome::Marked);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut s = session();
        s.toggle_semester(1);
        s.mark_completed("B");
        s.reset();
        assert!(s.completed().is_empty());
        assert_eq!(s.status("B"), Some(SubjectStatus::Locked));
        assert_eq!(s.progress().completed, 0);
    }

    #[test]
    fn test_invariant_after_operations() {
        let mut s = session();
        s.toggle_semester(1);
        s.toggle_semester(2);
        s.toggle_semester(3);
        s.mark_incomplete("B2");
        assert!(s.ineligible_completed().is_empty());
        assert_eq!(s.completed().names(), vec!["A", "A2", "B", "C"]);
    }

    #[test]
    fn test_shared_session_transactions() {
        let shared = SharedSession::new(session());
        let handles: Vec<_> = ["A", "A2", "B2"]
            .into_iter()
            .map(|name| {
                let shared = shared.clone();
                std::thread::spawn(move || shared.toggle(name))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), ToggleOutcome::Completed);
        }
        assert_eq!(shared.snapshot().len(), 3);
        shared.transaction(|s| assert!(s.ineligible_completed().is_empty()));
    }
}
