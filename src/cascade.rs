//! Cascade retraction
//!
//! Unmarking a subject can make other completed subjects ineligible, which in
//! turn can invalidate more. [`Retractor::retract`] removes them in rounds
//! until a round removes nothing.
//!
//! Each round applies four rules:
//!
//! | Rule | Checks |
//! |------|--------|
//! | A `cohort_gate` | gated subjects once the cohort is incomplete |
//! | B `prerequisites` | dependents of removed subjects, via the reverse index |
//! | C `previous_semesters` | subjects carrying the meta-prerequisite |
//! | D `holistic` | full eligibility of every completed subject |
//!
//! Eligibility only shrinks as the set shrinks, so the result is the largest
//! subset in which every member is eligible, whatever order the rules run in.

use crate::completion::CompletionSet;
use crate::curriculum::{Curriculum, Subject};
use crate::eligibility::Evaluator;
use crate::normalize::normalize;
use serde::Serialize;
use std::collections::BTreeSet;

/// One retraction rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeRule {
    CohortGate,
    Prerequisites,
    PreviousSemesters,
    Holistic,
}

impl CascadeRule {
    /// Default application order within a round
    pub const ALL: [CascadeRule; 4] = [
        CascadeRule::CohortGate,
        CascadeRule::Prerequisites,
        CascadeRule::PreviousSemesters,
        CascadeRule::Holistic,
    ];
}

impl std::fmt::Display for CascadeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CascadeRule::CohortGate => "cohort gate",
            CascadeRule::Prerequisites => "prerequisites",
            CascadeRule::PreviousSemesters => "previous semesters",
            CascadeRule::Holistic => "eligibility",
        };
        f.write_str(label)
    }
}

/// A subject removed by the cascade
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Removal {
    pub name: String,
    pub rule: CascadeRule,
    pub round: usize,
}

/// What a cascade removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Retraction {
    pub removed: Vec<Removal>,
    /// Rounds executed, including the final one that removed nothing
    pub rounds: usize,
}

impl Retraction {
    pub fn names(&self) -> Vec<&str> {
        self.removed.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

/// Runs cascade retraction against one curriculum
#[derive(Debug, Clone)]
pub struct Retractor<'a> {
    curriculum: &'a Curriculum,
    evaluator: Evaluator<'a>,
    order: [CascadeRule; 4],
}

impl<'a> Retractor<'a> {
    pub fn new(curriculum: &'a Curriculum) -> Self {
        Self {
            curriculum,
            evaluator: Evaluator::new(curriculum),
            order: CascadeRule::ALL,
        }
    }

    /// Apply the rules in `order` within each round
    pub fn with_order(mut self, order: [CascadeRule; 4]) -> Self {
        self.order = order;
        self
    }

    /// Remove every completed subject made ineligible by the removal of `seed`.
    ///
    /// `seed` names were already taken out of `completed` by the caller.
    /// Never adds to `completed`.
    pub fn retract<I, S>(&self, seed: I, completed: &mut CompletionSet) -> Retraction
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed: Vec<String> = seed.into_iter().map(|s| s.as_ref().to_string()).collect();
        let mut retraction = Retraction::default();
        let limit = completed.len() + 1;

        loop {
            retraction.rounds += 1;
            let round = retraction.rounds;
            let mut changed = false;

            for rule in self.order {
                for name in self.victims(rule, &removed, completed) {
                    if let Some(stored) = completed.remove(&name) {
                        tracing::debug!(subject = %stored, %rule, round, "retracted");
                        removed.push(stored.clone());
                        retraction.removed.push(Removal {
                            name: stored,
                            rule,
                            round,
                        });
                        changed = true;
                    }
                }
            }

            if !changed {
                break;
            }
            debug_assert!(round <= limit, "cascade exceeded {limit} rounds");
        }

        tracing::debug!(
            removed = retraction.removed.len(),
            rounds = retraction.rounds,
            "cascade settled"
        );
        retraction
    }

    /// Completed subjects that `rule` would remove from `completed` as it is now
    fn victims(&self, rule: CascadeRule, removed: &[String], completed: &CompletionSet) -> Vec<String> {
        let eval = &self.evaluator;
        let subjects = self.curriculum.subjects();
        let candidates: Vec<&Subject> = match rule {
            CascadeRule::CohortGate => {
                if eval.cohort_complete(completed) {
                    Vec::new()
                } else {
                    subjects
                        .iter()
                        .filter(|s| s.is_cohort_gated() && completed.contains(&s.name))
                        .collect()
                }
            }
            CascadeRule::Prerequisites => removed
                .iter()
                .flat_map(|name| self.curriculum.dependents_of(name))
                .filter(|s| completed.contains(&s.name))
                .filter(|s| !eval.named_prerequisites_met(s, completed))
                .collect(),
            CascadeRule::PreviousSemesters => subjects
                .iter()
                .filter(|s| s.requires_all_previous() && completed.contains(&s.name))
                .filter(|s| !eval.previous_complete(s.semester, completed))
                .collect(),
            CascadeRule::Holistic => subjects
                .iter()
                .filter(|s| completed.contains(&s.name))
                .filter(|s| !eval.is_available(s, completed))
                .collect(),
        };

        let mut seen = BTreeSet::new();
        candidates
            .into_iter()
            .filter(|s| seen.insert(normalize(&s.name)))
            .map(|s| s.name.clone())
            .collect()
    }
}
