// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # prereq - curriculum progress tracking
//!
//! Models a study plan as subjects grouped by semester, lets a learner mark
//! subjects completed, and derives which other subjects become available.
//!
//! ## Core Concept
//!
//! A subject is **available** when every rule below passes:
//!
//! - **Cohort gate**: gated categories (professional electives,
//!   entrepreneurship) need every subject of semesters `1..=3` completed
//! - **Meta-prerequisite**: "all previous semesters completed" needs every
//!   earlier subject completed
//! - **Named prerequisites**: each listed subject must be completed
//!
//! Marking requires availability. Unmarking is always allowed and
//! **cascades**: anything that stops being available is removed too, until
//! the set is stable. After every operation, every completed subject is
//! available.
//!
//! ## Quick Start
//!
//! ```rust
//! use prereq::{Curriculum, CurriculumSession, SubjectStatus};
//! use std::sync::Arc;
//!
//! let curriculum = Curriculum::from_yaml(r#"
//! semesters:
//!   1:
//!     subjects:
//!       - name: A
//!   2:
//!     subjects:
//!       - name: B
//!         prerequisites: [A]
//!   3:
//!     subjects:
//!       - name: C
//!         prerequisites: [B]
//! "#)?;
//!
//! let mut session = CurriculumSession::new(Arc::new(curriculum));
//! session.mark_completed("A");
//! session.mark_completed("B");
//! assert_eq!(session.status("C"), Some(SubjectStatus::Available));
//!
//! session.mark_incomplete("A");
//! assert!(session.completed().is_empty());
//! # Ok::<(), prereq::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                                                              │
//! │  CurriculumDocument (YAML/JSON) + EngineConfig               │
//! │       │                                                      │
//! │       └──► Curriculum::new ──► Curriculum (read-only)        │
//! │                                   │                          │
//! │  CurriculumSession ◄──────────────┘                          │
//! │       │                                                      │
//! │       ├──► mark_completed ──► Evaluator::check               │
//! │       │                                                      │
//! │       ├──► mark_incomplete ──► Retractor::retract            │
//! │       │                                                      │
//! │       └──► Report::build ──► text / JSON                     │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```

// Catalog
pub mod config;
pub mod curriculum;
pub mod error;
pub mod normalize;
pub mod validate;

// Engine
pub mod cascade;
pub mod completion;
pub mod eligibility;
pub mod session;

// Export
pub mod report;

// Re-exports
pub use cascade::{CascadeRule, Removal, Retraction, Retractor};
pub use completion::CompletionSet;
pub use config::{CohortGateConfig, EngineConfig, MetaPrerequisiteConfig, Patch};
pub use curriculum::{
    Category, Curriculum, CurriculumDocument, Prerequisite, SemesterRecord, Subject, SubjectId,
    SubjectRecord,
};
pub use eligibility::{Availability, Blocker, Evaluator};
pub use error::{Error, Result};
pub use normalize::{fold_diacritics, names_equal, normalize, MatchPolicy, NameMatcher};
pub use report::{Report, ReportEntry, SemesterSummary};
pub use session::{
    BulkOutcome, CurriculumSession, MarkOutcome, Progress, SharedSession, SubjectState,
    SubjectStatus, ToggleOutcome, UnmarkOutcome,
};
pub use validate::{validate, Issue, Severity, ValidationReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
