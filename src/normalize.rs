//! Subject-name normalization and matching
//!
//! Prerequisite descriptors are hand-authored, so they drift from the
//! canonical subject names in accents, case and spacing. Every comparison
//! between a descriptor and a subject name goes through a single
//! [`NameMatcher`] whose [`MatchPolicy`] is fixed per curriculum.
//!
//! ```
//! use prereq::normalize::{names_equal, normalize};
//! assert_eq!(normalize("  Cálculo   I "), "calculo i");
//! assert!(names_equal("ÁLGEBRA I", "algebra  i"));
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold diacritics, collapse whitespace runs, trim and lowercase.
pub fn normalize(s: &str) -> String {
    collapse_whitespace(&fold_diacritics(s)).to_lowercase()
}

/// Decompose and drop combining marks: "Cálculo" becomes "Calculo".
pub fn fold_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// [`normalize`], then drop everything except ASCII letters, digits and spaces.
///
/// Used as the key for tolerant matching so punctuation drift
/// ("Diseño, Ingeniería" vs "Diseno Ingenieria") still matches.
pub fn normalize_strong(s: &str) -> String {
    let kept: String = normalize(s)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    collapse_whitespace(&kept)
}

/// `true` iff both names normalize to the same string.
pub fn names_equal(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// How a prerequisite descriptor is matched against a subject name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Normalized names must be equal
    #[default]
    Exact,
    /// Normalized names are equal, or one contains the other
    Tolerant,
}

/// Matches prerequisite descriptors against subject names under one policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NameMatcher {
    policy: MatchPolicy,
}

impl NameMatcher {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Does `descriptor` refer to the subject called `name`?
    pub fn matches(&self, descriptor: &str, name: &str) -> bool {
        match self.policy {
            MatchPolicy::Exact => names_equal(descriptor, name),
            MatchPolicy::Tolerant => {
                let a = normalize_strong(descriptor);
                let b = normalize_strong(name);
                if a == b {
                    return true;
                }
                // An empty key would be contained in every name.
                !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a))
            }
        }
    }
}
